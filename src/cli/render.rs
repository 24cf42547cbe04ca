use tuition_auth::auth::AuthUser;
use tuition_core::model::{
    AttendanceRecord, AttendanceStatus, Batch, EntityRef, Note, Resource, Standard, Student,
    Subject, Video,
};
use tuition_core::validation::ValidationErrors;

/// One line of a listing.
pub trait Row {
    fn row(&self) -> String;
}

fn label(entry: &Option<EntityRef>) -> &str {
    entry.as_ref().map_or("-", EntityRef::label)
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("-")
}

impl Row for Batch {
    fn row(&self) -> String {
        let capacity = self
            .capacity
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        format!(
            "{}  {}  {}  {}  {}/{}",
            self.id,
            self.name,
            label(&self.subject),
            self.status,
            self.enrolled_count(),
            capacity
        )
    }
}

impl Row for Student {
    fn row(&self) -> String {
        format!(
            "{}  {}  {}  {}  {}",
            self.id,
            self.name,
            or_dash(&self.email),
            or_dash(&self.phone),
            label(&self.standard)
        )
    }
}

impl Row for Standard {
    fn row(&self) -> String {
        format!("{}  {}  {} subjects", self.id, self.name, self.subjects.len())
    }
}

impl Row for Subject {
    fn row(&self) -> String {
        format!(
            "{}  {}  {}  {}",
            self.id,
            self.name,
            or_dash(&self.code),
            label(&self.standard)
        )
    }
}

impl Row for Note {
    fn row(&self) -> String {
        let size = self
            .file_size
            .map_or_else(|| "-".to_string(), |size| format!("{} KB", size.div_ceil(1024)));
        format!(
            "{}  {}  {}  {}  {}",
            self.id,
            self.title,
            label(&self.subject),
            or_dash(&self.file_name),
            size
        )
    }
}

impl Row for Video {
    fn row(&self) -> String {
        format!(
            "{}  {}  {}  {}",
            self.id,
            self.title,
            self.url,
            if self.is_free { "free" } else { "paid" }
        )
    }
}

impl Row for AttendanceRecord {
    fn row(&self) -> String {
        format!(
            "{}  {}  present {}, absent {}, late {}",
            self.date,
            self.batch.label(),
            self.count(AttendanceStatus::Present),
            self.count(AttendanceStatus::Absent),
            self.count(AttendanceStatus::Late)
        )
    }
}

pub fn table<R: Resource + Row>(items: &[&R]) -> String {
    if items.is_empty() {
        return format!("No {} found", R::PLURAL);
    }
    items
        .iter()
        .map(|item| item.row())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn user(user: &Option<AuthUser>) -> String {
    match user {
        Some(user) if user.email.is_empty() => format!("{} ({})", user.name, user.role),
        Some(user) => format!("{} <{}> ({})", user.name, user.email, user.role),
        None => "Not signed in".to_string(),
    }
}

/// One field per line, the way a form would show them.
pub fn field_errors(errors: &ValidationErrors) -> String {
    errors
        .fields()
        .iter()
        .map(|error| format!("  {}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("\n")
}
