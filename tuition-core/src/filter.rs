//! List filters. Every filter value that is set narrows the list further,
//! an unset or blank one is ignored.

use derive_setters::Setters;

use crate::model::{Batch, BatchStatus, EntityId, EntityRef, Note, Student, Video};

type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// Predicates applied in order with AND semantics.
pub struct FilterPipeline<'a, T> {
    predicates: Vec<Predicate<'a, T>>,
}

impl<T> Default for FilterPipeline<'_, T> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<'a, T> FilterPipeline<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `predicate` if there is a `value` to compare with.
    pub fn when<V, F>(mut self, value: Option<V>, predicate: F) -> Self
    where
        V: 'a,
        F: Fn(&T, &V) -> bool + 'a,
    {
        if let Some(value) = value {
            self.predicates
                .push(Box::new(move |item: &T| predicate(item, &value)));
        }
        self
    }

    pub fn matches(&self, item: &T) -> bool {
        self.predicates.iter().all(|predicate| predicate(item))
    }

    pub fn apply<'b>(&self, items: &'b [T]) -> Vec<&'b T> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

/// Lowercased, trimmed search text, `None` when blank.
pub fn needle(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn id(value: &Option<EntityId>) -> Option<&EntityId> {
    value.as_ref().filter(|id| !id.is_empty())
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|haystack| haystack.to_lowercase().contains(needle))
}

fn refers(entry: Option<&EntityRef>, id: &EntityId) -> bool {
    entry.is_some_and(|entry| entry.refers_to(id))
}

#[derive(Clone, Debug, Default, Setters)]
#[setters(into, strip_option)]
pub struct StudentFilter {
    /// Matched against name, email and phone.
    pub search: Option<String>,
    pub standard: Option<EntityId>,
    pub subject: Option<EntityId>,
    pub batch: Option<EntityId>,
}

impl StudentFilter {
    pub fn apply<'b>(&self, students: &'b [Student]) -> Vec<&'b Student> {
        FilterPipeline::new()
            .when(needle(&self.search), |student: &Student, needle: &String| {
                contains(Some(&student.name), needle)
                    || contains(student.email.as_deref(), needle)
                    || contains(student.phone.as_deref(), needle)
            })
            .when(id(&self.standard), |student: &Student, id| {
                refers(student.standard.as_ref(), id)
            })
            .when(id(&self.subject), |student: &Student, id| {
                student.takes_subject(id)
            })
            .when(id(&self.batch), |student: &Student, id| student.in_batch(id))
            .apply(students)
    }
}

#[derive(Clone, Debug, Default, Setters)]
#[setters(into, strip_option)]
pub struct BatchFilter {
    pub name: Option<String>,
    pub standard: Option<EntityId>,
    pub subject: Option<EntityId>,
    pub teacher: Option<EntityId>,
    pub status: Option<BatchStatus>,
}

impl BatchFilter {
    pub fn apply<'b>(&self, batches: &'b [Batch]) -> Vec<&'b Batch> {
        FilterPipeline::new()
            .when(needle(&self.name), |batch: &Batch, needle: &String| {
                contains(Some(&batch.name), needle)
            })
            .when(id(&self.standard), |batch: &Batch, id| {
                refers(batch.standard.as_ref(), id)
            })
            .when(id(&self.subject), |batch: &Batch, id| {
                refers(batch.subject.as_ref(), id)
            })
            .when(id(&self.teacher), |batch: &Batch, id| {
                refers(batch.teacher.as_ref(), id)
            })
            .when(self.status, |batch: &Batch, status| batch.status == *status)
            .apply(batches)
    }
}

#[derive(Clone, Debug, Default, Setters)]
#[setters(into, strip_option)]
pub struct NoteFilter {
    /// Matched against title and description.
    pub search: Option<String>,
    pub standard: Option<EntityId>,
    pub subject: Option<EntityId>,
    pub batch: Option<EntityId>,
}

impl NoteFilter {
    pub fn apply<'b>(&self, notes: &'b [Note]) -> Vec<&'b Note> {
        FilterPipeline::new()
            .when(needle(&self.search), |note: &Note, needle: &String| {
                contains(Some(&note.title), needle)
                    || contains(note.description.as_deref(), needle)
            })
            .when(id(&self.standard), |note: &Note, id| {
                refers(note.standard.as_ref(), id)
            })
            .when(id(&self.subject), |note: &Note, id| {
                refers(note.subject.as_ref(), id)
            })
            .when(id(&self.batch), |note: &Note, id| refers(note.batch.as_ref(), id))
            .apply(notes)
    }
}

#[derive(Clone, Debug, Default, Setters)]
#[setters(into, strip_option)]
pub struct VideoFilter {
    pub search: Option<String>,
    pub standard: Option<EntityId>,
    pub subject: Option<EntityId>,
    pub free: Option<bool>,
}

impl VideoFilter {
    pub fn apply<'b>(&self, videos: &'b [Video]) -> Vec<&'b Video> {
        FilterPipeline::new()
            .when(needle(&self.search), |video: &Video, needle: &String| {
                contains(Some(&video.title), needle)
                    || contains(video.description.as_deref(), needle)
            })
            .when(id(&self.standard), |video: &Video, id| {
                refers(video.standard.as_ref(), id)
            })
            .when(id(&self.subject), |video: &Video, id| {
                refers(video.subject.as_ref(), id)
            })
            .when(self.free, |video: &Video, free| video.is_free == *free)
            .apply(videos)
    }
}
