use std::fmt::{Display, Formatter};

use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    // 10 digit number, optionally prefixed with a country code
    static ref PHONE: Regex = Regex::new(r"^(\+\d{1,3}[\s-]?)?\d{10}$").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every field that failed validation, reported together so a form can
/// show them inline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(value: Vec<FieldError>) -> Self {
        Self(value)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Checked before anything is sent to the API.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Collects field errors for a single draft.
#[derive(Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn fail(&mut self, field: &str, message: &str) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, &format!("{} is required", capitalize(field)));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if !EMAIL.is_match(value) {
                self.fail(field, "Enter a valid email address");
            }
        }
        self
    }

    pub fn phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if !PHONE.is_match(value) {
                self.fail(field, "Enter a valid 10 digit phone number");
            }
        }
        self
    }

    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        let valid = url::Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            self.fail(field, "Enter a valid URL");
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.errors)))
        }
    }
}

/// Parses `HH:MM` (24h).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks_collect_all_errors() {
        let result = Checks::default()
            .required("name", " ")
            .email("email", Some("asha@"))
            .phone("phone", Some("12345"))
            .finish();
        let errors = result.unwrap_err();
        assert_eq!(errors.fields().len(), 3);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        assert!(Checks::default()
            .required("name", "Asha")
            .email("email", None)
            .phone("phone", Some(""))
            .finish()
            .is_ok());
    }

    #[test]
    fn test_phone_formats() {
        for phone in ["9876543210", "+91 9876543210", "+91-9876543210"] {
            assert!(PHONE.is_match(phone), "{}", phone);
        }
        assert!(!PHONE.is_match("98765-43210"));
    }

    #[test]
    fn test_url() {
        assert!(Checks::default()
            .url("url", "https://www.youtube.com/watch?v=abc")
            .finish()
            .is_ok());
        assert!(Checks::default().url("url", "youtube").finish().is_err());
    }

    #[test]
    fn test_parse_time() {
        assert!(parse_time("09:30").is_some());
        assert!(parse_time("25:00").is_none());
    }

    #[test]
    fn test_display() {
        let errors = ValidationErrors::from(vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("capacity", "Capacity must be at least 1"),
        ]);
        assert_eq!(
            errors.to_string(),
            "name: Name is required; capacity: Capacity must be at least 1"
        );
    }
}
