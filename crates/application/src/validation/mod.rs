//! Input validation
//!
//! Request DTOs entering the service layer get validated here before any
//! store or authorization work happens. Declarative rules come from the
//! `validator` derive; everything that needs context (trimmed emptiness,
//! coordinate ranges, URL lists) is layered on through [`Validatable`].

mod issue;

pub use issue::*;

use civicwatch_domain::{CoreError, CoreResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Accumulated validation outcome for one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether validation passed
    pub valid: bool,
    /// Field-level errors, keyed by field name
    pub field_errors: BTreeMap<String, Vec<String>>,
    /// Errors not attributable to a single field
    pub object_errors: Vec<String>,
}

impl ValidationResult {
    /// Create a passing result
    pub fn success() -> Self {
        Self {
            valid: true,
            field_errors: BTreeMap::new(),
            object_errors: Vec::new(),
        }
    }

    /// Create a failed result with a single object-level error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            field_errors: BTreeMap::new(),
            object_errors: vec![message.into()],
        }
    }

    /// Add a field-level error
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Add an object-level error
    pub fn add_object_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.object_errors.push(message.into());
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }

        for (field, errors) in other.field_errors {
            self.field_errors.entry(field).or_default().extend(errors);
        }

        self.object_errors.extend(other.object_errors);
    }

    /// Convert to a [`CoreError`] if invalid. A single field failure keeps
    /// its structured form; anything more collapses into one message list.
    pub fn to_error(&self) -> Option<CoreError> {
        if self.valid {
            return None;
        }

        let field_count: usize = self.field_errors.values().map(Vec::len).sum();
        if field_count == 1 && self.object_errors.is_empty() {
            let (field, errors) = self
                .field_errors
                .iter()
                .next()
                .expect("field_errors is non-empty");
            return Some(CoreError::Validation(ValidationError::FieldValidation {
                field: field.clone(),
                message: errors[0].clone(),
            }));
        }

        let mut messages = Vec::new();
        for (field, errors) in &self.field_errors {
            for error in errors {
                messages.push(format!("{}: {}", field, error));
            }
        }
        messages.extend(self.object_errors.iter().cloned());

        Some(CoreError::Validation(ValidationError::Multiple(messages)))
    }

    /// Ensure validation passed, returning the combined error if not
    pub fn ensure_valid(&self) -> CoreResult<()> {
        match self.to_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Trait for request types that carry their own validation
pub trait Validatable {
    /// Run every rule and collect all failures
    fn validate_all(&self) -> ValidationResult;
}

/// Bridge from `validator` derive output to [`ValidationResult`]
pub trait ValidatorExt {
    fn to_validation_result(&self) -> ValidationResult;
}

impl<T: Validate> ValidatorExt for T {
    fn to_validation_result(&self) -> ValidationResult {
        match self.validate() {
            Ok(_) => ValidationResult::success(),
            Err(errors) => {
                let mut result = ValidationResult::success();

                for (field, field_errors) in errors.field_errors() {
                    for error in field_errors {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string());
                        result.add_field_error(field.to_string(), message);
                    }
                }

                result
            }
        }
    }
}

/// Shared validation rules
pub struct ValidationRules;

impl ValidationRules {
    /// Validate a string length against optional bounds
    pub fn validate_length(
        value: &str,
        field: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> ValidationResult {
        let mut result = ValidationResult::success();

        if let Some(min_len) = min {
            if value.len() < min_len {
                result.add_field_error(field, format!("Must be at least {} characters", min_len));
            }
        }

        if let Some(max_len) = max {
            if value.len() > max_len {
                result.add_field_error(field, format!("Must be {} characters or less", max_len));
            }
        }

        result
    }

    /// Validate a single http(s) URL
    pub fn validate_url(url: &str, field: &str) -> ValidationResult {
        let mut result = ValidationResult::success();

        if url.is_empty() {
            result.add_field_error(field, "URL cannot be empty");
            return result;
        }

        match url::Url::parse(url) {
            Ok(parsed) => {
                if !["http", "https"].contains(&parsed.scheme()) {
                    result.add_field_error(field, "URL must use HTTP or HTTPS scheme");
                }
            }
            Err(_) => {
                result.add_field_error(field, format!("Invalid URL: {}", url));
            }
        }

        result
    }

    /// Validate a list size against optional bounds
    pub fn validate_list_size<T>(
        list: &[T],
        field: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> ValidationResult {
        let mut result = ValidationResult::success();

        if let Some(min_size) = min {
            if list.len() < min_size {
                result.add_field_error(field, format!("Must have at least {} items", min_size));
            }
        }

        if let Some(max_size) = max {
            if list.len() > max_size {
                result.add_field_error(field, format!("Must have {} items or less", max_size));
            }
        }

        result
    }

    /// Validate WGS84 coordinates, reporting each axis separately
    pub fn validate_coordinates(longitude: f64, latitude: f64) -> ValidationResult {
        let mut result = ValidationResult::success();

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            result.add_field_error(
                "longitude",
                format!("Longitude must be between -180 and 180, got {}", longitude),
            );
        }

        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            result.add_field_error(
                "latitude",
                format!("Latitude must be between -90 and 90, got {}", latitude),
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_success() {
        let result = ValidationResult::success();
        assert!(result.valid);
        assert!(result.field_errors.is_empty());
        assert!(result.object_errors.is_empty());
        assert!(result.to_error().is_none());
        assert!(result.ensure_valid().is_ok());
    }

    #[test]
    fn test_validation_result_field_error() {
        let mut result = ValidationResult::success();
        result.add_field_error("title", "Required");
        assert!(!result.valid);
        assert!(result.field_errors.contains_key("title"));
    }

    #[test]
    fn test_single_field_failure_keeps_structured_form() {
        let mut result = ValidationResult::success();
        result.add_field_error("title", "Required");

        match result.to_error() {
            Some(CoreError::Validation(ValidationError::FieldValidation { field, message })) => {
                assert_eq!(field, "title");
                assert_eq!(message, "Required");
            }
            other => panic!("expected FieldValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_failures_collapse_to_message_list() {
        let mut result = ValidationResult::success();
        result.add_field_error("title", "Required");
        result.add_object_error("something else broke");

        match result.to_error() {
            Some(CoreError::Validation(ValidationError::Multiple(messages))) => {
                assert_eq!(messages.len(), 2);
                assert!(messages[0].contains("title"));
            }
            other => panic!("expected Multiple, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_result_merge() {
        let mut result1 = ValidationResult::success();
        result1.add_field_error("title", "Error 1");

        let mut result2 = ValidationResult::success();
        result2.add_field_error("description", "Error 2");

        result1.merge(result2);
        assert!(!result1.valid);
        assert!(result1.field_errors.contains_key("title"));
        assert!(result1.field_errors.contains_key("description"));
    }

    #[test]
    fn test_validate_length() {
        assert!(ValidationRules::validate_length("hello", "field", Some(1), Some(10)).valid);
        assert!(!ValidationRules::validate_length("", "field", Some(1), None).valid);
        assert!(!ValidationRules::validate_length("too long", "field", None, Some(5)).valid);
    }

    #[test]
    fn test_validate_url() {
        assert!(ValidationRules::validate_url("https://example.com/a.jpg", "images").valid);
        assert!(ValidationRules::validate_url("http://localhost:8080/path", "images").valid);
        assert!(!ValidationRules::validate_url("ftp://example.com", "images").valid);
        assert!(!ValidationRules::validate_url("not-a-url", "images").valid);
        assert!(!ValidationRules::validate_url("", "images").valid);
    }

    #[test]
    fn test_validate_list_size() {
        let items = vec![1, 2, 3];
        assert!(ValidationRules::validate_list_size(&items, "field", None, Some(10)).valid);
        assert!(!ValidationRules::validate_list_size(&items, "field", None, Some(2)).valid);
        assert!(!ValidationRules::validate_list_size(&items, "field", Some(5), None).valid);
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(ValidationRules::validate_coordinates(77.2090, 28.6139).valid);
        assert!(ValidationRules::validate_coordinates(-180.0, 90.0).valid);

        let result = ValidationRules::validate_coordinates(181.0, 91.0);
        assert!(!result.valid);
        assert!(result.field_errors.contains_key("longitude"));
        assert!(result.field_errors.contains_key("latitude"));

        assert!(!ValidationRules::validate_coordinates(f64::NAN, 0.0).valid);
    }
}
