//! Input validation for the administrative endpoints.

use std::fmt;

use regex::Regex;

use crate::license::LicenseStatus;

/// Validation error type.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field_name: &str, message: impl Into<String>) -> Self {
        Self {
            field: field_name.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn matches(pattern: &str, value: &str, field_name: &str) -> ValidationResult<bool> {
    Regex::new(pattern)
        .map(|re| re.is_match(value))
        .map_err(|e| ValidationError::new(field_name, format!("pattern error: {e}")))
}

/// Validate that a string is not empty or whitespace only.
///
/// # Example
/// ```
/// use keygate::server::validation::validate_not_empty;
///
/// assert!(validate_not_empty("hello", "name").is_ok());
/// assert!(validate_not_empty("   ", "name").is_err());
/// ```
pub fn validate_not_empty(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field_name, "cannot be empty"))
    } else {
        Ok(())
    }
}

/// Validate string length is within bounds (in bytes).
pub fn validate_length(
    value: &str,
    min: usize,
    max: usize,
    field_name: &str,
) -> ValidationResult<()> {
    let len = value.len();
    if len < min {
        Err(ValidationError::new(
            field_name,
            format!("must be at least {} characters", min),
        ))
    } else if len > max {
        Err(ValidationError::new(
            field_name,
            format!("must be at most {} characters", max),
        ))
    } else {
        Ok(())
    }
}

/// Validate an owner id.
///
/// Owner ids come from external account systems (chat ids, emails, uuids),
/// so the format is loose: 1-128 printable characters starting with an
/// alphanumeric.
///
/// # Example
/// ```
/// use keygate::server::validation::validate_owner_id;
///
/// assert!(validate_owner_id("user-42", "owner_id").is_ok());
/// assert!(validate_owner_id("alice@example.com", "owner_id").is_ok());
/// assert!(validate_owner_id(" padded", "owner_id").is_err());
/// ```
pub fn validate_owner_id(value: &str, field_name: &str) -> ValidationResult<()> {
    if matches(r"^[A-Za-z0-9][A-Za-z0-9_.@:+-]{0,127}$", value, field_name)? {
        Ok(())
    } else {
        Err(ValidationError::new(
            field_name,
            "invalid owner id (alphanumeric start, then letters, digits or _.@:+-, max 128 chars)",
        ))
    }
}

/// Validate a license id taken from a path segment.
pub fn validate_license_id(value: &str, field_name: &str) -> ValidationResult<()> {
    validate_not_empty(value, field_name)?;
    validate_length(value, 1, 64, field_name)
}

pub fn validate_package_id(value: i64, field_name: &str) -> ValidationResult<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::new(field_name, "must be a positive integer"))
    }
}

/// Parse a status name (`active`, `suspended`, `revoked`), case-insensitively.
pub fn validate_status(value: &str, field_name: &str) -> ValidationResult<LicenseStatus> {
    value
        .trim()
        .to_ascii_lowercase()
        .parse::<LicenseStatus>()
        .map_err(|_| {
            ValidationError::new(field_name, "expected one of: active, suspended, revoked")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("hello", "field").is_ok());
        assert!(validate_not_empty("", "field").is_err());
        assert!(validate_not_empty("\t\n", "field").is_err());
    }

    #[test]
    fn test_validate_length() {
        assert!(validate_length("hello", 1, 10, "field").is_ok());
        assert!(validate_length("", 1, 10, "field").is_err());
        assert!(validate_length("hello world", 1, 10, "field").is_err());
    }

    #[test]
    fn test_validate_owner_id() {
        assert!(validate_owner_id("123456789012345678", "owner").is_ok());
        assert!(validate_owner_id("org:acme+ops", "owner").is_ok());
        assert!(validate_owner_id("", "owner").is_err());
        assert!(validate_owner_id("-leading", "owner").is_err());
        assert!(validate_owner_id("has space", "owner").is_err());
        assert!(validate_owner_id(&"a".repeat(129), "owner").is_err());
    }

    #[test]
    fn test_validate_license_id() {
        assert!(validate_license_id("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
        assert!(validate_license_id(" ", "id").is_err());
        assert!(validate_license_id(&"x".repeat(65), "id").is_err());
    }

    #[test]
    fn test_validate_package_id() {
        assert!(validate_package_id(1, "package_id").is_ok());
        assert!(validate_package_id(0, "package_id").is_err());
        assert!(validate_package_id(-3, "package_id").is_err());
    }

    #[test]
    fn test_validate_status() {
        assert_eq!(
            validate_status("Suspended", "status").unwrap(),
            LicenseStatus::Suspended
        );
        assert_eq!(
            validate_status(" revoked ", "status").unwrap(),
            LicenseStatus::Revoked
        );
        let err = validate_status("paused", "status").unwrap_err();
        assert_eq!(err.field, "status");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("test_field", "is invalid");
        assert_eq!(err.to_string(), "test_field: is invalid");
    }
}
