//! Error envelope for the administrative endpoints.
//!
//! All admin error responses use this JSON structure:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "PACKAGE_NOT_FOUND",
//!     "message": "package 7 not found",
//!     "details": { "package_id": 7 }
//!   }
//! }
//! ```
//!
//! The verification endpoint keeps its own flat `{valid, message}` body and
//! does not use this module.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::LicenseError;
use crate::server::validation::ValidationError;

/// Machine-readable error codes for admin responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Lookup errors (404) ===
    PackageNotFound,
    LicenseNotFound,

    // === State errors (409) ===
    /// An owner has more than one license record.
    AmbiguousLicenseState,

    // === Validation errors (400) ===
    InvalidRequest,
    MissingField,
    InvalidField,

    // === Server errors (5xx) ===
    /// Every generated key collided with an existing one.
    KeyGenerationExhausted,
    DatabaseError,
    Timeout,
    ConfigError,
    NetworkError,
    InternalError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::PackageNotFound | ErrorCode::LicenseNotFound => StatusCode::NOT_FOUND,

            ErrorCode::AmbiguousLicenseState => StatusCode::CONFLICT,

            ErrorCode::InvalidRequest | ErrorCode::MissingField | ErrorCode::InvalidField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::KeyGenerationExhausted => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::DatabaseError | ErrorCode::ConfigError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::NetworkError => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::PackageNotFound => "The requested package does not exist",
            ErrorCode::LicenseNotFound => "The requested license does not exist",
            ErrorCode::AmbiguousLicenseState => "Owner has more than one license record",
            ErrorCode::InvalidRequest => "Request payload is invalid",
            ErrorCode::MissingField => "A required field is missing",
            ErrorCode::InvalidField => "A field value is invalid",
            ErrorCode::KeyGenerationExhausted => "Could not generate a unique license key",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::Timeout => "Database operation timed out",
            ErrorCode::ConfigError => "Server configuration error",
            ErrorCode::NetworkError => "Failed to communicate with external service",
            ErrorCode::InternalError => "An unexpected error occurred",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    /// Extra context such as the offending field or id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

impl ApiError {
    /// Error with the code's default message.
    pub fn new(code: ErrorCode) -> Self {
        Self::build(code, code.default_message(), None)
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(code, message, None)
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::build(code, message, Some(details))
    }

    fn build(
        code: ErrorCode,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                details,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.error.code.status_code()
    }

    pub fn missing_field(field: &str) -> Self {
        Self::with_details(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
            serde_json::json!({ "field": field }),
        )
    }

    pub fn invalid_field(field: &str, reason: &str) -> Self {
        Self::with_details(
            ErrorCode::InvalidField,
            format!("Invalid value for '{}': {}", field, reason),
            serde_json::json!({ "field": field }),
        )
    }

    fn license_not_found(license_id: &str) -> Self {
        Self::with_details(
            ErrorCode::LicenseNotFound,
            format!("license {} not found", license_id),
            serde_json::json!({ "license_id": license_id }),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.error.code, self.error.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid_field(&err.field, &err.message)
    }
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::BadRequest(msg) => ApiError::with_message(ErrorCode::InvalidRequest, msg),
            LicenseError::PackageNotFound(id) => ApiError::with_details(
                ErrorCode::PackageNotFound,
                format!("package {} not found", id),
                serde_json::json!({ "package_id": id }),
            ),
            LicenseError::LicenseNotFound(id) => ApiError::license_not_found(&id),
            LicenseError::AmbiguousLicenseState { owner_id, count } => ApiError::with_details(
                ErrorCode::AmbiguousLicenseState,
                format!("owner {} has {} license records", owner_id, count),
                serde_json::json!({ "owner_id": owner_id, "count": count }),
            ),
            LicenseError::KeyGenerationExhausted(attempts) => ApiError::with_details(
                ErrorCode::KeyGenerationExhausted,
                ErrorCode::KeyGenerationExhausted.default_message(),
                serde_json::json!({ "attempts": attempts }),
            ),
            // A duplicate escaping the engine is a store inconsistency, not a client error.
            LicenseError::DuplicateKey(_) => ApiError::new(ErrorCode::InternalError),
            LicenseError::PersistenceError(msg) => {
                // Store messages can carry SQL; keep them in the log only.
                error!(error = %msg, "persistence failure in admin request");
                ApiError::new(ErrorCode::DatabaseError)
            }
            LicenseError::Timeout(after) => {
                error!(?after, "store timeout in admin request");
                ApiError::new(ErrorCode::Timeout)
            }
            LicenseError::ConfigError(msg) => ApiError::with_message(ErrorCode::ConfigError, msg),
            LicenseError::NetworkError(e) => {
                ApiError::with_message(ErrorCode::NetworkError, e.to_string())
            }
            LicenseError::ServerError(msg) => ApiError::with_message(ErrorCode::InternalError, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(
            ErrorCode::PackageNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::AmbiguousLicenseState.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::MissingField.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::KeyGenerationExhausted.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ErrorCode::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ErrorCode::DatabaseError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn serializes_with_screaming_codes() {
        let err: ApiError = LicenseError::PackageNotFound(7).into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["code"], "PACKAGE_NOT_FOUND");
        assert_eq!(json["error"]["details"]["package_id"], 7);
    }

    #[test]
    fn unknown_license_carries_its_id() {
        let err: ApiError = LicenseError::LicenseNotFound("lic-9".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error.code, ErrorCode::LicenseNotFound);
        assert_eq!(err.error.details.unwrap()["license_id"], "lic-9");
    }

    #[test]
    fn persistence_details_are_not_leaked() {
        let err: ApiError =
            LicenseError::PersistenceError("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.error.code, ErrorCode::DatabaseError);
        assert!(!err.error.message.contains("SELEC"));

        let err: ApiError = LicenseError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn ambiguous_owner_maps_to_conflict() {
        let err: ApiError = LicenseError::AmbiguousLicenseState {
            owner_id: "user-9".into(),
            count: 2,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error.details.unwrap()["owner_id"], "user-9");
    }

    #[test]
    fn validation_errors_become_invalid_field() {
        let err: ApiError = ValidationError {
            field: "owner_id".into(),
            message: "cannot be empty".into(),
        }
        .into();
        assert_eq!(err.error.code, ErrorCode::InvalidField);
        assert!(err.error.message.contains("owner_id"));
    }
}
