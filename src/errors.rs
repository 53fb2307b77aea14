use std::time::Duration;

use thiserror::Error;

/// Errors produced by the license engines, stores and clients.
///
/// Business-rule failures during verification (unknown key, inactive,
/// expired, device mismatch) are not errors; they are reported through
/// [`crate::verification::VerificationOutcome`].
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Malformed input, rejected before touching the store.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("package {0} not found")]
    PackageNotFound(i64),

    #[error("license {0} not found")]
    LicenseNotFound(String),

    /// The store holds more than one license for an owner that should have at most one.
    #[error("owner {owner_id} has {count} license records")]
    AmbiguousLicenseState { owner_id: String, count: usize },

    #[error("failed to generate a unique license key after {0} attempts")]
    KeyGenerationExhausted(u32),

    /// Insert rejected because the key code is already taken.
    #[error("license key {0} already exists")]
    DuplicateKey(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The remote server answered with something we could not interpret.
    #[error("server error: {0}")]
    ServerError(String),
}

impl LicenseError {
    /// True for infrastructure failures (store down, timeouts).
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            LicenseError::PersistenceError(_) | LicenseError::Timeout(_)
        )
    }
}

pub type LicenseResult<T> = Result<T, LicenseError>;
