//! JSON bodies of the verification endpoint, shared by server and client.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::verification::VerificationOutcome;

/// `POST /api/verify` request.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as a 400 with the usual body instead of a deserializer error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
}

impl VerifyRequest {
    pub fn new(key: impl Into<String>, hwid: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            hwid: Some(hwid.into()),
        }
    }
}

/// `POST /api/verify` response, for business outcomes and failures alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl VerifyResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            expires: None,
        }
    }
}

impl From<&VerificationOutcome> for VerifyResponse {
    fn from(outcome: &VerificationOutcome) -> Self {
        Self {
            valid: outcome.is_valid(),
            message: outcome.message(),
            expires: outcome.expires().map(to_utc),
        }
    }
}

fn to_utc(t: NaiveDateTime) -> DateTime<Utc> {
    t.and_utc()
}
