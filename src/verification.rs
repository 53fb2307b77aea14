//! Activation and verification of `(key, hardware id)` pairs.
//!
//! Checks run in a fixed order and the first failing one decides the
//! outcome: key lookup, stored status, expiry, then device binding. The
//! first successful call on an unbound license binds it to the caller's
//! device through the store's compare-and-set; a caller that loses that
//! race is evaluated against whatever device won.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{LicenseError, LicenseResult};
use crate::license::{License, LicenseStatus};
use crate::license_key::redact_key;
use crate::store::{BindOutcome, LicenseStore};

/// Classification of a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// This call bound the license to the device.
    Activated { expires_at: NaiveDateTime },
    /// The device matches the one already bound.
    Valid { expires_at: NaiveDateTime },
    KeyNotFound,
    Inactive { status: LicenseStatus },
    Expired { expired_at: NaiveDateTime },
    DeviceMismatch,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            VerificationOutcome::Activated { .. } | VerificationOutcome::Valid { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            VerificationOutcome::Activated { .. } => "activated".to_string(),
            VerificationOutcome::Valid { .. } => "license valid".to_string(),
            VerificationOutcome::KeyNotFound => "key not found".to_string(),
            VerificationOutcome::Inactive { status } => format!("license is {status}"),
            VerificationOutcome::Expired { .. } => "license expired".to_string(),
            VerificationOutcome::DeviceMismatch => "device mismatch".to_string(),
        }
    }

    /// End of the validity window, when the outcome reports one.
    pub fn expires(&self) -> Option<NaiveDateTime> {
        match self {
            VerificationOutcome::Activated { expires_at }
            | VerificationOutcome::Valid { expires_at } => Some(*expires_at),
            VerificationOutcome::Expired { expired_at } => Some(*expired_at),
            _ => None,
        }
    }
}

/// Decides whether a key is usable on a device.
#[derive(Clone)]
pub struct VerificationEngine {
    store: Arc<dyn LicenseStore>,
}

impl VerificationEngine {
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self { store }
    }

    /// Verify `key_code` for `hardware_id` at the current time.
    pub async fn verify(
        &self,
        key_code: &str,
        hardware_id: &str,
    ) -> LicenseResult<VerificationOutcome> {
        self.verify_at(key_code, hardware_id, Utc::now().naive_utc())
            .await
    }

    /// Verify against an explicit clock reading.
    ///
    /// At most one store write happens, and only when the license has no
    /// device yet.
    pub async fn verify_at(
        &self,
        key_code: &str,
        hardware_id: &str,
        now: NaiveDateTime,
    ) -> LicenseResult<VerificationOutcome> {
        if key_code.trim().is_empty() || hardware_id.trim().is_empty() {
            return Err(LicenseError::BadRequest(
                "both key and hwid are required".to_string(),
            ));
        }

        let Some(license) = self.store.find_license_by_key(key_code).await? else {
            warn!(key = %redact_key(key_code), "verification for unknown key");
            return Ok(VerificationOutcome::KeyNotFound);
        };

        if license.status != LicenseStatus::Active {
            return Ok(VerificationOutcome::Inactive {
                status: license.status,
            });
        }

        if license.is_expired_at(now) {
            return Ok(VerificationOutcome::Expired {
                expired_at: license.end_date,
            });
        }

        let license = if license.is_bound() {
            license
        } else {
            match self
                .store
                .conditional_bind_hardware_id(&license.id, hardware_id)
                .await?
            {
                BindOutcome::Bound => {
                    info!(license_id = %license.id, "license activated");
                    return Ok(VerificationOutcome::Activated {
                        expires_at: license.end_date,
                    });
                }
                BindOutcome::AlreadyBound => {
                    debug!(license_id = %license.id, "lost activation race, re-reading license");
                    match self.store.find_license_by_key(key_code).await? {
                        Some(current) => current,
                        None => return Ok(VerificationOutcome::KeyNotFound),
                    }
                }
            }
        };

        Ok(match_device(&license, hardware_id))
    }
}

fn match_device(license: &License, hardware_id: &str) -> VerificationOutcome {
    if license.hardware_id.as_deref() == Some(hardware_id) {
        VerificationOutcome::Valid {
            expires_at: license.end_date,
        }
    } else {
        VerificationOutcome::DeviceMismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn messages_follow_outcomes() {
        let t = Utc::now().naive_utc();
        assert_eq!(
            VerificationOutcome::Activated { expires_at: t }.message(),
            "activated"
        );
        assert_eq!(
            VerificationOutcome::Valid { expires_at: t }.message(),
            "license valid"
        );
        assert_eq!(VerificationOutcome::KeyNotFound.message(), "key not found");
        assert_eq!(
            VerificationOutcome::Inactive {
                status: LicenseStatus::Revoked
            }
            .message(),
            "license is revoked"
        );
        assert_eq!(
            VerificationOutcome::Expired { expired_at: t }.message(),
            "license expired"
        );
        assert_eq!(
            VerificationOutcome::DeviceMismatch.message(),
            "device mismatch"
        );
    }

    #[test]
    fn only_success_and_expiry_report_dates() {
        let t = Utc::now().naive_utc() + Duration::days(1);
        assert_eq!(
            VerificationOutcome::Valid { expires_at: t }.expires(),
            Some(t)
        );
        assert_eq!(
            VerificationOutcome::Expired { expired_at: t }.expires(),
            Some(t)
        );
        assert_eq!(VerificationOutcome::DeviceMismatch.expires(), None);
        assert!(!VerificationOutcome::DeviceMismatch.is_valid());
        assert!(VerificationOutcome::Activated { expires_at: t }.is_valid());
    }

    #[test]
    fn device_match_compares_exactly() {
        let now = Utc::now().naive_utc();
        let license = License {
            id: "l".into(),
            owner_id: "o".into(),
            package_id: 1,
            key_code: "KEY-00000000".into(),
            status: LicenseStatus::Active,
            hardware_id: Some("hw-A".into()),
            start_date: now,
            end_date: now + Duration::days(1),
        };
        assert!(match_device(&license, "hw-A").is_valid());
        assert_eq!(
            match_device(&license, "hw-a"),
            VerificationOutcome::DeviceMismatch
        );
    }
}
