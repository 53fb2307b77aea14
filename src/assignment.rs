//! Granting and renewing packages.
//!
//! A renewal stacks on the current window while it is still live and
//! restarts from `now` once it has lapsed. Owners without a license get a
//! new one with a freshly generated key.

use std::sync::Arc;

use chrono::{Days, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::LicenseConfig;
use crate::errors::{LicenseError, LicenseResult};
use crate::license::NewLicense;
use crate::license_key::{KeyGenerator, LicenseKeyConfig};
use crate::store::{LicenseStore, OwnerLicense};

/// Default number of key generation attempts before giving up.
pub const DEFAULT_MAX_KEY_ATTEMPTS: u32 = 5;

/// What an assignment produced, for display and notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentResult {
    pub license_id: String,
    pub key_code: String,
    pub end_date: NaiveDateTime,
    /// `false` when a new license was created.
    pub renewed: bool,
}

/// Start of the new window for an owner's current end date.
///
/// Live windows (ending after `now`) stack; lapsed or missing ones reset.
pub fn renewal_base(current_end: Option<NaiveDateTime>, now: NaiveDateTime) -> NaiveDateTime {
    match current_end {
        Some(end) if end > now => end,
        _ => now,
    }
}

/// `base` plus `duration_days` calendar days.
pub fn extend_by_days(base: NaiveDateTime, duration_days: i64) -> LicenseResult<NaiveDateTime> {
    let days = u64::try_from(duration_days)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| {
            LicenseError::BadRequest(format!(
                "package duration must be positive, got {duration_days}"
            ))
        })?;

    base.checked_add_days(Days::new(days))
        .ok_or_else(|| LicenseError::BadRequest("license end date out of range".to_string()))
}

pub struct AssignmentEngine {
    store: Arc<dyn LicenseStore>,
    keys: Box<dyn KeyGenerator>,
    max_key_attempts: u32,
}

impl AssignmentEngine {
    /// Engine with the default key shape and attempt limit.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self::with_generator(
            store,
            LicenseKeyConfig::default(),
            DEFAULT_MAX_KEY_ATTEMPTS,
        )
    }

    pub fn from_config(store: Arc<dyn LicenseStore>, config: &LicenseConfig) -> Self {
        Self::with_generator(
            store,
            LicenseKeyConfig::from(config),
            config.max_key_attempts,
        )
    }

    pub fn with_generator(
        store: Arc<dyn LicenseStore>,
        keys: impl KeyGenerator + 'static,
        max_key_attempts: u32,
    ) -> Self {
        Self {
            store,
            keys: Box::new(keys),
            max_key_attempts,
        }
    }

    /// Grant or extend `package_id` for `owner_id` at the current time.
    pub async fn assign_package(
        &self,
        owner_id: &str,
        package_id: i64,
    ) -> LicenseResult<AssignmentResult> {
        self.assign_package_at(owner_id, package_id, Utc::now().naive_utc())
            .await
    }

    /// Grant or extend against an explicit clock reading.
    ///
    /// The lookup and the write are separate store calls; two operators
    /// renewing the same owner concurrently can lose one extension.
    pub async fn assign_package_at(
        &self,
        owner_id: &str,
        package_id: i64,
        now: NaiveDateTime,
    ) -> LicenseResult<AssignmentResult> {
        if owner_id.trim().is_empty() {
            return Err(LicenseError::BadRequest("owner id is required".to_string()));
        }

        let package = self
            .store
            .find_package(package_id)
            .await?
            .ok_or(LicenseError::PackageNotFound(package_id))?;

        match self.store.find_license_by_owner(owner_id).await? {
            OwnerLicense::Ambiguous { count } => {
                warn!(owner_id, count, "refusing to renew: multiple licenses");
                Err(LicenseError::AmbiguousLicenseState {
                    owner_id: owner_id.to_string(),
                    count,
                })
            }
            OwnerLicense::One(existing) => {
                let base = renewal_base(Some(existing.end_date), now);
                let new_end = extend_by_days(base, package.duration_days)?;

                self.store
                    .update_license_on_renewal(&existing.id, package.id, new_end)
                    .await?;

                info!(
                    owner_id,
                    key = %existing.key_code,
                    package = %package.name,
                    previous_end = %existing.end_date,
                    new_end = %new_end,
                    "license renewed"
                );

                Ok(AssignmentResult {
                    license_id: existing.id,
                    key_code: existing.key_code,
                    end_date: new_end,
                    renewed: true,
                })
            }
            OwnerLicense::None => {
                let new_end = extend_by_days(renewal_base(None, now), package.duration_days)?;
                let license_id = Uuid::new_v4().to_string();

                for attempt in 1..=self.max_key_attempts {
                    let candidate = NewLicense {
                        id: license_id.clone(),
                        owner_id: owner_id.to_string(),
                        package_id: package.id,
                        key_code: self.keys.generate(),
                        start_date: now,
                        end_date: new_end,
                    };

                    match self.store.insert_license(candidate).await {
                        Ok(license) => {
                            info!(
                                owner_id,
                                key = %license.key_code,
                                package = %package.name,
                                end = %new_end,
                                "license created"
                            );
                            return Ok(AssignmentResult {
                                license_id: license.id,
                                key_code: license.key_code,
                                end_date: license.end_date,
                                renewed: false,
                            });
                        }
                        Err(LicenseError::DuplicateKey(key)) => {
                            warn!(attempt, key = %key, "generated key collided, retrying");
                        }
                        Err(e) => return Err(e),
                    }
                }

                Err(LicenseError::KeyGenerationExhausted(self.max_key_attempts))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn live_window_stacks() {
        let now = at(2025, 1, 1);
        let end = now + Duration::days(5);
        assert_eq!(renewal_base(Some(end), now), end);
    }

    #[test]
    fn lapsed_or_missing_window_resets() {
        let now = at(2025, 1, 1);
        assert_eq!(renewal_base(Some(now - Duration::days(3)), now), now);
        // Ending exactly now counts as lapsed.
        assert_eq!(renewal_base(Some(now), now), now);
        assert_eq!(renewal_base(None, now), now);
    }

    #[test]
    fn extension_uses_calendar_days() {
        assert_eq!(extend_by_days(at(2024, 2, 25), 10).unwrap(), at(2024, 3, 6));
        assert_eq!(extend_by_days(at(2025, 12, 30), 3).unwrap(), at(2026, 1, 2));
    }

    #[test]
    fn extension_rejects_non_positive_durations() {
        assert!(matches!(
            extend_by_days(at(2025, 1, 1), 0),
            Err(LicenseError::BadRequest(_))
        ));
        assert!(extend_by_days(at(2025, 1, 1), -4).is_err());
    }
}
