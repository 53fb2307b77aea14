//! License and package records.
//!
//! Timestamps are naive UTC, matching how they are stored.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::LicenseError;

/// Stored license status.
///
/// Expiration is not a status: it is derived from `end_date` at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Suspended,
    Revoked,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "active",
            LicenseStatus::Suspended => "suspended",
            LicenseStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LicenseStatus::Active),
            "suspended" => Ok(LicenseStatus::Suspended),
            "revoked" => Ok(LicenseStatus::Revoked),
            other => Err(LicenseError::BadRequest(format!(
                "unknown license status '{other}'"
            ))),
        }
    }
}

/// A purchasable tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub duration_days: i64,
    pub price_cents: i64,
    /// Gates visibility to buyers.
    pub is_active: bool,
}

/// A license record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub owner_id: String,
    pub package_id: i64,
    pub key_code: String,
    pub status: LicenseStatus,
    /// Unset until first activation.
    pub hardware_id: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

impl License {
    /// Whether a device is bound. Empty strings count as unbound.
    pub fn is_bound(&self) -> bool {
        self.hardware_id.as_deref().is_some_and(|h| !h.is_empty())
    }

    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        self.end_date < now
    }
}

/// Fields for a license about to be inserted.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub id: String,
    pub owner_id: String,
    pub package_id: i64,
    pub key_code: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

impl NewLicense {
    /// The record as it looks right after insertion: active and unbound.
    pub fn into_license(self) -> License {
        License {
            id: self.id,
            owner_id: self.owner_id,
            package_id: self.package_id,
            key_code: self.key_code,
            status: LicenseStatus::Active,
            hardware_id: None,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}
