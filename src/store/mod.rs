//! Persistence contract used by the engines.
//!
//! Implementations:
//! - [`memory::MemoryStore`] → in-process maps, for tests and embedding
//! - `server::database::Database` → SQLite/Postgres via sqlx (requires `server`)
//!
//! The only operation whose atomicity the engines depend on is
//! [`LicenseStore::conditional_bind_hardware_id`]: it must refuse to write
//! when a device is already bound, in one step against the store.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::errors::LicenseResult;
use crate::license::{License, LicenseStatus, NewLicense, Package};

pub use memory::MemoryStore;

/// Result of looking up the license owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerLicense {
    None,
    One(License),
    /// More than one record matched. `count` is a lower bound.
    Ambiguous { count: usize },
}

/// Result of the compare-and-set device bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// This call wrote the hardware id.
    Bound,
    /// A device was already bound (or the license vanished); nothing was written.
    AlreadyBound,
}

#[async_trait]
pub trait LicenseStore: Send + Sync {
    async fn find_license_by_key(&self, key_code: &str) -> LicenseResult<Option<License>>;

    async fn find_license_by_owner(&self, owner_id: &str) -> LicenseResult<OwnerLicense>;

    async fn find_package(&self, package_id: i64) -> LicenseResult<Option<Package>>;

    /// Set `hardware_id` only if it is still unset at the moment of the write.
    async fn conditional_bind_hardware_id(
        &self,
        license_id: &str,
        hardware_id: &str,
    ) -> LicenseResult<BindOutcome>;

    /// Point the license at `package_id`, mark it active and move its end date.
    ///
    /// `start_date` and `hardware_id` are left alone.
    async fn update_license_on_renewal(
        &self,
        license_id: &str,
        package_id: i64,
        new_end_date: NaiveDateTime,
    ) -> LicenseResult<()>;

    /// Insert a fresh license. Fails with `LicenseError::DuplicateKey` when
    /// the key code is taken.
    async fn insert_license(&self, license: NewLicense) -> LicenseResult<License>;

    /// Clear the bound device. Returns `false` if no such license exists.
    async fn unlink_hardware_id(&self, license_id: &str) -> LicenseResult<bool>;

    /// Flip the stored status. Returns `false` if no such license exists.
    async fn set_license_status(
        &self,
        license_id: &str,
        status: LicenseStatus,
    ) -> LicenseResult<bool>;

    async fn find_license(&self, license_id: &str) -> LicenseResult<Option<License>>;

    /// Packages visible to buyers, ordered by id.
    async fn list_active_packages(&self) -> LicenseResult<Vec<Package>>;

    /// Active licenses with a bound device, optionally for a single owner.
    async fn list_bound_licenses(&self, owner_id: Option<&str>) -> LicenseResult<Vec<License>>;

    /// Cheap reachability check for health checks.
    async fn ping(&self) -> LicenseResult<()>;

    /// Short backend label reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
