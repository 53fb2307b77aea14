//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

use keygate::errors::{LicenseError, LicenseResult};
use keygate::license::{License, LicenseStatus, NewLicense, Package};
use keygate::store::{BindOutcome, LicenseStore, MemoryStore, OwnerLicense};

/// Fixed clock for deterministic tests.
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

pub fn package(id: i64, duration_days: i64) -> Package {
    Package {
        id,
        name: format!("{duration_days}-day pass"),
        duration_days,
        price_cents: 999,
        is_active: true,
    }
}

/// Active, unbound license for `owner_id` ending `days_left` days after [`now`].
pub fn license(id: &str, owner_id: &str, key_code: &str, days_left: i64) -> License {
    License {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        package_id: 1,
        key_code: key_code.to_string(),
        status: LicenseStatus::Active,
        hardware_id: None,
        start_date: now() - Duration::days(30),
        end_date: now() + Duration::days(days_left),
    }
}

/// Like [`license`], but relative to the wall clock, for code paths that
/// read the current time themselves (HTTP handlers).
pub fn live_license(id: &str, owner_id: &str, key_code: &str, days_left: i64) -> License {
    let shift = Utc::now().naive_utc() - now();
    let mut l = license(id, owner_id, key_code, days_left);
    l.start_date += shift;
    l.end_date += shift;
    l
}

pub fn memory_store_with(licenses: Vec<License>) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_package(package(1, 30)).unwrap();
    for l in licenses {
        store.seed_license(l).unwrap();
    }
    Arc::new(store)
}

/// Delegates to a [`MemoryStore`] and counts mutating calls.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    writes: AtomicUsize,
}

impl RecordingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LicenseStore for RecordingStore {
    async fn find_license_by_key(&self, key_code: &str) -> LicenseResult<Option<License>> {
        self.inner.find_license_by_key(key_code).await
    }

    async fn find_license_by_owner(&self, owner_id: &str) -> LicenseResult<OwnerLicense> {
        self.inner.find_license_by_owner(owner_id).await
    }

    async fn find_package(&self, package_id: i64) -> LicenseResult<Option<Package>> {
        self.inner.find_package(package_id).await
    }

    async fn conditional_bind_hardware_id(
        &self,
        license_id: &str,
        hardware_id: &str,
    ) -> LicenseResult<BindOutcome> {
        self.record();
        self.inner
            .conditional_bind_hardware_id(license_id, hardware_id)
            .await
    }

    async fn update_license_on_renewal(
        &self,
        license_id: &str,
        package_id: i64,
        new_end_date: NaiveDateTime,
    ) -> LicenseResult<()> {
        self.record();
        self.inner
            .update_license_on_renewal(license_id, package_id, new_end_date)
            .await
    }

    async fn insert_license(&self, license: NewLicense) -> LicenseResult<License> {
        self.record();
        self.inner.insert_license(license).await
    }

    async fn unlink_hardware_id(&self, license_id: &str) -> LicenseResult<bool> {
        self.record();
        self.inner.unlink_hardware_id(license_id).await
    }

    async fn set_license_status(
        &self,
        license_id: &str,
        status: LicenseStatus,
    ) -> LicenseResult<bool> {
        self.record();
        self.inner.set_license_status(license_id, status).await
    }

    async fn find_license(&self, license_id: &str) -> LicenseResult<Option<License>> {
        self.inner.find_license(license_id).await
    }

    async fn list_active_packages(&self) -> LicenseResult<Vec<Package>> {
        self.inner.list_active_packages().await
    }

    async fn list_bound_licenses(&self, owner_id: Option<&str>) -> LicenseResult<Vec<License>> {
        self.inner.list_bound_licenses(owner_id).await
    }

    async fn ping(&self) -> LicenseResult<()> {
        self.inner.ping().await
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}

/// A store whose every call fails like an unreachable database.
pub struct FailingStore;

fn down<T>() -> LicenseResult<T> {
    Err(LicenseError::PersistenceError("connection refused".into()))
}

#[async_trait]
impl LicenseStore for FailingStore {
    async fn find_license_by_key(&self, _: &str) -> LicenseResult<Option<License>> {
        down()
    }

    async fn find_license_by_owner(&self, _: &str) -> LicenseResult<OwnerLicense> {
        down()
    }

    async fn find_package(&self, _: i64) -> LicenseResult<Option<Package>> {
        down()
    }

    async fn conditional_bind_hardware_id(&self, _: &str, _: &str) -> LicenseResult<BindOutcome> {
        down()
    }

    async fn update_license_on_renewal(
        &self,
        _: &str,
        _: i64,
        _: NaiveDateTime,
    ) -> LicenseResult<()> {
        down()
    }

    async fn insert_license(&self, _: NewLicense) -> LicenseResult<License> {
        down()
    }

    async fn unlink_hardware_id(&self, _: &str) -> LicenseResult<bool> {
        down()
    }

    async fn set_license_status(&self, _: &str, _: LicenseStatus) -> LicenseResult<bool> {
        down()
    }

    async fn find_license(&self, _: &str) -> LicenseResult<Option<License>> {
        down()
    }

    async fn list_active_packages(&self) -> LicenseResult<Vec<Package>> {
        down()
    }

    async fn list_bound_licenses(&self, _: Option<&str>) -> LicenseResult<Vec<License>> {
        down()
    }

    async fn ping(&self) -> LicenseResult<()> {
        down()
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// A store where another device always wins the activation race: the bind
/// writes `winner` instead of the caller's device and reports `AlreadyBound`.
pub struct RaceLosingStore {
    pub inner: MemoryStore,
    winner: String,
}

impl RaceLosingStore {
    pub fn new(winner: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            winner: winner.to_string(),
        }
    }
}

#[async_trait]
impl LicenseStore for RaceLosingStore {
    async fn find_license_by_key(&self, key_code: &str) -> LicenseResult<Option<License>> {
        self.inner.find_license_by_key(key_code).await
    }

    async fn find_license_by_owner(&self, owner_id: &str) -> LicenseResult<OwnerLicense> {
        self.inner.find_license_by_owner(owner_id).await
    }

    async fn find_package(&self, package_id: i64) -> LicenseResult<Option<Package>> {
        self.inner.find_package(package_id).await
    }

    async fn conditional_bind_hardware_id(
        &self,
        license_id: &str,
        _hardware_id: &str,
    ) -> LicenseResult<BindOutcome> {
        self.inner
            .conditional_bind_hardware_id(license_id, &self.winner)
            .await?;
        Ok(BindOutcome::AlreadyBound)
    }

    async fn update_license_on_renewal(
        &self,
        license_id: &str,
        package_id: i64,
        new_end_date: NaiveDateTime,
    ) -> LicenseResult<()> {
        self.inner
            .update_license_on_renewal(license_id, package_id, new_end_date)
            .await
    }

    async fn insert_license(&self, license: NewLicense) -> LicenseResult<License> {
        self.inner.insert_license(license).await
    }

    async fn unlink_hardware_id(&self, license_id: &str) -> LicenseResult<bool> {
        self.inner.unlink_hardware_id(license_id).await
    }

    async fn set_license_status(
        &self,
        license_id: &str,
        status: LicenseStatus,
    ) -> LicenseResult<bool> {
        self.inner.set_license_status(license_id, status).await
    }

    async fn find_license(&self, license_id: &str) -> LicenseResult<Option<License>> {
        self.inner.find_license(license_id).await
    }

    async fn list_active_packages(&self) -> LicenseResult<Vec<Package>> {
        self.inner.list_active_packages().await
    }

    async fn list_bound_licenses(&self, owner_id: Option<&str>) -> LicenseResult<Vec<License>> {
        self.inner.list_bound_licenses(owner_id).await
    }

    async fn ping(&self) -> LicenseResult<()> {
        self.inner.ping().await
    }

    fn backend(&self) -> &'static str {
        "race-losing"
    }
}
