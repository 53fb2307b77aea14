use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::errors::{LicenseError, LicenseResult};
use crate::license::{License, LicenseStatus, NewLicense, Package};
use crate::store::{BindOutcome, LicenseStore, OwnerLicense};

#[derive(Debug, Default)]
struct Tables {
    /// license id -> license
    licenses: HashMap<String, License>,
    /// key code -> license id
    keys: HashMap<String, String>,
    /// Every key ever issued, including ones whose license was replaced.
    issued_keys: HashSet<String>,
    packages: BTreeMap<i64, Package>,
}

/// In-memory [`LicenseStore`].
///
/// All tables sit behind one mutex, so every operation (the device bind
/// included) is a single critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LicenseResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| LicenseError::PersistenceError("memory store lock poisoned".into()))
    }

    /// Add or replace a package.
    pub fn insert_package(&self, package: Package) -> LicenseResult<()> {
        self.lock()?.packages.insert(package.id, package);
        Ok(())
    }

    /// Insert a fully-formed license, bypassing the assignment engine.
    pub fn seed_license(&self, license: License) -> LicenseResult<()> {
        let mut tables = self.lock()?;
        if tables.issued_keys.contains(&license.key_code) {
            return Err(LicenseError::DuplicateKey(license.key_code));
        }
        tables.issued_keys.insert(license.key_code.clone());
        tables
            .keys
            .insert(license.key_code.clone(), license.id.clone());
        tables.licenses.insert(license.id.clone(), license);
        Ok(())
    }

    pub fn license_count(&self) -> LicenseResult<usize> {
        Ok(self.lock()?.licenses.len())
    }
}

#[async_trait]
impl LicenseStore for MemoryStore {
    async fn find_license_by_key(&self, key_code: &str) -> LicenseResult<Option<License>> {
        let tables = self.lock()?;
        Ok(tables
            .keys
            .get(key_code)
            .and_then(|id| tables.licenses.get(id))
            .cloned())
    }

    async fn find_license_by_owner(&self, owner_id: &str) -> LicenseResult<OwnerLicense> {
        let tables = self.lock()?;
        let mut owned = tables.licenses.values().filter(|l| l.owner_id == owner_id);

        Ok(match (owned.next(), owned.next()) {
            (None, _) => OwnerLicense::None,
            (Some(license), None) => OwnerLicense::One(license.clone()),
            (Some(_), Some(_)) => OwnerLicense::Ambiguous {
                count: 2 + owned.count(),
            },
        })
    }

    async fn find_package(&self, package_id: i64) -> LicenseResult<Option<Package>> {
        Ok(self.lock()?.packages.get(&package_id).cloned())
    }

    async fn conditional_bind_hardware_id(
        &self,
        license_id: &str,
        hardware_id: &str,
    ) -> LicenseResult<BindOutcome> {
        let mut tables = self.lock()?;
        match tables.licenses.get_mut(license_id) {
            Some(license) if !license.is_bound() => {
                license.hardware_id = Some(hardware_id.to_string());
                Ok(BindOutcome::Bound)
            }
            _ => Ok(BindOutcome::AlreadyBound),
        }
    }

    async fn update_license_on_renewal(
        &self,
        license_id: &str,
        package_id: i64,
        new_end_date: NaiveDateTime,
    ) -> LicenseResult<()> {
        let mut tables = self.lock()?;
        let license = tables.licenses.get_mut(license_id).ok_or_else(|| {
            LicenseError::PersistenceError(format!("license {license_id} disappeared"))
        })?;

        license.package_id = package_id;
        license.status = LicenseStatus::Active;
        license.end_date = new_end_date;
        Ok(())
    }

    async fn insert_license(&self, license: NewLicense) -> LicenseResult<License> {
        let license = license.into_license();
        self.seed_license(license.clone())?;
        Ok(license)
    }

    async fn unlink_hardware_id(&self, license_id: &str) -> LicenseResult<bool> {
        let mut tables = self.lock()?;
        Ok(match tables.licenses.get_mut(license_id) {
            Some(license) => {
                license.hardware_id = None;
                true
            }
            None => false,
        })
    }

    async fn set_license_status(
        &self,
        license_id: &str,
        status: LicenseStatus,
    ) -> LicenseResult<bool> {
        let mut tables = self.lock()?;
        Ok(match tables.licenses.get_mut(license_id) {
            Some(license) => {
                license.status = status;
                true
            }
            None => false,
        })
    }

    async fn find_license(&self, license_id: &str) -> LicenseResult<Option<License>> {
        Ok(self.lock()?.licenses.get(license_id).cloned())
    }

    async fn list_active_packages(&self) -> LicenseResult<Vec<Package>> {
        Ok(self
            .lock()?
            .packages
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn list_bound_licenses(&self, owner_id: Option<&str>) -> LicenseResult<Vec<License>> {
        let tables = self.lock()?;
        let mut bound: Vec<License> = tables
            .licenses
            .values()
            .filter(|l| l.status == LicenseStatus::Active && l.is_bound())
            .filter(|l| owner_id.map_or(true, |owner| l.owner_id == owner))
            .cloned()
            .collect();
        bound.sort_by(|a, b| a.key_code.cmp(&b.key_code));
        Ok(bound)
    }

    async fn ping(&self) -> LicenseResult<()> {
        self.lock().map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
