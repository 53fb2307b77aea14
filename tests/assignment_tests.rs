mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Duration;

use keygate::assignment::AssignmentEngine;
use keygate::config::LicenseConfig;
use keygate::errors::LicenseError;
use keygate::license::LicenseStatus;
use keygate::license_key::{validate_license_key_format, LicenseKeyConfig};
use keygate::store::{LicenseStore, MemoryStore};

use common::{license, now, package, FailingStore};

fn store_with_package(duration_days: i64) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_package(package(1, 30)).unwrap();
    store.insert_package(package(2, duration_days)).unwrap();
    Arc::new(store)
}

/// Generator that replays `keys` in order, then repeats the last one.
fn scripted(keys: &[&str]) -> impl Fn() -> String + Send + Sync + 'static {
    let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    let next = AtomicUsize::new(0);
    move || {
        let i = next.fetch_add(1, Ordering::SeqCst).min(keys.len() - 1);
        keys[i].clone()
    }
}

#[tokio::test]
async fn renewal_stacks_onto_live_window() {
    let store = store_with_package(10);
    let existing = license("lic-1", "owner-1", "KEY-AAAA1111", 5);
    let start = existing.start_date;
    store.seed_license(existing).unwrap();
    let engine = AssignmentEngine::new(store.clone());

    let result = engine.assign_package_at("owner-1", 2, now()).await.unwrap();

    assert!(result.renewed);
    assert_eq!(result.key_code, "KEY-AAAA1111");
    assert_eq!(result.end_date, now() + Duration::days(15));

    let stored = store.find_license("lic-1").await.unwrap().unwrap();
    assert_eq!(stored.end_date, now() + Duration::days(15));
    assert_eq!(stored.start_date, start);
    assert_eq!(stored.package_id, 2);
}

#[tokio::test]
async fn renewal_of_lapsed_license_resets_and_reactivates() {
    let store = store_with_package(10);
    let mut lapsed = license("lic-1", "owner-1", "KEY-AAAA1111", -3);
    lapsed.status = LicenseStatus::Suspended;
    lapsed.hardware_id = Some("hw-a".into());
    store.seed_license(lapsed).unwrap();
    let engine = AssignmentEngine::new(store.clone());

    let result = engine.assign_package_at("owner-1", 2, now()).await.unwrap();
    assert_eq!(result.end_date, now() + Duration::days(10));

    let stored = store.find_license("lic-1").await.unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Active);
    assert_eq!(stored.end_date, now() + Duration::days(10));
    // Renewal leaves the bound device alone.
    assert_eq!(stored.hardware_id.as_deref(), Some("hw-a"));
}

#[tokio::test]
async fn fresh_assignment_creates_unbound_license() {
    let store = store_with_package(10);
    let engine = AssignmentEngine::new(store.clone());

    let result = engine.assign_package_at("owner-9", 2, now()).await.unwrap();

    assert!(!result.renewed);
    assert!(validate_license_key_format(
        &result.key_code,
        &LicenseKeyConfig::default()
    ));

    let stored = store
        .find_license_by_key(&result.key_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, result.license_id);
    assert_eq!(stored.owner_id, "owner-9");
    assert_eq!(stored.package_id, 2);
    assert_eq!(stored.status, LicenseStatus::Active);
    assert_eq!(stored.start_date, now());
    assert_eq!(stored.end_date, now() + Duration::days(10));
    assert!(stored.hardware_id.is_none());
}

#[tokio::test]
async fn configured_key_shape_is_used() {
    let store = store_with_package(10);
    let config = LicenseConfig {
        key_prefix: "ACME".to_string(),
        key_length: 12,
        max_key_attempts: 3,
    };
    let engine = AssignmentEngine::from_config(store, &config);

    let result = engine.assign_package_at("owner-1", 2, now()).await.unwrap();
    assert!(result.key_code.starts_with("ACME-"));
    assert_eq!(result.key_code.len(), "ACME-".len() + 12);
}

#[tokio::test]
async fn key_collision_is_retried() {
    let store = store_with_package(10);
    store
        .seed_license(license("lic-1", "owner-1", "KEY-TAKEN000", 5))
        .unwrap();
    let engine = AssignmentEngine::with_generator(
        store.clone(),
        scripted(&["KEY-TAKEN000", "KEY-TAKEN000", "KEY-FREE0001"]),
        5,
    );

    let result = engine.assign_package_at("owner-2", 2, now()).await.unwrap();

    assert_eq!(result.key_code, "KEY-FREE0001");
    assert_eq!(store.license_count().unwrap(), 2);
}

#[tokio::test]
async fn persistent_collisions_exhaust_attempts() {
    let store = store_with_package(10);
    store
        .seed_license(license("lic-1", "owner-1", "KEY-TAKEN000", 5))
        .unwrap();
    let engine =
        AssignmentEngine::with_generator(store.clone(), scripted(&["KEY-TAKEN000"]), 4);

    let err = engine
        .assign_package_at("owner-2", 2, now())
        .await
        .unwrap_err();

    assert!(matches!(err, LicenseError::KeyGenerationExhausted(4)));
    assert_eq!(store.license_count().unwrap(), 1);
}

#[tokio::test]
async fn ambiguous_owner_is_refused() {
    let store = store_with_package(10);
    store
        .seed_license(license("lic-1", "owner-1", "KEY-AAAA1111", 5))
        .unwrap();
    store
        .seed_license(license("lic-2", "owner-1", "KEY-BBBB2222", 20))
        .unwrap();
    let engine = AssignmentEngine::new(store.clone());

    let err = engine
        .assign_package_at("owner-1", 2, now())
        .await
        .unwrap_err();

    match err {
        LicenseError::AmbiguousLicenseState { owner_id, count } => {
            assert_eq!(owner_id, "owner-1");
            assert_eq!(count, 2);
        }
        other => panic!("expected ambiguous state, got {other:?}"),
    }

    // Neither record moved.
    let first = store.find_license("lic-1").await.unwrap().unwrap();
    assert_eq!(first.end_date, now() + Duration::days(5));
}

#[tokio::test]
async fn unknown_package_is_reported() {
    let store = store_with_package(10);
    let engine = AssignmentEngine::new(store.clone());

    let err = engine
        .assign_package_at("owner-1", 42, now())
        .await
        .unwrap_err();

    assert!(matches!(err, LicenseError::PackageNotFound(42)));
    assert_eq!(store.license_count().unwrap(), 0);
}

#[tokio::test]
async fn blank_owner_is_a_bad_request() {
    let engine = AssignmentEngine::new(store_with_package(10));
    let err = engine.assign_package_at(" ", 2, now()).await.unwrap_err();
    assert!(matches!(err, LicenseError::BadRequest(_)));
}

#[tokio::test]
async fn store_failures_propagate() {
    let engine = AssignmentEngine::new(Arc::new(FailingStore));
    let err = engine
        .assign_package_at("owner-1", 2, now())
        .await
        .unwrap_err();
    assert!(matches!(err, LicenseError::PersistenceError(_)));
}
