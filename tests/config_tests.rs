use std::env;

use serial_test::serial;

use keygate::config::KeygateConfig;
use keygate::errors::LicenseError;

const VARS: &[&str] = &[
    "KEYGATE_SERVER_HOST",
    "KEYGATE_SERVER_PORT",
    "KEYGATE_LICENSE_KEY_PREFIX",
    "KEYGATE_LICENSE_KEY_LENGTH",
    "KEYGATE_MAX_KEY_ATTEMPTS",
    "KEYGATE_DATABASE_TYPE",
    "KEYGATE_DATABASE_URL",
    "KEYGATE_DATABASE_TIMEOUT_MS",
    "KEYGATE_LOGGING_ENABLED",
    "KEYGATE_LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn load_uses_defaults_without_env() {
    clear_env();

    let config = KeygateConfig::load().unwrap();
    config.validate().unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.license.key_prefix, "KEY");
    assert_eq!(config.license.key_length, 8);
    assert_eq!(config.license.max_key_attempts, 5);
    assert_eq!(config.database.db_type, "sqlite");
    assert_eq!(config.database.timeout_ms, 5000);
    assert!(config.database.run_migrations);
    assert!(!config.logging.enabled);
    assert_eq!(config.logging.level, "info");
}

#[test]
#[serial]
fn env_overrides_defaults() {
    clear_env();
    env::set_var("KEYGATE_SERVER_PORT", "9191");
    env::set_var("KEYGATE_LICENSE_KEY_PREFIX", "ACME");
    env::set_var("KEYGATE_LICENSE_KEY_LENGTH", "12");
    env::set_var("KEYGATE_MAX_KEY_ATTEMPTS", "9");
    env::set_var("KEYGATE_DATABASE_TIMEOUT_MS", "250");
    env::set_var("KEYGATE_LOGGING_ENABLED", "true");
    env::set_var("KEYGATE_LOG_LEVEL", "debug");

    let config = KeygateConfig::load().unwrap();
    clear_env();

    config.validate().unwrap();
    assert_eq!(config.server.port, 9191);
    assert_eq!(config.license.key_prefix, "ACME");
    assert_eq!(config.license.key_length, 12);
    assert_eq!(config.license.max_key_attempts, 9);
    assert_eq!(config.database.timeout_ms, 250);
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn database_url_is_routed_by_scheme() {
    clear_env();
    env::set_var("KEYGATE_DATABASE_TYPE", "postgres");
    env::set_var("KEYGATE_DATABASE_URL", "postgres://keygate@db/licenses");

    let config = KeygateConfig::load().unwrap();
    clear_env();

    assert_eq!(config.database.db_type, "postgres");
    assert_eq!(config.database.postgres_url, "postgres://keygate@db/licenses");
    assert_eq!(
        config.database.sqlite_url,
        KeygateConfig::default().database.sqlite_url
    );
}

#[test]
#[serial]
fn invalid_env_values_fail_validation() {
    clear_env();
    env::set_var("KEYGATE_LICENSE_KEY_LENGTH", "64");

    let config = KeygateConfig::load().unwrap();
    clear_env();

    assert!(matches!(
        config.validate(),
        Err(LicenseError::ConfigError(msg)) if msg.contains("key_length")
    ));
}
