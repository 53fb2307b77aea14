//! Configuration system for Keygate.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `KEYGATE_SERVER_HOST` - Server bind address
//! - `KEYGATE_SERVER_PORT` - Server port
//! - `KEYGATE_LICENSE_KEY_PREFIX` - License key prefix
//! - `KEYGATE_LICENSE_KEY_LENGTH` - Random characters after the prefix
//! - `KEYGATE_MAX_KEY_ATTEMPTS` - Key regeneration attempts on collision
//! - `KEYGATE_DATABASE_TYPE` - `sqlite` or `postgres`
//! - `KEYGATE_DATABASE_URL` - Database connection URL (routed by scheme)
//! - `KEYGATE_DATABASE_TIMEOUT_MS` - Per-statement store timeout
//! - `KEYGATE_LOGGING_ENABLED` - Enable the tracing subscriber
//! - `KEYGATE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use crate::errors::{LicenseError, LicenseResult};

/// Global configuration singleton.
static CONFIG: OnceLock<KeygateConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeygateConfig {
    pub server: ServerConfig,
    pub license: LicenseConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// License key generation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Prefix for generated keys ("KEY" -> "KEY-XXXXXXXX")
    pub key_prefix: String,
    /// Number of random characters after the prefix
    pub key_length: u8,
    /// How many times assignment regenerates a key after a collision
    pub max_key_attempts: u32,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            key_prefix: "KEY".to_string(),
            key_length: 8,
            max_key_attempts: 5,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database type: "sqlite" or "postgres"
    pub db_type: String,
    pub sqlite_url: String,
    pub postgres_url: String,
    pub max_connections: u32,
    /// Upper bound for a single store statement, in milliseconds
    pub timeout_ms: u64,
    /// Create tables on startup if they are missing
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            sqlite_url: "sqlite://keygate.db?mode=rwc".to_string(),
            postgres_url: "postgres://localhost/keygate".to_string(),
            max_connections: 5,
            timeout_ms: 5000,
            run_migrations: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> LicenseError {
    LicenseError::ConfigError(e.to_string())
}

impl KeygateConfig {
    /// Load configuration from defaults, `config.toml` and the environment.
    pub fn load() -> LicenseResult<Self> {
        let defaults = Self::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)
            .map_err(config_err)?
            .set_default("server.port", defaults.server.port as i64)
            .map_err(config_err)?
            .set_default("license.key_prefix", defaults.license.key_prefix)
            .map_err(config_err)?
            .set_default("license.key_length", defaults.license.key_length as i64)
            .map_err(config_err)?
            .set_default(
                "license.max_key_attempts",
                defaults.license.max_key_attempts as i64,
            )
            .map_err(config_err)?
            .set_default("database.db_type", defaults.database.db_type)
            .map_err(config_err)?
            .set_default("database.sqlite_url", defaults.database.sqlite_url)
            .map_err(config_err)?
            .set_default("database.postgres_url", defaults.database.postgres_url)
            .map_err(config_err)?
            .set_default(
                "database.max_connections",
                defaults.database.max_connections as i64,
            )
            .map_err(config_err)?
            .set_default("database.timeout_ms", defaults.database.timeout_ms as i64)
            .map_err(config_err)?
            .set_default("database.run_migrations", defaults.database.run_migrations)
            .map_err(config_err)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_err)?
            .set_default("logging.level", defaults.logging.level)
            .map_err(config_err)?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("KEYGATE_SERVER_HOST").ok())
            .map_err(config_err)?
            .set_override_option("server.port", env_i64("KEYGATE_SERVER_PORT"))
            .map_err(config_err)?
            .set_override_option(
                "license.key_prefix",
                env::var("KEYGATE_LICENSE_KEY_PREFIX").ok(),
            )
            .map_err(config_err)?
            .set_override_option("license.key_length", env_i64("KEYGATE_LICENSE_KEY_LENGTH"))
            .map_err(config_err)?
            .set_override_option(
                "license.max_key_attempts",
                env_i64("KEYGATE_MAX_KEY_ATTEMPTS"),
            )
            .map_err(config_err)?
            .set_override_option("database.db_type", env::var("KEYGATE_DATABASE_TYPE").ok())
            .map_err(config_err)?
            .set_override_option(
                "database.sqlite_url",
                env::var("KEYGATE_DATABASE_URL")
                    .ok()
                    .filter(|url| url.starts_with("sqlite")),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.postgres_url",
                env::var("KEYGATE_DATABASE_URL")
                    .ok()
                    .filter(|url| url.starts_with("postgres")),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.timeout_ms",
                env_i64("KEYGATE_DATABASE_TIMEOUT_MS"),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env::var("KEYGATE_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("KEYGATE_LOG_LEVEL").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| LicenseError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.server.port == 0 {
            return Err(LicenseError::ConfigError(
                "server.port must be greater than 0".to_string(),
            ));
        }

        match self.database.db_type.as_str() {
            "sqlite" | "postgres" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "database.db_type must be 'sqlite' or 'postgres', got '{other}'"
                )));
            }
        }
        if self.database.timeout_ms == 0 {
            return Err(LicenseError::ConfigError(
                "database.timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(LicenseError::ConfigError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        if self.license.key_prefix.is_empty() {
            return Err(LicenseError::ConfigError(
                "license.key_prefix cannot be empty".to_string(),
            ));
        }
        if !(4..=32).contains(&self.license.key_length) {
            return Err(LicenseError::ConfigError(format!(
                "license.key_length must be between 4 and 32, got {}",
                self.license.key_length
            )));
        }
        if self.license.max_key_attempts == 0 {
            return Err(LicenseError::ConfigError(
                "license.max_key_attempts must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

fn env_i64(name: &str) -> Option<i64> {
    env::var(name).ok().and_then(|v| v.parse::<i64>().ok())
}

/// Get the global configuration.
///
/// Loads and validates on first access, then returns the cached value.
pub fn get_config() -> LicenseResult<&'static KeygateConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = KeygateConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid.
    Ok(CONFIG.get_or_init(|| config))
}

/// Initialize configuration explicitly so errors surface at startup.
pub fn init_config() -> LicenseResult<&'static KeygateConfig> {
    get_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = KeygateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.license.key_prefix, "KEY");
        assert_eq!(config.license.key_length, 8);
        assert_eq!(config.database.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_db_type() {
        let mut config = KeygateConfig::default();
        config.database.db_type = "mysql".to_string();
        assert!(matches!(
            config.validate(),
            Err(LicenseError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_bad_key_settings() {
        let mut config = KeygateConfig::default();
        config.license.key_length = 2;
        assert!(config.validate().is_err());

        let mut config = KeygateConfig::default();
        config.license.max_key_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = KeygateConfig::default();
        config.license.key_prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout_and_bad_level() {
        let mut config = KeygateConfig::default();
        config.database.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = KeygateConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
