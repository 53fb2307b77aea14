//! License key generation and format checks.
//!
//! Keys look like `KEY-3F9A0C7E`: a configurable prefix followed by a block
//! of upper-case hex drawn from the thread-local CSPRNG. The block is short
//! enough that collisions are possible at scale, so callers inserting keys
//! must detect duplicates and regenerate (see [`crate::assignment`]).

use rand::Rng;

use crate::config::LicenseConfig;

/// Character set for the random block. Upper-case hex keeps keys
/// compatible with ones cut from a UUID.
const LICENSE_KEY_CHARSET: &[u8] = b"0123456789ABCDEF";

/// Shape of generated keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseKeyConfig {
    pub prefix: String,
    /// Number of random characters after the prefix
    pub length: u8,
}

impl Default for LicenseKeyConfig {
    fn default() -> Self {
        Self {
            prefix: "KEY".to_string(),
            length: 8,
        }
    }
}

impl From<&LicenseConfig> for LicenseKeyConfig {
    fn from(config: &LicenseConfig) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            length: config.key_length,
        }
    }
}

/// Source of candidate key codes.
///
/// Uniqueness is not promised; only unpredictability.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl KeyGenerator for LicenseKeyConfig {
    fn generate(&self) -> String {
        generate_license_key(self)
    }
}

impl<F> KeyGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Generate a key with the given configuration.
pub fn generate_license_key(config: &LicenseKeyConfig) -> String {
    let mut rng = rand::rng();
    let block: String = (0..config.length)
        .map(|_| {
            let idx = rng.random_range(0..LICENSE_KEY_CHARSET.len());
            LICENSE_KEY_CHARSET[idx] as char
        })
        .collect();

    format!("{}-{}", config.prefix, block)
}

/// Shortened key for log lines. At most half of the key, capped at eight
/// characters, is kept.
pub fn redact_key(key: &str) -> String {
    let visible = (key.chars().count() / 2).min(8);
    let shown: String = key.chars().take(visible).collect();
    format!("{shown}***")
}

/// Check that a key matches `PREFIX-<length hex chars>`.
pub fn validate_license_key_format(key: &str, config: &LicenseKeyConfig) -> bool {
    let Some(block) = key
        .strip_prefix(config.prefix.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    block.len() == config.length as usize
        && block.bytes().all(|b| LICENSE_KEY_CHARSET.contains(&b))
}
