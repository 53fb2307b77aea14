//! Device fingerprint used as the `hwid` in verification requests.
//!
//! Platform identifiers are collected per OS, joined, and hashed with
//! SHA-256 so the raw machine identifiers never leave the device.

use sha2::{Digest, Sha256};

#[cfg(target_os = "linux")]
#[path = "hardware/linux.rs"]
mod platform;

#[cfg(target_os = "macos")]
#[path = "hardware/macos.rs"]
mod platform;

#[cfg(target_os = "windows")]
#[path = "hardware/windows.rs"]
mod platform;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod platform {
    pub fn machine_identifiers() -> Vec<String> {
        Vec::new()
    }
}

/// Stable fingerprint for the current machine, as 64 lowercase hex chars.
///
/// Falls back to the host name when the platform exposes no identifier.
pub fn get_hardware_id() -> String {
    let mut parts = platform::machine_identifiers();
    if parts.is_empty() {
        parts.push(fallback_identifier());
    }
    fingerprint(&parts)
}

/// Hash identifier parts into a fingerprint. Order matters.
pub fn fingerprint<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().trim().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn fallback_identifier() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_id_is_stable_hex() {
        let first = get_hardware_id();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, get_hardware_id());
    }

    #[test]
    fn fingerprint_separates_parts() {
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
        assert_eq!(fingerprint(&[" ab\n"]), fingerprint(&["ab"]));
    }
}
