//! Keygate - hardware-locked license keys for time-limited packages.
//!
//! # Features
//!
//! - `server` - HTTP handlers and the sqlx-backed store. Enabled by default.
//! - `sqlite` - SQLite database backend. Enabled by default.
//! - `postgres` - PostgreSQL database backend.
//! - `admin-api` - Administrative routes (assignment, device unlink, status flips).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keygate::store::MemoryStore;
//! use keygate::verification::VerificationEngine;
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = VerificationEngine::new(store);
//! let outcome = engine.verify("KEY-3F9A0C7E", "device-fingerprint").await?;
//! println!("{}", outcome.message());
//! ```

// Core modules (always available)
pub mod assignment;
pub mod config;
pub mod errors;
pub mod hardware;
pub mod license;
pub mod license_key;
pub mod protocol;
pub mod store;
pub mod verification;

// Client-side helpers (always available)
pub mod client {
    pub mod verify;

    pub use verify::VerifyClient;
}

// Server-related modules (requires "server" feature)
#[cfg(feature = "server")]
#[path = "server/mod.rs"]
pub mod server;
