//! Server-side components for Keygate.
//!
//! This module contains:
//! - `database`    → sqlx-backed `LicenseStore` over SQLite/Postgres
//! - `handlers`    → verification endpoint and health check
//! - `admin`       → assignment and device administration (requires `admin-api` feature)
//! - `api_error`   → error envelope of the admin endpoints
//! - `logging`     → request middleware, license audit events, tracing setup
//! - `routes`      → router builder
//! - `validation`  → request validation utilities

pub mod api_error;
pub mod database;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod validation;

#[cfg(feature = "admin-api")]
pub mod admin;

pub use api_error::{ApiError, ErrorCode};
pub use database::Database;
pub use handlers::{health_handler, verify_handler, AppState, VerifyError};
pub use routes::build_router;

#[cfg(feature = "admin-api")]
pub use admin::{
    assign_package_handler, get_owner_license_handler, list_devices_handler,
    list_packages_handler, set_status_handler, unlink_device_handler, AssignPackageRequest,
    AssignPackageResponse, LicenseResponse, ListDevicesResponse, ListPackagesResponse,
    SetStatusRequest, SetStatusResponse, UnlinkDeviceResponse,
};

pub use validation::{
    validate_length, validate_license_id, validate_not_empty, validate_owner_id,
    validate_package_id, validate_status, ValidationError, ValidationResult,
};
