//! Request logging, license audit events and the health payload.
//!
//! # Usage
//!
//! ```rust,ignore
//! use axum::middleware;
//! use keygate::server::logging::request_logging_middleware;
//!
//! let app = Router::new()
//!     .route("/health", get(health_handler))
//!     .layer(middleware::from_fn(request_logging_middleware));
//! ```

use std::str::FromStr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Response},
    middleware::Next,
};
use tracing::{info, info_span, warn, Instrument, Level};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::errors::{LicenseError, LicenseResult};
use crate::license_key::redact_key;

/// License state change event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseEvent {
    /// A new license was issued to an owner
    Created,
    /// An existing license was extended or reset
    Renewed,
    /// A device was bound on first verification
    Activated,
    /// Verification succeeded for the bound device
    Validated,
    /// Verification returned a negative outcome
    ValidationFailed,
    /// An operator cleared the bound device
    Unlinked,
    /// An operator changed the stored status
    StatusChanged,
}

impl LicenseEvent {
    /// Events raised by `/api/verify`, where the key is a client credential.
    pub fn from_client(self) -> bool {
        matches!(
            self,
            LicenseEvent::Activated | LicenseEvent::Validated | LicenseEvent::ValidationFailed
        )
    }
}

/// Key as it should appear in a log line for `event`.
fn logged_key(event: LicenseEvent, key: &str) -> String {
    if event.from_client() {
        redact_key(key)
    } else {
        key.to_string()
    }
}

impl std::fmt::Display for LicenseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LicenseEvent::Created => "created",
            LicenseEvent::Renewed => "renewed",
            LicenseEvent::Activated => "activated",
            LicenseEvent::Validated => "validated",
            LicenseEvent::ValidationFailed => "validation_failed",
            LicenseEvent::Unlinked => "unlinked",
            LicenseEvent::StatusChanged => "status_changed",
        };
        write!(f, "{}", s)
    }
}

/// Log a license state change event.
///
/// `key` is the key code. Keys presented by clients are shortened before
/// logging; admin events keep the full key. Failed validations log at warn
/// level.
pub fn log_license_event(event: LicenseEvent, key: &str, details: Option<&str>) {
    let key = logged_key(event, key);
    let span = info_span!("license_event", event = %event, key = %key);
    let _enter = span.enter();

    match (event, details) {
        (LicenseEvent::ValidationFailed, Some(d)) => warn!(reason = %d, "License event occurred"),
        (LicenseEvent::ValidationFailed, None) => warn!("License event occurred"),
        (_, Some(d)) => info!(details = %d, "License event occurred"),
        (_, None) => info!("License event occurred"),
    }
}

/// Log a device binding. The only place a hardware id reaches the logs.
pub fn log_license_binding_event(event: LicenseEvent, key: &str, hardware_id: &str) {
    let key = logged_key(event, key);
    let span = info_span!(
        "license_binding",
        event = %event,
        key = %key,
        hardware_id = %hardware_id,
    );
    let _enter = span.enter();
    info!("License binding event occurred");
}

/// Header name for the request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Logging middleware that tracks request timing and generates request IDs.
///
/// Each request gets a span carrying a fresh UUID, method and path; the
/// completion line records status and duration, and the id is echoed back
/// in the `X-Request-Id` response header.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = generate_request_id();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let start = Instant::now();
    let response = async move {
        info!("Started processing request");
        next.run(request).await
    }
    .instrument(span.clone())
    .await;

    let duration = start.elapsed();
    let status = response.status();

    span.in_scope(|| {
        info!(
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        )
    });

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    Response::from_parts(parts, body)
}

/// Max level for the fmt subscriber. Disabled logging still lets warnings
/// and errors through.
pub fn log_level(config: &LoggingConfig) -> LicenseResult<Level> {
    if !config.enabled {
        return Ok(Level::WARN);
    }
    Level::from_str(&config.level)
        .map_err(|_| LicenseError::ConfigError(format!("unknown log level '{}'", config.level)))
}

/// Install the global fmt subscriber. A second call is a no-op.
pub fn init_tracing(config: &LoggingConfig) -> LicenseResult<()> {
    let level = log_level(config)?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    Ok(())
}

/// Health check response structure.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub service: String,
    pub version: String,
    pub store: StoreHealth,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoreHealth {
    pub connected: bool,
    /// sqlite, postgres or memory
    pub backend: String,
}

impl HealthResponse {
    pub fn new(store_connected: bool, backend: &str) -> Self {
        Self {
            status: if store_connected { "healthy" } else { "degraded" }.to_string(),
            service: "keygate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: StoreHealth {
                connected: store_connected,
                backend: backend.to_string(),
            },
        }
    }
}
