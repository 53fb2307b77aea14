use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

use crate::server::handlers::{health_handler, verify_handler, AppState};
use crate::server::logging::request_logging_middleware;

#[cfg(feature = "admin-api")]
use crate::server::admin::{
    assign_package_handler, get_owner_license_handler, list_devices_handler,
    list_packages_handler, set_status_handler, unlink_device_handler,
};

/// Build the application router.
///
/// # Routes
///
/// - `POST /api/verify` - Verify (and on first use, activate) a key for a device
/// - `GET /health` - Store reachability
///
/// ## Admin endpoints (requires `admin-api` feature)
/// - `POST /api/v1/owners/{owner_id}/assignments` - Grant or renew a package
/// - `GET /api/v1/owners/{owner_id}/license` - Current license of an owner
/// - `POST /api/v1/licenses/{license_id}/unlink` - Clear the bound device
/// - `POST /api/v1/licenses/{license_id}/status` - Change the stored status
/// - `GET /api/v1/packages` - Active packages
/// - `GET /api/v1/devices` - Bound devices, optionally `?owner_id=`
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/verify", post(verify_handler))
        .route("/health", get(health_handler));

    #[cfg(feature = "admin-api")]
    let router = router
        .route(
            "/api/v1/owners/:owner_id/assignments",
            post(assign_package_handler),
        )
        .route(
            "/api/v1/owners/:owner_id/license",
            get(get_owner_license_handler),
        )
        .route(
            "/api/v1/licenses/:license_id/unlink",
            post(unlink_device_handler),
        )
        .route(
            "/api/v1/licenses/:license_id/status",
            post(set_status_handler),
        )
        .route("/api/v1/packages", get(list_packages_handler))
        .route("/api/v1/devices", get(list_devices_handler));

    router
        .layer(ServiceBuilder::new().layer(middleware::from_fn(request_logging_middleware)))
        .with_state(state)
}
