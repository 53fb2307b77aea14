//! Administrative handlers: package assignment and device management.
//!
//! These routes are meant for a trusted internal surface (operator tools,
//! payment webhooks) and carry no authentication of their own.
//!
//! # Endpoints
//!
//! - `POST /api/v1/owners/{owner_id}/assignments` - Grant or renew a package
//! - `GET /api/v1/owners/{owner_id}/license` - Current license of an owner
//! - `POST /api/v1/licenses/{license_id}/unlink` - Clear the bound device
//! - `POST /api/v1/licenses/{license_id}/status` - Change the stored status
//! - `GET /api/v1/packages` - Active package catalog
//! - `GET /api/v1/devices?owner_id={id}` - Active licenses with a bound device

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::LicenseError;
use crate::license::{License, LicenseStatus, Package};
use crate::server::api_error::{ApiError, ErrorCode};
use crate::server::handlers::AppState;
use crate::server::logging::{log_license_event, LicenseEvent};
use crate::server::validation::{
    validate_license_id, validate_owner_id, validate_package_id, validate_status,
};
use crate::store::OwnerLicense;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AssignPackageRequest {
    pub package_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignPackageResponse {
    pub license_id: String,
    pub key_code: String,
    pub end_date: DateTime<Utc>,
    /// `false` when a new license was issued.
    pub renewed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LicenseResponse {
    pub license_id: String,
    pub owner_id: String,
    pub package_id: i64,
    pub key_code: String,
    pub status: LicenseStatus,
    pub is_bound: bool,
    pub hardware_id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub expired: bool,
}

impl LicenseResponse {
    fn at(license: License, now: NaiveDateTime) -> Self {
        Self {
            is_bound: license.is_bound(),
            expired: license.is_expired_at(now),
            license_id: license.id,
            owner_id: license.owner_id,
            package_id: license.package_id,
            key_code: license.key_code,
            status: license.status,
            hardware_id: license.hardware_id.filter(|h| !h.is_empty()),
            start_date: license.start_date.and_utc(),
            end_date: license.end_date.and_utc(),
        }
    }
}

impl From<License> for LicenseResponse {
    fn from(license: License) -> Self {
        Self::at(license, Utc::now().naive_utc())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnlinkDeviceResponse {
    pub license_id: String,
    /// Device seen by the read just before the unlink. A bind landing
    /// between that read and the clear is wiped but not reported here.
    pub previous_hardware_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetStatusResponse {
    pub license_id: String,
    pub previous_status: LicenseStatus,
    pub status: LicenseStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListPackagesResponse {
    pub packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
pub struct ListDevicesQuery {
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub license_id: String,
    pub owner_id: String,
    pub key_code: String,
    pub hardware_id: String,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListDevicesResponse {
    pub devices: Vec<DeviceSummary>,
    pub total: usize,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            ApiError::with_message(ErrorCode::InvalidRequest, rejection.body_text())
        })
}

async fn existing_license(state: &AppState, license_id: &str) -> Result<License, ApiError> {
    validate_license_id(license_id, "license_id")?;
    state
        .store
        .find_license(license_id)
        .await?
        .ok_or_else(|| LicenseError::LicenseNotFound(license_id.to_string()).into())
}

// ============================================================================
// Handlers
// ============================================================================

/// Grant `package_id` to an owner, stacking onto a live license.
///
/// `POST /api/v1/owners/{owner_id}/assignments`
///
/// Answers 201 when a license was created and 200 when one was renewed.
pub async fn assign_package_handler(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    payload: Result<Json<AssignPackageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssignPackageResponse>), ApiError> {
    validate_owner_id(&owner_id, "owner_id")?;
    let package_id = json_body(payload)?
        .package_id
        .ok_or_else(|| ApiError::missing_field("package_id"))?;
    validate_package_id(package_id, "package_id")?;

    let result = state.assigner.assign_package(&owner_id, package_id).await?;

    let (event, status) = if result.renewed {
        (LicenseEvent::Renewed, StatusCode::OK)
    } else {
        (LicenseEvent::Created, StatusCode::CREATED)
    };
    let details = format!(
        "owner={} package={} end={}",
        owner_id, package_id, result.end_date
    );
    log_license_event(event, &result.key_code, Some(&details));

    Ok((
        status,
        Json(AssignPackageResponse {
            license_id: result.license_id,
            key_code: result.key_code,
            end_date: result.end_date.and_utc(),
            renewed: result.renewed,
        }),
    ))
}

/// `GET /api/v1/owners/{owner_id}/license`
pub async fn get_owner_license_handler(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<LicenseResponse>, ApiError> {
    validate_owner_id(&owner_id, "owner_id")?;

    match state.store.find_license_by_owner(&owner_id).await? {
        OwnerLicense::One(license) => Ok(Json(license.into())),
        OwnerLicense::None => Err(ApiError::with_details(
            ErrorCode::LicenseNotFound,
            format!("owner {} has no license", owner_id),
            serde_json::json!({ "owner_id": owner_id }),
        )),
        OwnerLicense::Ambiguous { count } => {
            Err(LicenseError::AmbiguousLicenseState { owner_id, count }.into())
        }
    }
}

/// Clear the device bound to a license so the next verification rebinds.
///
/// The lookup and the clear are separate store calls, so
/// `previous_hardware_id` is a snapshot and may be stale under a racing bind.
///
/// `POST /api/v1/licenses/{license_id}/unlink`
pub async fn unlink_device_handler(
    State(state): State<AppState>,
    Path(license_id): Path<String>,
) -> Result<Json<UnlinkDeviceResponse>, ApiError> {
    let license = existing_license(&state, &license_id).await?;

    if !state.store.unlink_hardware_id(&license_id).await? {
        return Err(LicenseError::LicenseNotFound(license_id).into());
    }

    let previous_hardware_id = license.hardware_id.filter(|h| !h.is_empty());
    info!(
        license_id = %license_id,
        was_bound = previous_hardware_id.is_some(),
        "device unlinked"
    );
    log_license_event(LicenseEvent::Unlinked, &license.key_code, None);

    Ok(Json(UnlinkDeviceResponse {
        license_id,
        previous_hardware_id,
    }))
}

/// `POST /api/v1/licenses/{license_id}/status`
pub async fn set_status_handler(
    State(state): State<AppState>,
    Path(license_id): Path<String>,
    payload: Result<Json<SetStatusRequest>, JsonRejection>,
) -> Result<Json<SetStatusResponse>, ApiError> {
    let raw = json_body(payload)?
        .status
        .ok_or_else(|| ApiError::missing_field("status"))?;
    let status = validate_status(&raw, "status")?;
    let license = existing_license(&state, &license_id).await?;

    if !state.store.set_license_status(&license_id, status).await? {
        return Err(LicenseError::LicenseNotFound(license_id).into());
    }

    let details = format!("{} -> {}", license.status, status);
    log_license_event(LicenseEvent::StatusChanged, &license.key_code, Some(&details));

    Ok(Json(SetStatusResponse {
        license_id,
        previous_status: license.status,
        status,
    }))
}

/// `GET /api/v1/packages`
pub async fn list_packages_handler(
    State(state): State<AppState>,
) -> Result<Json<ListPackagesResponse>, ApiError> {
    let packages = state.store.list_active_packages().await?;
    Ok(Json(ListPackagesResponse { packages }))
}

/// `GET /api/v1/devices`
pub async fn list_devices_handler(
    State(state): State<AppState>,
    Query(query): Query<ListDevicesQuery>,
) -> Result<Json<ListDevicesResponse>, ApiError> {
    let owner_id = query.owner_id.filter(|o| !o.trim().is_empty());
    if let Some(owner) = owner_id.as_deref() {
        validate_owner_id(owner, "owner_id")?;
    }

    let devices: Vec<DeviceSummary> = state
        .store
        .list_bound_licenses(owner_id.as_deref())
        .await?
        .into_iter()
        .filter_map(|license| {
            let hardware_id = license.hardware_id.filter(|h| !h.is_empty())?;
            Some(DeviceSummary {
                license_id: license.id,
                owner_id: license.owner_id,
                key_code: license.key_code,
                hardware_id,
                end_date: license.end_date.and_utc(),
            })
        })
        .collect();

    Ok(Json(ListDevicesResponse {
        total: devices.len(),
        devices,
    }))
}
