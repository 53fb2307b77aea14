use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::assignment::AssignmentEngine;
use crate::config::LicenseConfig;
use crate::errors::LicenseError;
use crate::protocol::{VerifyRequest, VerifyResponse};
use crate::server::logging::{
    log_license_binding_event, log_license_event, HealthResponse, LicenseEvent,
};
use crate::store::LicenseStore;
use crate::verification::{VerificationEngine, VerificationOutcome};

pub const MISSING_FIELDS_MESSAGE: &str = "Missing key or hwid";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LicenseStore>,
    pub verifier: VerificationEngine,
    pub assigner: Arc<AssignmentEngine>,
}

impl AppState {
    /// State with the default key shape.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self::with_license_config(store, &LicenseConfig::default())
    }

    pub fn with_license_config(store: Arc<dyn LicenseStore>, config: &LicenseConfig) -> Self {
        let assigner = AssignmentEngine::from_config(store.clone(), config);
        Self::with_assigner(store, assigner)
    }

    /// State around a prepared assignment engine (custom key generator).
    pub fn with_assigner(store: Arc<dyn LicenseStore>, assigner: AssignmentEngine) -> Self {
        Self {
            verifier: VerificationEngine::new(store.clone()),
            assigner: Arc::new(assigner),
            store,
        }
    }
}

/// Failures of the verification endpoint.
///
/// Business outcomes are never errors here; only malformed input (400) and
/// store failures (500) leave the 200 path.
#[derive(Debug)]
pub enum VerifyError {
    BadRequest,
    Internal,
}

impl From<LicenseError> for VerifyError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::BadRequest(_) => VerifyError::BadRequest,
            other => {
                error!(error = %other, "verification failed");
                VerifyError::Internal
            }
        }
    }
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            VerifyError::BadRequest => (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE),
            VerifyError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE),
        };
        (status, Json(VerifyResponse::failure(message))).into_response()
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `POST /api/verify`
///
/// Unknown keys, inactive or expired licenses and device mismatches are
/// all answered with 200 and `valid: false`.
pub async fn verify_handler(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, VerifyError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "unreadable verify request");
            return Err(VerifyError::BadRequest);
        }
    };

    let (Some(key), Some(hwid)) = (required(request.key), required(request.hwid)) else {
        return Err(VerifyError::BadRequest);
    };

    let outcome = state.verifier.verify(&key, &hwid).await?;

    match &outcome {
        VerificationOutcome::Activated { .. } => {
            log_license_binding_event(LicenseEvent::Activated, &key, &hwid)
        }
        VerificationOutcome::Valid { .. } => log_license_event(LicenseEvent::Validated, &key, None),
        failed => log_license_event(
            LicenseEvent::ValidationFailed,
            &key,
            Some(&failed.message()),
        ),
    }

    Ok(Json(VerifyResponse::from(&outcome)))
}

/// `GET /health`
///
/// Always 200; an unreachable store is reported as `degraded`.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "store ping failed");
            false
        }
    };
    Json(HealthResponse::new(connected, state.store.backend()))
}
