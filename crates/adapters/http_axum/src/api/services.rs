//! Service calls.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use sensebridge_app::discovery::DiscoveryOutcome;

use crate::error::ApiError;
use crate::state::AppState;

pub enum ScanResponse {
    Completed(Json<DiscoveryOutcome>),
    Busy(Json<DiscoveryOutcome>),
}

impl IntoResponse for ScanResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Completed(json) => json.into_response(),
            Self::Busy(json) => (StatusCode::CONFLICT, json).into_response(),
        }
    }
}

/// `POST /api/services/scan`
///
/// Blocks until the scan completes or times out. Every outcome is reported
/// with `200 OK`, except a concurrent request which gets `409 Conflict`.
///
/// # Errors
///
/// Returns [`ApiError::Unavailable`] when no bridge session is running.
pub async fn scan(State(state): State<AppState>) -> Result<ScanResponse, ApiError> {
    let discovery = &super::session(&state)?.discovery;
    let outcome = discovery.run().await;
    Ok(match outcome {
        DiscoveryOutcome::Busy => ScanResponse::Busy(Json(outcome)),
        outcome => ScanResponse::Completed(Json(outcome)),
    })
}
