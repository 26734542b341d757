//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod sensors;
pub mod services;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use crate::error::ApiError;
use crate::state::{AppState, SessionState};

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sensors", get(sensors::list))
        .route("/sensors/{mac}", get(sensors::get))
        .route("/services/scan", post(services::scan))
        .route("/events/stream", get(sse::stream))
}

fn session(state: &AppState) -> Result<&SessionState, ApiError> {
    state.session.as_ref().ok_or(ApiError::Unavailable)
}
