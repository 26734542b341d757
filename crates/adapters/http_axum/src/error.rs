//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use sensebridge_app::coordinator::CoordinatorStopped;
use sensebridge_domain::error::BridgeError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps handler failures to an HTTP response with appropriate status code.
pub enum ApiError {
    Bridge(BridgeError),
    /// No bridge session is running.
    Unavailable,
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self::Bridge(err)
    }
}

impl From<CoordinatorStopped> for ApiError {
    fn from(_: CoordinatorStopped) -> Self {
        Self::Unavailable
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Bridge(BridgeError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Bridge(BridgeError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Bridge(BridgeError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "sensebridge session is not running".to_string(),
            ),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
