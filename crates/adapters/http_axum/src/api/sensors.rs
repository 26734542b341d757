//! JSON handlers for the sensor registry.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use sensebridge_domain::entity::AttributeValue;
use sensebridge_domain::error::{BridgeError, NotFoundError};
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::sensor::{DeviceClass, SensorEntity};

use crate::error::ApiError;
use crate::state::AppState;

/// Wire representation of a sensor.
#[derive(Debug, Serialize)]
pub struct SensorView {
    pub mac: DeviceIdentifier,
    pub is_on: bool,
    pub available: bool,
    pub device_class: Option<DeviceClass>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl From<SensorEntity> for SensorView {
    fn from(sensor: SensorEntity) -> Self {
        Self {
            attributes: sensor.attributes(),
            mac: sensor.identifier().clone(),
            is_on: sensor.is_on(),
            available: sensor.is_available(),
            device_class: sensor.device_class(),
        }
    }
}

pub enum ListResponse {
    Ok(Json<Vec<SensorView>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

pub enum GetResponse {
    Ok(Json<SensorView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/sensors`
pub async fn list(State(state): State<AppState>) -> Result<ListResponse, ApiError> {
    let sensors = super::session(&state)?.handle.entities().await?;
    Ok(ListResponse::Ok(Json(
        sensors.into_iter().map(SensorView::from).collect(),
    )))
}

/// `GET /api/sensors/{mac}`
pub async fn get(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> Result<GetResponse, ApiError> {
    let session = super::session(&state)?;
    let mac = DeviceIdentifier::parse(mac).map_err(BridgeError::from)?;
    let sensor = session.handle.entity(&mac).await?.ok_or_else(|| {
        BridgeError::from(NotFoundError {
            entity: "Sensor",
            id: mac.to_string(),
        })
    })?;
    Ok(GetResponse::Ok(Json(sensor.into())))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::router::build;
    use crate::testing::{body_json, offline_state, running_state, state_event};

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn should_list_sensors_ordered_by_identifier() {
        let harness = running_state();
        let sink = harness.handle.event_sink();
        sink.on_event(state_event("BBBBBBBB", 0x01, "open"));
        sink.on_event(state_event("AABBCCDD", 0x02, "active"));

        let response = build(harness.state).oneshot(get("/api/sensors")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["mac"], "AABBCCDD");
        assert_eq!(body[0]["device_class"], "motion");
        assert_eq!(body[0]["attributes"]["rssi"], -40);
        assert_eq!(body[1]["mac"], "BBBBBBBB");
        assert_eq!(body[1]["is_on"], true);
    }

    #[tokio::test]
    async fn should_return_single_sensor() {
        let harness = running_state();
        harness
            .handle
            .event_sink()
            .on_event(state_event("AABBCCDD", 0x01, "close"));

        let response = build(harness.state)
            .oneshot(get("/api/sensors/AABBCCDD"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["is_on"], false);
        assert_eq!(body["available"], true);
        assert_eq!(body["attributes"]["battery_level"], 80);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_sensor() {
        let harness = running_state();

        let response = build(harness.state)
            .oneshot(get("/api/sensors/AABBCCDD"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_reject_malformed_identifier() {
        let harness = running_state();

        let response = build(harness.state)
            .oneshot(get("/api/sensors/AABB"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_unavailable_without_session() {
        let response = build(offline_state())
            .oneshot(get("/api/sensors"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
