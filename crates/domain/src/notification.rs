//! Notification — a persistent message surfaced to the user by the host.

use serde::{Deserialize, Serialize};

use crate::driver::SensorType;
use crate::id::{DeviceIdentifier, NotificationId};

/// Title used for every notification this bridge raises.
pub const NOTIFICATION_TITLE: &str = "sensebridge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Notification raised when a scan pairs a new sensor.
    #[must_use]
    pub fn sensor_detected(mac: &DeviceIdentifier, sensor_type: &SensorType) -> Self {
        Self {
            id: NotificationId::new(),
            title: NOTIFICATION_TITLE.to_string(),
            message: format!("Sensor detected: MAC={mac}, Type={sensor_type}"),
        }
    }
}
