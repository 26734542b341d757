//! Event — an immutable record of something the bridge told the host.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceIdentifier, EventId};
use crate::time::{Timestamp, now};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A sensor entity was registered with the host.
    EntityAdded,
    /// A registered sensor entity was refreshed.
    StateChanged,
    /// A user-facing notification (e.g. a sensor was paired).
    Notification,
}

/// A published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub unique_id: Option<DeviceIdentifier>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(
        event_type: EventType,
        unique_id: Option<DeviceIdentifier>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            unique_id,
            data,
            timestamp: now(),
        }
    }
}
