//! Entity record — a sensor as the host platform stores it.
//!
//! The host keeps one record per `(platform, domain, unique_id)`. It is both
//! the entity index consulted by discovery and the snapshot restored at boot.

mod attribute_value;
mod state;

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::DeviceIdentifier;
use crate::sensor::SensorEntity;
use crate::time::{Timestamp, now};

/// Host domain every sensor entity lives in.
pub const BINARY_SENSOR_DOMAIN: &str = "binary_sensor";

/// Platform name sensebridge registers its entities under.
pub const PLATFORM: &str = "sensebridge";

/// Key of the host's entity index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIndexKey {
    pub domain: String,
    pub platform: String,
    pub unique_id: DeviceIdentifier,
}

impl EntityIndexKey {
    /// Index key for a sensor owned by this bridge.
    #[must_use]
    pub fn sensor(unique_id: DeviceIdentifier) -> Self {
        Self {
            domain: BINARY_SENSOR_DOMAIN.to_string(),
            platform: PLATFORM.to_string(),
            unique_id,
        }
    }
}

/// A stored host entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Host-facing id, e.g. `binary_sensor.sensebridge_aabbccdd`.
    pub entity_id: String,
    pub unique_id: DeviceIdentifier,
    pub platform: String,
    pub domain: String,
    pub state: EntityState,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl EntityRecord {
    /// Build the record the host stores for a sensor.
    #[must_use]
    pub fn from_sensor(sensor: &SensorEntity) -> Self {
        let ts = now();
        let key = EntityIndexKey::sensor(sensor.identifier().clone());
        Self {
            entity_id: format!("{}.{}_{}", key.domain, key.platform, key.unique_id.slug()),
            unique_id: key.unique_id,
            platform: key.platform,
            domain: key.domain,
            state: sensor.host_state(),
            attributes: sensor.attributes(),
            last_changed: ts,
            last_updated: ts,
        }
    }

    /// Fold a newer record into this one, keeping `last_changed` when the
    /// state did not change.
    pub fn merge(&mut self, newer: Self) {
        if self.state != newer.state {
            self.last_changed = newer.last_updated;
        }
        self.state = newer.state;
        self.attributes = newer.attributes;
        self.last_updated = newer.last_updated;
    }

    #[must_use]
    pub fn index_key(&self) -> EntityIndexKey {
        EntityIndexKey {
            domain: self.domain.clone(),
            platform: self.platform.clone(),
            unique_id: self.unique_id.clone(),
        }
    }
}
