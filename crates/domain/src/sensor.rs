//! Sensor entity — the in-memory representation of one paired sensor.
//!
//! A [`SensorEntity`] is a fixed-shape record. Fields that are only known once
//! the sensor has been heard from (class, signal, battery) are optional.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{AttributeValue, EntityState};
use crate::error::ValidationError;
use crate::id::DeviceIdentifier;

/// What a binary sensor detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Door,
    Motion,
}

impl DeviceClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Motion => "motion",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized state report, ready to be applied to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub is_on: bool,
    pub device_class: DeviceClass,
    /// Signal strength, already negated (dBm-style).
    pub rssi: i32,
    pub battery_level: u8,
}

/// Forced startup state for a placeholder entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialState {
    On,
    Off,
}

impl std::str::FromStr for InitialState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(ValidationError::InitialState(other.to_string())),
        }
    }
}

/// One physical sensor as seen by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEntity {
    identifier: DeviceIdentifier,
    available: bool,
    is_on: bool,
    device_class: Option<DeviceClass>,
    rssi: Option<i32>,
    battery_level: Option<u8>,
}

impl SensorEntity {
    /// A persisted sensor we have not heard from yet this session.
    #[must_use]
    pub fn placeholder(identifier: DeviceIdentifier) -> Self {
        Self {
            identifier,
            available: false,
            is_on: false,
            device_class: None,
            rssi: None,
            battery_level: None,
        }
    }

    /// A sensor that was just paired through a scan.
    #[must_use]
    pub fn discovered(identifier: DeviceIdentifier, device_class: DeviceClass) -> Self {
        Self {
            identifier,
            available: true,
            is_on: false,
            device_class: Some(device_class),
            rssi: None,
            battery_level: None,
        }
    }

    /// A sensor first seen through a live state report.
    #[must_use]
    pub fn from_reading(identifier: DeviceIdentifier, reading: SensorReading) -> Self {
        let mut entity = Self::placeholder(identifier);
        entity.apply_reading(reading);
        entity
    }

    /// Overwrite every live field from a state report. Marks the sensor available.
    pub fn apply_reading(&mut self, reading: SensorReading) {
        self.available = true;
        self.is_on = reading.is_on;
        self.device_class = Some(reading.device_class);
        self.rssi = Some(reading.rssi);
        self.battery_level = Some(reading.battery_level.min(100));
    }

    /// Overwrite binary state and availability from a host snapshot.
    pub fn restore(&mut self, snapshot: &EntityState) {
        self.is_on = matches!(snapshot, EntityState::On);
        self.available = snapshot.is_available();
    }

    /// Force the binary state (startup override).
    pub fn force_state(&mut self, state: InitialState) {
        self.is_on = state == InitialState::On;
    }

    #[must_use]
    pub fn identifier(&self) -> &DeviceIdentifier {
        &self.identifier
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    #[must_use]
    pub fn device_class(&self) -> Option<DeviceClass> {
        self.device_class
    }

    #[must_use]
    pub fn rssi(&self) -> Option<i32> {
        self.rssi
    }

    #[must_use]
    pub fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    /// State as the host platform records it.
    #[must_use]
    pub fn host_state(&self) -> EntityState {
        match (self.available, self.is_on) {
            (false, _) => EntityState::Unavailable,
            (true, true) => EntityState::On,
            (true, false) => EntityState::Off,
        }
    }

    /// Every stored field except the binary state, which is exposed through
    /// [`is_on`](Self::is_on). Unknown optional fields are omitted.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<String, AttributeValue> {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "mac".to_string(),
            AttributeValue::String(self.identifier.to_string()),
        );
        attributes.insert("available".to_string(), AttributeValue::Bool(self.available));
        if let Some(class) = self.device_class {
            attributes.insert(
                "device_class".to_string(),
                AttributeValue::String(class.to_string()),
            );
        }
        if let Some(rssi) = self.rssi {
            attributes.insert("rssi".to_string(), AttributeValue::Int(i64::from(rssi)));
        }
        if let Some(battery) = self.battery_level {
            attributes.insert(
                "battery_level".to_string(),
                AttributeValue::Int(i64::from(battery)),
            );
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> DeviceIdentifier {
        DeviceIdentifier::parse(raw).unwrap()
    }

    fn reading(is_on: bool) -> SensorReading {
        SensorReading {
            is_on,
            device_class: DeviceClass::Motion,
            rssi: -40,
            battery_level: 80,
        }
    }

    #[test]
    fn should_create_unavailable_placeholder() {
        let entity = SensorEntity::placeholder(id("AABBCCDD"));
        assert!(!entity.is_available());
        assert!(!entity.is_on());
        assert_eq!(entity.device_class(), None);
        assert_eq!(entity.host_state(), EntityState::Unavailable);
    }

    #[test]
    fn should_create_available_discovered_entity() {
        let entity = SensorEntity::discovered(id("11223344"), DeviceClass::Door);
        assert!(entity.is_available());
        assert!(!entity.is_on());
        assert_eq!(entity.device_class(), Some(DeviceClass::Door));
        assert_eq!(entity.host_state(), EntityState::Off);
    }

    #[test]
    fn should_apply_reading_and_become_available() {
        let mut entity = SensorEntity::placeholder(id("AABBCCDD"));
        entity.apply_reading(reading(true));
        assert!(entity.is_available());
        assert!(entity.is_on());
        assert_eq!(entity.rssi(), Some(-40));
        assert_eq!(entity.battery_level(), Some(80));
        assert_eq!(entity.host_state(), EntityState::On);
    }

    #[test]
    fn should_clamp_battery_level_to_hundred() {
        let mut r = reading(false);
        r.battery_level = 130;
        let entity = SensorEntity::from_reading(id("AABBCCDD"), r);
        assert_eq!(entity.battery_level(), Some(100));
    }

    #[test]
    fn should_restore_on_snapshot_as_available_and_on() {
        let mut entity = SensorEntity::placeholder(id("AABBCCDD"));
        entity.restore(&EntityState::On);
        assert!(entity.is_on());
        assert!(entity.is_available());
    }

    #[test]
    fn should_restore_unavailable_snapshot_as_unavailable_and_off() {
        let mut entity = SensorEntity::discovered(id("AABBCCDD"), DeviceClass::Door);
        entity.restore(&EntityState::Unavailable);
        assert!(!entity.is_on());
        assert!(!entity.is_available());
    }

    #[test]
    fn should_project_attributes_without_binary_state() {
        let entity = SensorEntity::from_reading(id("AABBCCDD"), reading(true));
        let attributes = entity.attributes();
        assert_eq!(
            attributes.get("mac"),
            Some(&AttributeValue::String("AABBCCDD".to_string()))
        );
        assert_eq!(attributes.get("available"), Some(&AttributeValue::Bool(true)));
        assert_eq!(
            attributes.get("device_class"),
            Some(&AttributeValue::String("motion".to_string()))
        );
        assert_eq!(attributes.get("rssi"), Some(&AttributeValue::Int(-40)));
        assert_eq!(attributes.get("battery_level"), Some(&AttributeValue::Int(80)));
        assert!(!attributes.contains_key("state"));
        assert_eq!(attributes.len(), 5);
    }

    #[test]
    fn should_omit_unknown_attributes_for_placeholder() {
        let attributes = SensorEntity::placeholder(id("AABBCCDD")).attributes();
        assert_eq!(attributes.len(), 2);
        assert!(!attributes.contains_key("rssi"));
    }

    #[test]
    fn should_force_initial_state() {
        let mut entity = SensorEntity::placeholder(id("AABBCCDD"));
        entity.force_state(InitialState::On);
        assert!(entity.is_on());
        assert!(!entity.is_available());
    }

    #[test]
    fn should_parse_initial_state() {
        assert_eq!("on".parse::<InitialState>().unwrap(), InitialState::On);
        assert_eq!("off".parse::<InitialState>().unwrap(), InitialState::Off);
        assert!("maybe".parse::<InitialState>().is_err());
    }
}
