//! Sensor registry — identifier → entity, the single source of truth.
//!
//! Owned by the coordinator task; nothing else holds a mutable reference.

use std::collections::HashMap;

use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::sensor::SensorEntity;

#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: HashMap<DeviceIdentifier, SensorEntity>,
}

impl SensorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, mac: &DeviceIdentifier) -> bool {
        self.sensors.contains_key(mac)
    }

    #[must_use]
    pub fn get(&self, mac: &DeviceIdentifier) -> Option<&SensorEntity> {
        self.sensors.get(mac)
    }

    pub fn get_mut(&mut self, mac: &DeviceIdentifier) -> Option<&mut SensorEntity> {
        self.sensors.get_mut(mac)
    }

    /// Insert a new entity. An existing entry for the same identifier is
    /// kept and `false` is returned: there is never more than one.
    pub fn insert(&mut self, entity: SensorEntity) -> bool {
        match self.sensors.entry(entity.identifier().clone()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entity);
                true
            }
        }
    }

    /// Clones of every entity, ordered by identifier.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SensorEntity> {
        let mut sensors: Vec<SensorEntity> = self.sensors.values().cloned().collect();
        sensors.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        sensors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensebridge_domain::sensor::DeviceClass;

    fn mac(raw: &str) -> DeviceIdentifier {
        DeviceIdentifier::parse(raw).unwrap()
    }

    #[test]
    fn should_insert_new_entity() {
        let mut registry = SensorRegistry::new();
        assert!(registry.insert(SensorEntity::placeholder(mac("AABBCCDD"))));
        assert!(registry.contains(&mac("AABBCCDD")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_keep_existing_entity_on_duplicate_insert() {
        let mut registry = SensorRegistry::new();
        registry.insert(SensorEntity::discovered(mac("AABBCCDD"), DeviceClass::Motion));

        let inserted = registry.insert(SensorEntity::placeholder(mac("AABBCCDD")));

        assert!(!inserted);
        assert_eq!(registry.len(), 1);
        let kept = registry.get(&mac("AABBCCDD")).unwrap();
        assert_eq!(kept.device_class(), Some(DeviceClass::Motion));
    }

    #[test]
    fn should_order_snapshot_by_identifier() {
        let mut registry = SensorRegistry::new();
        registry.insert(SensorEntity::placeholder(mac("BBBBBBBB")));
        registry.insert(SensorEntity::placeholder(mac("AAAAAAAA")));

        let ids: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|s| s.identifier().to_string())
            .collect();
        assert_eq!(ids, vec!["AAAAAAAA", "BBBBBBBB"]);
    }
}
