//! Entity lifecycle — construction, restore-from-snapshot and publishing.
//!
//! [`EntityManager`] is the only place that talks to the [`HostPlatform`].
//! Host failures are logged here and never propagate: the registry stays the
//! source of truth even when the host is unreachable.

use std::collections::BTreeMap;

use sensebridge_domain::entity::EntityIndexKey;
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::notification::Notification;
use sensebridge_domain::sensor::{InitialState, SensorEntity};

use crate::ports::HostPlatform;
use crate::registry::SensorRegistry;

pub struct EntityManager<H> {
    host: H,
}

impl<H: HostPlatform> EntityManager<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Register a new entity with the host and return it as registered.
    ///
    /// With `should_restore`, the host's last snapshot for this identifier
    /// overwrites state and availability before the first publish.
    pub async fn create(&self, mut entity: SensorEntity, should_restore: bool) -> SensorEntity {
        let mac = entity.identifier().clone();

        if should_restore {
            match self.host.last_state(&mac).await {
                Ok(Some(snapshot)) => {
                    tracing::debug!(%mac, state = %snapshot, "restoring sensor from last state");
                    entity.restore(&snapshot);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%err, %mac, "failed to read last state, not restoring");
                }
            }
        }

        if let Err(err) = self.host.add_entities(vec![entity.clone()]).await {
            tracing::error!(%err, %mac, "failed to register sensor entity with host");
        }

        entity
    }

    /// Publish the current state of an already registered entity.
    pub async fn refresh(&self, entity: &SensorEntity) {
        if let Err(err) = self.host.schedule_update(entity.clone()).await {
            tracing::warn!(%err, mac = %entity.identifier(), "failed to publish sensor update");
        }
    }

    /// Host entity id indexed under this sensor's identifier.
    ///
    /// # Errors
    ///
    /// Propagates the host's lookup error so callers can decide how to proceed.
    pub async fn lookup(
        &self,
        mac: &DeviceIdentifier,
    ) -> Result<Option<String>, sensebridge_domain::error::BridgeError> {
        self.host
            .lookup_entity(&EntityIndexKey::sensor(mac.clone()))
            .await
    }

    pub async fn notify(&self, notification: Notification) {
        if let Err(err) = self.host.notify(notification).await {
            tracing::warn!(%err, "failed to deliver notification");
        }
    }
}

/// Create placeholders for persisted sensors not yet in the registry.
///
/// A forced initial state seeds the binary state and skips snapshot restore;
/// everything else is restored from the host. Returns how many were created.
pub async fn seed_placeholders<H: HostPlatform>(
    persisted: Vec<DeviceIdentifier>,
    initial_states: &BTreeMap<DeviceIdentifier, InitialState>,
    registry: &mut SensorRegistry,
    manager: &EntityManager<H>,
) -> usize {
    let mut created = 0;
    for mac in persisted {
        if registry.contains(&mac) {
            tracing::debug!(%mac, "sensor already live, skipping placeholder");
            continue;
        }

        let mut entity = SensorEntity::placeholder(mac);
        let forced = initial_states.get(entity.identifier()).copied();
        if let Some(state) = forced {
            entity.force_state(state);
        }

        let entity = manager.create(entity, forced.is_none()).await;
        if registry.insert(entity) {
            created += 1;
        }
    }
    created
}
