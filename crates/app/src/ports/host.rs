//! Host platform port — where sensor entities become visible.
//!
//! The host displays entities, keeps a snapshot of their last state for
//! restore at boot, indexes them by `(domain, platform, unique_id)`, and
//! delivers notifications. sensebridge ships one implementation
//! ([`HubPlatform`](crate::services::host_platform::HubPlatform)); embedding
//! applications can provide their own.

use std::future::Future;
use std::sync::Arc;

use sensebridge_domain::entity::{EntityIndexKey, EntityState};
use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::notification::Notification;
use sensebridge_domain::sensor::SensorEntity;

pub trait HostPlatform {
    /// Register new entities. This is their first publish.
    fn add_entities(
        &self,
        entities: Vec<SensorEntity>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Publish the current state of an already registered entity.
    fn schedule_update(
        &self,
        entity: SensorEntity,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Last state the host recorded for this sensor, if any.
    fn last_state(
        &self,
        unique_id: &DeviceIdentifier,
    ) -> impl Future<Output = Result<Option<EntityState>, BridgeError>> + Send;

    /// Host entity id registered under `key`, if any.
    fn lookup_entity(
        &self,
        key: &EntityIndexKey,
    ) -> impl Future<Output = Result<Option<String>, BridgeError>> + Send;

    /// Raise a persistent notification.
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: HostPlatform + Send + Sync> HostPlatform for Arc<T> {
    fn add_entities(
        &self,
        entities: Vec<SensorEntity>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).add_entities(entities)
    }

    fn schedule_update(
        &self,
        entity: SensorEntity,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).schedule_update(entity)
    }

    fn last_state(
        &self,
        unique_id: &DeviceIdentifier,
    ) -> impl Future<Output = Result<Option<EntityState>, BridgeError>> + Send {
        (**self).last_state(unique_id)
    }

    fn lookup_entity(
        &self,
        key: &EntityIndexKey,
    ) -> impl Future<Output = Result<Option<String>, BridgeError>> + Send {
        (**self).lookup_entity(key)
    }

    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).notify(notification)
    }
}
