//! Hub platform — the bundled [`HostPlatform`].
//!
//! Entity records are the host's index and its restore-on-boot snapshot;
//! every change is also published on the event bus for live consumers.

use sensebridge_domain::entity::{EntityIndexKey, EntityRecord, EntityState};
use sensebridge_domain::error::BridgeError;
use sensebridge_domain::event::{Event, EventType};
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::notification::Notification;
use sensebridge_domain::sensor::SensorEntity;

use crate::ports::{EntityRepository, EventPublisher, HostPlatform};

pub struct HubPlatform<R, P> {
    repo: R,
    publisher: P,
}

impl<R, P> HubPlatform<R, P>
where
    R: EntityRepository + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// All stored entity records, ordered by entity id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn records(&self) -> Result<Vec<EntityRecord>, BridgeError> {
        self.repo.get_all().await
    }

    async fn upsert(&self, sensor: &SensorEntity) -> Result<EntityRecord, BridgeError> {
        let fresh = EntityRecord::from_sensor(sensor);
        let record = match self.repo.find_by_key(&fresh.index_key()).await? {
            Some(mut existing) => {
                existing.merge(fresh);
                existing
            }
            None => fresh,
        };
        self.repo.save(record).await
    }

    async fn publish(
        &self,
        event_type: EventType,
        unique_id: Option<DeviceIdentifier>,
        payload: &impl serde::Serialize,
    ) -> Result<(), BridgeError> {
        let data =
            serde_json::to_value(payload).map_err(|err| BridgeError::Storage(Box::new(err)))?;
        self.publisher
            .publish(Event::new(event_type, unique_id, data))
            .await
    }
}

impl<R, P> HostPlatform for HubPlatform<R, P>
where
    R: EntityRepository + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    async fn add_entities(&self, entities: Vec<SensorEntity>) -> Result<(), BridgeError> {
        for sensor in entities {
            let record = self.upsert(&sensor).await?;
            tracing::debug!(entity_id = %record.entity_id, state = %record.state, "entity added");
            self.publish(
                EventType::EntityAdded,
                Some(record.unique_id.clone()),
                &record,
            )
            .await?;
        }
        Ok(())
    }

    async fn schedule_update(&self, sensor: SensorEntity) -> Result<(), BridgeError> {
        let record = self.upsert(&sensor).await?;
        self.publish(
            EventType::StateChanged,
            Some(record.unique_id.clone()),
            &record,
        )
        .await
    }

    async fn last_state(
        &self,
        unique_id: &DeviceIdentifier,
    ) -> Result<Option<EntityState>, BridgeError> {
        let key = EntityIndexKey::sensor(unique_id.clone());
        Ok(self.repo.find_by_key(&key).await?.map(|record| record.state))
    }

    async fn lookup_entity(&self, key: &EntityIndexKey) -> Result<Option<String>, BridgeError> {
        Ok(self
            .repo
            .find_by_key(key)
            .await?
            .map(|record| record.entity_id))
    }

    async fn notify(&self, notification: Notification) -> Result<(), BridgeError> {
        tracing::info!(title = %notification.title, message = %notification.message, "notification");
        self.publish(EventType::Notification, None, &notification)
            .await
    }
}
