//! Storage port — persistence for host entity records.

use std::future::Future;

use sensebridge_domain::entity::{EntityIndexKey, EntityRecord};
use sensebridge_domain::error::BridgeError;

/// Repository for persisting and querying [`EntityRecord`]s.
pub trait EntityRepository {
    /// Insert the record, or replace the one stored under the same index key.
    fn save(
        &self,
        record: EntityRecord,
    ) -> impl Future<Output = Result<EntityRecord, BridgeError>> + Send;

    /// Find the record stored under `key`.
    fn find_by_key(
        &self,
        key: &EntityIndexKey,
    ) -> impl Future<Output = Result<Option<EntityRecord>, BridgeError>> + Send;

    /// Get all records, ordered by entity id.
    fn get_all(&self) -> impl Future<Output = Result<Vec<EntityRecord>, BridgeError>> + Send;
}
