//! `SQLite` implementation of [`EntityRepository`].

use std::collections::BTreeMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use sensebridge_app::ports::EntityRepository;
use sensebridge_domain::entity::{AttributeValue, EntityIndexKey, EntityRecord, EntityState};
use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(EntityRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<EntityRecord> {
        value.map(|w| w.0)
    }
}

fn decode_err(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

fn timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, sqlx::Error> {
    Ok(chrono::DateTime::parse_from_rfc3339(raw)
        .map_err(decode_err)?
        .to_utc())
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let entity_id: String = row.try_get("entity_id")?;
        let unique_id: String = row.try_get("unique_id")?;
        let platform: String = row.try_get("platform")?;
        let domain: String = row.try_get("domain")?;
        let state: String = row.try_get("state")?;
        let attributes_json: String = row.try_get("attributes")?;
        let last_changed: String = row.try_get("last_changed")?;
        let last_updated: String = row.try_get("last_updated")?;

        let unique_id = DeviceIdentifier::parse(unique_id).map_err(decode_err)?;
        let state = state.parse::<EntityState>().unwrap_or_default();
        let attributes: BTreeMap<String, AttributeValue> =
            serde_json::from_str(&attributes_json).map_err(decode_err)?;

        Ok(Self(EntityRecord {
            entity_id,
            unique_id,
            platform,
            domain,
            state,
            attributes,
            last_changed: timestamp(&last_changed)?,
            last_updated: timestamp(&last_updated)?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO entities (entity_id, unique_id, platform, domain, state, attributes, last_changed, last_updated)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (domain, platform, unique_id) DO UPDATE SET
        entity_id = excluded.entity_id,
        state = excluded.state,
        attributes = excluded.attributes,
        last_changed = excluded.last_changed,
        last_updated = excluded.last_updated
";

const SELECT_BY_KEY: &str =
    "SELECT * FROM entities WHERE domain = ? AND platform = ? AND unique_id = ?";
const SELECT_ALL: &str = "SELECT * FROM entities ORDER BY entity_id";

/// `SQLite`-backed entity repository.
pub struct SqliteEntityRepository {
    pool: SqlitePool,
}

impl SqliteEntityRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EntityRepository for SqliteEntityRepository {
    async fn save(&self, record: EntityRecord) -> Result<EntityRecord, BridgeError> {
        let attributes_json =
            serde_json::to_string(&record.attributes).map_err(StorageError::from)?;

        sqlx::query(UPSERT)
            .bind(&record.entity_id)
            .bind(record.unique_id.as_str())
            .bind(&record.platform)
            .bind(&record.domain)
            .bind(record.state.as_str())
            .bind(&attributes_json)
            .bind(record.last_changed.to_rfc3339())
            .bind(record.last_updated.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn find_by_key(&self, key: &EntityIndexKey) -> Result<Option<EntityRecord>, BridgeError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_KEY)
            .bind(&key.domain)
            .bind(&key.platform)
            .bind(key.unique_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<EntityRecord>, BridgeError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
