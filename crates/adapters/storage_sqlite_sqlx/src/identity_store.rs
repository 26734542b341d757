//! `SQLite` implementation of [`IdentityStore`].
//!
//! The set is one JSON array in `key_value_store`, so every save is a single
//! atomic row replacement.

use std::collections::BTreeSet;

use sqlx::SqlitePool;

use sensebridge_app::ports::IdentityStore;
use sensebridge_app::ports::identity_store::{STORAGE_KEY, STORAGE_VERSION};
use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;

use crate::error::StorageError;

const SELECT: &str = "SELECT version, data FROM key_value_store WHERE key = ?";

const UPSERT: &str = r"
    INSERT INTO key_value_store (key, version, data)
    VALUES (?, ?, ?)
    ON CONFLICT (key) DO UPDATE SET version = excluded.version, data = excluded.data
";

/// `SQLite`-backed identity store.
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl IdentityStore for SqliteIdentityStore {
    async fn load(&self) -> Result<BTreeSet<DeviceIdentifier>, BridgeError> {
        let row: Option<(i64, String)> = sqlx::query_as(SELECT)
            .bind(STORAGE_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let Some((version, data)) = row else {
            return Ok(BTreeSet::new());
        };
        if version > STORAGE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                key: STORAGE_KEY.to_string(),
                found: version,
            }
            .into());
        }

        let identifiers: BTreeSet<DeviceIdentifier> =
            serde_json::from_str(&data).map_err(StorageError::from)?;
        Ok(identifiers)
    }

    async fn save(&self, identifiers: &BTreeSet<DeviceIdentifier>) -> Result<(), BridgeError> {
        let data = serde_json::to_string(identifiers).map_err(StorageError::from)?;

        sqlx::query(UPSERT)
            .bind(STORAGE_KEY)
            .bind(STORAGE_VERSION)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
