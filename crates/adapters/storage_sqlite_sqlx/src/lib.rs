//! # sensebridge-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `IdentityStore` (the paired-sensor set, stored under the
//!   `sensebridge` key) and `EntityRepository` (the host entity index)
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `sensebridge-app` (for port traits) and `sensebridge-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod entity_repo;
mod error;
mod identity_store;
mod pool;

pub use entity_repo::SqliteEntityRepository;
pub use error::StorageError;
pub use identity_store::SqliteIdentityStore;
pub use pool::{Config, Database};
