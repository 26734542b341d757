//! # sensebridge-app
//!
//! Application layer — the reconciliation engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Driver` / `DriverSession` — the opaque dongle transport
//!   - `IdentityStore` — durable set of paired sensor identifiers
//!   - `HostPlatform` — where entities are registered, refreshed and restored
//!   - `EntityRepository` — storage behind the bundled host platform
//!   - `EventPublisher` — publish events to subscribers
//! - Own the **coordinator**: the single task that holds the sensor registry
//!   and serializes every mutation
//! - Reconcile driver events into sensor entities, run discovery scans,
//!   and drive the session lifecycle (startup, placeholders, shutdown)
//! - Provide **in-process infrastructure** (event bus, host platform) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `sensebridge-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod coordinator;
pub mod discovery;
pub mod event_bus;
pub mod lifecycle;
pub mod ports;
pub mod reconciler;
pub mod registry;
pub mod services;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
