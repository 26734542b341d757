//! # sensebridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the sensor registry
//!   (`/api/sensors`, `/api/sensors/{mac}`)
//! - Expose the discovery scan as a service call (`POST /api/services/scan`)
//! - Stream host events as Server-Sent Events (`/api/events/stream`)
//! - Map application results into HTTP responses
//!
//! The server keeps running when the bridge session failed to start; the
//! sensor and scan routes then answer `503 Service Unavailable`.
//!
//! ## Dependency rule
//! Depends on `sensebridge-app` (for the bridge handle and services) and
//! `sensebridge-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
