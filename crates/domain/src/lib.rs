//! # sensebridge-domain
//!
//! Pure domain model for the sensebridge dongle bridge.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error conventions, timestamps
//! - Define **Sensor entities** (one per paired sensor: on/off, class, signal, battery)
//! - Define **Driver events** and **scan results** as they arrive from the dongle
//! - Define **Entity records** (what the host platform stores and restores)
//! - Define **Events** and **Notifications** published to the host
//! - Contain all invariant enforcement (the 8-byte identifier rule lives here)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod driver;
pub mod entity;
pub mod event;
pub mod notification;
pub mod sensor;
