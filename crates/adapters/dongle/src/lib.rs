//! # sensebridge-adapter-dongle
//!
//! Everything about the physical dongle that the core treats as opaque.
//!
//! ## Provided
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`probe::find_dongle`] | Locate the dongle (`1a86:e024`) under `/sys/class/hidraw` |
//! | [`SimulatedDongle`] | [`Driver`](sensebridge_app::ports::Driver) emitting scripted sensor traffic |
//!
//! ## Dependency rule
//!
//! Depends on `sensebridge-app` (port traits) and `sensebridge-domain` only.

mod config;
mod error;
pub mod probe;
mod simulated;

pub use config::{SimulatedConfig, SimulatedSensor};
pub use error::DongleError;
pub use simulated::SimulatedDongle;
