//! Values produced by the dongle driver: asynchronous events and scan results.
//!
//! These are the raw shapes as the driver reports them. The identifier is kept
//! as a plain string here because validation is the reconciler's job, and an
//! invalid identifier must be observable (and logged) rather than impossible.

use serde::{Deserialize, Serialize};

/// Type tag the driver uses for sensor state reports.
pub const STATE_EVENT: &str = "state";

/// Sensor type codes that identify motion sensors.
pub const MOTION_TYPE_CODES: [u8; 2] = [0x02, 0x0F];

/// An event delivered through the driver callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverEvent {
    /// Identifier as reported, not yet validated.
    pub mac: String,
    pub kind: DriverEventKind,
}

impl DriverEvent {
    /// Convenience constructor for a `"state"` event.
    #[must_use]
    pub fn state(mac: impl Into<String>, report: StateReport) -> Self {
        Self {
            mac: mac.into(),
            kind: DriverEventKind::State(report),
        }
    }

    /// The driver's type tag for this event.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        match &self.kind {
            DriverEventKind::State(_) => STATE_EVENT,
            DriverEventKind::Other(tag) => tag,
        }
    }
}

/// What kind of event the driver delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverEventKind {
    /// A state report: `(sensor_type, state, battery, signal)`.
    State(StateReport),
    /// Any other event type (alarm, keypad, …), identified by its tag.
    Other(String),
}

/// Payload of a `"state"` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub sensor_type: SensorType,
    pub state: RawState,
    /// Battery percentage as reported.
    pub battery: u8,
    /// Signal magnitude (positive); the entity stores the negated value.
    pub signal: i32,
}

/// Sensor type as the driver reports it: a numeric code, or for some firmware
/// revisions an already-decoded name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorType {
    Code(u8),
    Named(String),
}

impl SensorType {
    /// Whether this type denotes a motion sensor.
    #[must_use]
    pub fn is_motion(&self) -> bool {
        match self {
            Self::Code(code) => MOTION_TYPE_CODES.contains(code),
            Self::Named(name) => name.eq_ignore_ascii_case("motion"),
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code:#04x}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Raw binary state token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawState {
    Flag(bool),
    Level(i64),
    Token(String),
}

impl RawState {
    /// Normalize to the entity's binary state.
    ///
    /// Text tokens count as active only for `open` / `active`; flags and
    /// levels count when truthy.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::Token(token) => matches!(token.as_str(), "open" | "active"),
            Self::Flag(flag) => *flag,
            Self::Level(level) => *level != 0,
        }
    }
}

impl From<&str> for RawState {
    fn from(value: &str) -> Self {
        Self::Token(value.to_string())
    }
}

/// Result of a successful pairing scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Identifier as reported, not yet validated.
    pub mac: String,
    pub sensor_type: SensorType,
    pub version: String,
}

impl ScanResult {
    #[must_use]
    pub fn new(mac: impl Into<String>, sensor_type: SensorType, version: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            sensor_type,
            version: version.into(),
        }
    }
}
