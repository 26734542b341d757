//! Event reconciler — turns driver events into sensor entity changes.
//!
//! The driver calls [`EventSink::on_event`] from its own reader thread. The
//! sink only enqueues; [`reconcile`] runs later on the coordinator, which is
//! the only place the registry is mutated.

use std::sync::Arc;

use tokio::sync::mpsc;

use sensebridge_domain::driver::{DriverEvent, DriverEventKind, SensorType, StateReport};
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::sensor::{DeviceClass, SensorEntity, SensorReading};

use crate::coordinator::Command;
use crate::lifecycle::EntityManager;
use crate::ports::{EventCallback, HostPlatform};
use crate::registry::SensorRegistry;

/// What reconciling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// A known sensor was updated in place.
    Updated(DeviceIdentifier),
    /// First sight of this sensor: a new entity was registered.
    Created(DeviceIdentifier),
    /// Not a state event.
    Ignored,
    /// The identifier failed validation.
    Rejected,
}

/// Device class from the driver's sensor type.
#[must_use]
pub fn classify(sensor_type: &SensorType) -> DeviceClass {
    if sensor_type.is_motion() {
        DeviceClass::Motion
    } else {
        DeviceClass::Door
    }
}

/// Normalize a state report: classify, binarize state, negate signal.
#[must_use]
pub fn derive_reading(report: &StateReport) -> SensorReading {
    SensorReading {
        is_on: report.state.is_active(),
        device_class: classify(&report.sensor_type),
        rssi: report.signal.saturating_neg(),
        battery_level: report.battery,
    }
}

/// Apply one driver event to the registry.
pub async fn reconcile<H: HostPlatform>(
    event: DriverEvent,
    registry: &mut SensorRegistry,
    manager: &EntityManager<H>,
) -> Reconciled {
    let DriverEvent { mac: raw_mac, kind } = event;

    let mac = match DeviceIdentifier::parse(raw_mac.as_str()) {
        Ok(mac) => mac,
        Err(err) => {
            tracing::warn!(mac = %raw_mac, %err, "sensor with invalid identifier detected");
            return Reconciled::Rejected;
        }
    };

    let report = match kind {
        DriverEventKind::State(report) => report,
        DriverEventKind::Other(tag) => {
            tracing::debug!(%mac, %tag, "ignoring non-state event");
            return Reconciled::Ignored;
        }
    };

    let reading = derive_reading(&report);

    if let Some(entity) = registry.get_mut(&mac) {
        entity.apply_reading(reading);
        let updated = entity.clone();
        tracing::trace!(%mac, is_on = reading.is_on, "sensor state updated");
        manager.refresh(&updated).await;
        return Reconciled::Updated(mac);
    }

    tracing::info!(%mac, class = %reading.device_class, "new sensor heard, registering entity");
    // a live reading is newer than any snapshot, so no restore here
    let entity = manager
        .create(SensorEntity::from_reading(mac.clone(), reading), false)
        .await;
    registry.insert(entity);
    Reconciled::Created(mac)
}

/// Thread-safe handoff from the driver's callback to the coordinator queue.
#[derive(Clone)]
pub struct EventSink {
    commands: mpsc::UnboundedSender<Command>,
}

impl EventSink {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// Enqueue an event. Never blocks; safe from any thread.
    pub fn on_event(&self, event: DriverEvent) {
        if self.commands.send(Command::Event(event)).is_err() {
            tracing::debug!("coordinator stopped, dropping driver event");
        }
    }

    /// Wrap the sink as the callback handed to [`Driver::open`](crate::ports::Driver::open).
    #[must_use]
    pub fn into_callback(self) -> EventCallback {
        Arc::new(move |event| self.on_event(event))
    }
}
