//! Stub ports and a running coordinator for handler tests.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;

use sensebridge_app::coordinator::{BridgeHandle, Coordinator};
use sensebridge_app::discovery::{DEFAULT_SCAN_TIMEOUT, DiscoveryRunner};
use sensebridge_app::event_bus::InProcessEventBus;
use sensebridge_app::ports::{DriverError, DriverSession, HostPlatform, IdentityStore};
use sensebridge_domain::driver::{DriverEvent, ScanResult, SensorType, StateReport};
use sensebridge_domain::entity::{EntityIndexKey, EntityState};
use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::notification::Notification;
use sensebridge_domain::sensor::SensorEntity;

use crate::state::AppState;

#[derive(Default)]
pub struct StubStore {
    ids: Mutex<BTreeSet<DeviceIdentifier>>,
}

impl IdentityStore for StubStore {
    async fn load(&self) -> Result<BTreeSet<DeviceIdentifier>, BridgeError> {
        Ok(self.ids.lock().unwrap().clone())
    }

    async fn save(&self, identifiers: &BTreeSet<DeviceIdentifier>) -> Result<(), BridgeError> {
        self.ids.lock().unwrap().clone_from(identifiers);
        Ok(())
    }
}

pub struct StubHost;

impl HostPlatform for StubHost {
    async fn add_entities(&self, _entities: Vec<SensorEntity>) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn schedule_update(&self, _entity: SensorEntity) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn last_state(
        &self,
        _unique_id: &DeviceIdentifier,
    ) -> Result<Option<EntityState>, BridgeError> {
        Ok(None)
    }

    async fn lookup_entity(&self, _key: &EntityIndexKey) -> Result<Option<String>, BridgeError> {
        Ok(None)
    }

    async fn notify(&self, _notification: Notification) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// Session whose scans return the queued identifiers, one per call.
pub struct StubSession {
    queue: Mutex<VecDeque<String>>,
    delay: Duration,
}

impl DriverSession for StubSession {
    fn scan(&self) -> Result<Option<ScanResult>, DriverError> {
        std::thread::sleep(self.delay);
        Ok(self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .map(|mac| ScanResult::new(mac, SensorType::Code(0x01), "1.0")))
    }

    fn stop(&self) {}
}

pub struct Harness {
    pub state: AppState,
    pub handle: BridgeHandle,
}

pub fn running_state_with_scan(scans: &[&str], delay: Duration) -> Harness {
    let (handle, _task) = Coordinator::spawn(StubStore::default(), StubHost);
    let session = Arc::new(StubSession {
        queue: Mutex::new(scans.iter().map(ToString::to_string).collect()),
        delay,
    });
    let discovery = Arc::new(DiscoveryRunner::new(
        session,
        handle.clone(),
        DEFAULT_SCAN_TIMEOUT,
    ));
    Harness {
        state: AppState::running(
            handle.clone(),
            discovery,
            Arc::new(InProcessEventBus::new(16)),
        ),
        handle,
    }
}

pub fn running_state() -> Harness {
    running_state_with_scan(&[], Duration::ZERO)
}

pub fn offline_state() -> AppState {
    AppState::offline(Arc::new(InProcessEventBus::new(16)))
}

pub fn state_event(mac: &str, code: u8, state: &str) -> DriverEvent {
    DriverEvent::state(
        mac,
        StateReport {
            sensor_type: SensorType::Code(code),
            state: state.into(),
            battery: 80,
            signal: 40,
        },
    )
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
