//! Discovery — put the dongle in pairing mode and adopt the sensor it finds.
//!
//! [`DiscoveryRunner::run`] drives the blocking scan on a blocking worker
//! under a hard timeout. Only the completion step, [`complete`], touches the
//! registry, and it runs on the coordinator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};

use sensebridge_domain::driver::{ScanResult, SensorType};
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::notification::Notification;
use sensebridge_domain::sensor::SensorEntity;

use crate::coordinator::BridgeHandle;
use crate::lifecycle::EntityManager;
use crate::ports::{DriverSession, HostPlatform, IdentityStore};
use crate::reconciler::classify;
use crate::registry::SensorRegistry;

pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryState {
    Idle,
    Scanning,
}

/// Where a duplicate discovery was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSource {
    Registry,
    HostIndex,
}

/// Result of one discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    /// A new sensor was paired and registered.
    Found {
        mac: DeviceIdentifier,
        sensor_type: SensorType,
        version: String,
        /// `false` when the identity store could not be updated.
        persisted: bool,
    },
    /// The sensor is already known; nothing was created.
    Duplicate {
        mac: DeviceIdentifier,
        source: DuplicateSource,
    },
    /// The dongle gave up without finding a sensor.
    NotFound,
    /// The scan exceeded the timeout.
    TimedOut,
    /// The dongle reported a malformed identifier.
    Invalid { mac: String },
    /// Another discovery is already in flight.
    Busy,
    /// The scan itself failed.
    Failed { reason: String },
}

/// Runs discovery scans, one at a time.
///
/// Each accepted call spawns a task that owns the scan and its completion.
/// Dropping the caller's future detaches from that task without cancelling
/// it, so a sensor the dongle has paired is always adopted.
pub struct DiscoveryRunner {
    session: Arc<dyn DriverSession>,
    handle: BridgeHandle,
    timeout: Duration,
    // held by the discovery task, scan and completion
    in_flight: Arc<Mutex<()>>,
    // held by the blocking worker until the driver returns, even past a timeout
    driver_busy: Arc<Mutex<()>>,
    state: Arc<watch::Sender<DiscoveryState>>,
}

impl DiscoveryRunner {
    #[must_use]
    pub fn new(session: Arc<dyn DriverSession>, handle: BridgeHandle, timeout: Duration) -> Self {
        Self {
            session,
            handle,
            timeout,
            in_flight: Arc::new(Mutex::new(())),
            driver_busy: Arc::new(Mutex::new(())),
            state: Arc::new(watch::Sender::new(DiscoveryState::Idle)),
        }
    }

    /// Watch the runner's state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<DiscoveryState> {
        self.state.subscribe()
    }

    /// Run one discovery. Never fails: every outcome is a value.
    pub async fn run(&self) -> DiscoveryOutcome {
        let Ok(in_flight) = Arc::clone(&self.in_flight).try_lock_owned() else {
            tracing::warn!("discovery already in progress, rejecting request");
            return DiscoveryOutcome::Busy;
        };
        let Ok(driver_guard) = Arc::clone(&self.driver_busy).try_lock_owned() else {
            tracing::warn!("dongle still busy with an abandoned scan, rejecting request");
            return DiscoveryOutcome::Busy;
        };

        let scan = Scan {
            session: Arc::clone(&self.session),
            handle: self.handle.clone(),
            timeout: self.timeout,
            state: Arc::clone(&self.state),
        };
        let task = tokio::spawn(async move {
            let _in_flight = in_flight;
            scan.run(driver_guard).await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(%err, "discovery task failed");
                DiscoveryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// One accepted discovery, moved into its own task.
struct Scan {
    session: Arc<dyn DriverSession>,
    handle: BridgeHandle,
    timeout: Duration,
    state: Arc<watch::Sender<DiscoveryState>>,
}

impl Scan {
    async fn run(self, driver_guard: OwnedMutexGuard<()>) -> DiscoveryOutcome {
        self.state.send_replace(DiscoveryState::Scanning);
        let _idle = IdleOnDrop(Arc::clone(&self.state));
        tracing::info!(timeout_secs = self.timeout.as_secs(), "starting sensor discovery");

        let session = self.session;
        let worker = tokio::task::spawn_blocking(move || {
            let _driver_guard = driver_guard;
            session.scan()
        });

        let scan = match tokio::time::timeout(self.timeout, worker).await {
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "discovery timed out, no sensor paired"
                );
                return DiscoveryOutcome::TimedOut;
            }
            Ok(Err(err)) => {
                tracing::error!(%err, "discovery worker failed");
                return DiscoveryOutcome::Failed {
                    reason: err.to_string(),
                };
            }
            Ok(Ok(Err(err))) => {
                tracing::error!(%err, "dongle scan failed");
                return DiscoveryOutcome::Failed {
                    reason: err.to_string(),
                };
            }
            Ok(Ok(Ok(None))) => {
                tracing::info!("discovery finished, no sensor found");
                return DiscoveryOutcome::NotFound;
            }
            Ok(Ok(Ok(Some(scan)))) => scan,
        };

        match self.handle.discovered(scan).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(%err, "discovery result dropped");
                DiscoveryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

struct IdleOnDrop(Arc<watch::Sender<DiscoveryState>>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(DiscoveryState::Idle);
    }
}

/// Adopt a scanned sensor. Runs on the coordinator.
///
/// Registry first, then the host index, then the identity store: a sensor
/// already known at any level is never created or persisted twice.
pub(crate) async fn complete<S, H>(
    scan: ScanResult,
    registry: &mut SensorRegistry,
    manager: &EntityManager<H>,
    store: &S,
) -> DiscoveryOutcome
where
    S: IdentityStore,
    H: HostPlatform,
{
    let ScanResult {
        mac: raw_mac,
        sensor_type,
        version,
    } = scan;

    let mac = match DeviceIdentifier::parse(raw_mac.as_str()) {
        Ok(mac) => mac,
        Err(err) => {
            tracing::warn!(mac = %raw_mac, %err, "discovered sensor has an invalid identifier");
            return DiscoveryOutcome::Invalid { mac: raw_mac };
        }
    };

    if registry.contains(&mac) {
        tracing::info!(%mac, "discovered sensor is already registered");
        return DiscoveryOutcome::Duplicate {
            mac,
            source: DuplicateSource::Registry,
        };
    }

    match manager.lookup(&mac).await {
        Ok(Some(entity_id)) => {
            tracing::info!(%mac, %entity_id, "discovered sensor already exists on the host");
            return DiscoveryOutcome::Duplicate {
                mac,
                source: DuplicateSource::HostIndex,
            };
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(%err, %mac, "host entity lookup failed, continuing discovery");
        }
    }

    let persisted = remember(store, &mac).await;

    let entity = SensorEntity::discovered(mac.clone(), classify(&sensor_type));
    let entity = manager.create(entity, true).await;
    registry.insert(entity);

    tracing::info!(%mac, %sensor_type, %version, "sensor paired");
    manager
        .notify(Notification::sensor_detected(&mac, &sensor_type))
        .await;

    DiscoveryOutcome::Found {
        mac,
        sensor_type,
        version,
        persisted,
    }
}

/// Reload the identity set and add `mac` to it. `false` when storage failed.
async fn remember<S: IdentityStore>(store: &S, mac: &DeviceIdentifier) -> bool {
    let mut known: BTreeSet<DeviceIdentifier> = match store.load().await {
        Ok(known) => known,
        Err(err) => {
            tracing::error!(%err, %mac, "failed to load identity store, sensor not persisted");
            return false;
        }
    };

    if !known.insert(mac.clone()) {
        return true;
    }

    match store.save(&known).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(%err, %mac, "failed to persist sensor identity");
            false
        }
    }
}
