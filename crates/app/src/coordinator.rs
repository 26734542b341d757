//! Coordinator — the single task that owns the sensor registry.
//!
//! Every mutation (driver events, discovery completions, placeholder seeding)
//! and every read goes through one command queue, so the registry needs no
//! lock. Driver threads only ever enqueue.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use sensebridge_domain::driver::{DriverEvent, ScanResult};
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::sensor::{InitialState, SensorEntity};

use crate::discovery::{self, DiscoveryOutcome};
use crate::lifecycle::{self, EntityManager};
use crate::ports::{HostPlatform, IdentityStore};
use crate::reconciler::{self, EventSink};
use crate::registry::SensorRegistry;

pub(crate) enum Command {
    Event(DriverEvent),
    Seed {
        placeholders: Vec<DeviceIdentifier>,
        initial_states: BTreeMap<DeviceIdentifier, InitialState>,
        reply: oneshot::Sender<usize>,
    },
    Discovered {
        scan: ScanResult,
        reply: oneshot::Sender<DiscoveryOutcome>,
    },
    Get {
        mac: DeviceIdentifier,
        reply: oneshot::Sender<Option<SensorEntity>>,
    },
    List {
        reply: oneshot::Sender<Vec<SensorEntity>>,
    },
    Shutdown,
}

/// The coordinator task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bridge coordinator is not running")]
pub struct CoordinatorStopped;

pub struct Coordinator<S, H> {
    registry: SensorRegistry,
    manager: EntityManager<H>,
    store: S,
}

impl<S, H> Coordinator<S, H>
where
    S: IdentityStore + Send + Sync + 'static,
    H: HostPlatform + Send + Sync + 'static,
{
    /// Spawn the coordinator task and return a handle to it.
    pub fn spawn(store: S, host: H) -> (BridgeHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let coordinator = Self {
            registry: SensorRegistry::new(),
            manager: EntityManager::new(host),
            store,
        };
        let task = tokio::spawn(coordinator.run(receiver));
        (BridgeHandle { commands }, task)
    }

    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("coordinator started");
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Event(event) => {
                    reconciler::reconcile(event, &mut self.registry, &self.manager).await;
                }
                Command::Seed {
                    placeholders,
                    initial_states,
                    reply,
                } => {
                    let created = lifecycle::seed_placeholders(
                        placeholders,
                        &initial_states,
                        &mut self.registry,
                        &self.manager,
                    )
                    .await;
                    let _ = reply.send(created);
                }
                Command::Discovered { scan, reply } => {
                    let outcome =
                        discovery::complete(scan, &mut self.registry, &self.manager, &self.store)
                            .await;
                    let _ = reply.send(outcome);
                }
                Command::Get { mac, reply } => {
                    let _ = reply.send(self.registry.get(&mac).cloned());
                }
                Command::List { reply } => {
                    let _ = reply.send(self.registry.snapshot());
                }
                Command::Shutdown => break,
            }
        }
        tracing::debug!(sensors = self.registry.len(), "coordinator stopped");
    }
}

/// Cloneable handle to the coordinator. Reads return snapshots.
#[derive(Clone)]
pub struct BridgeHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl BridgeHandle {
    /// Sink to hand to the driver as its event callback.
    #[must_use]
    pub fn event_sink(&self) -> EventSink {
        EventSink::new(self.commands.clone())
    }

    /// Snapshot of one sensor.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorStopped`] once the bridge has shut down.
    pub async fn entity(
        &self,
        mac: &DeviceIdentifier,
    ) -> Result<Option<SensorEntity>, CoordinatorStopped> {
        self.request(|reply| Command::Get {
            mac: mac.clone(),
            reply,
        })
        .await
    }

    /// Snapshot of every sensor, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorStopped`] once the bridge has shut down.
    pub async fn entities(&self) -> Result<Vec<SensorEntity>, CoordinatorStopped> {
        self.request(|reply| Command::List { reply }).await
    }

    pub(crate) async fn seed(
        &self,
        placeholders: Vec<DeviceIdentifier>,
        initial_states: BTreeMap<DeviceIdentifier, InitialState>,
    ) -> Result<usize, CoordinatorStopped> {
        self.request(|reply| Command::Seed {
            placeholders,
            initial_states,
            reply,
        })
        .await
    }

    pub(crate) async fn discovered(
        &self,
        scan: ScanResult,
    ) -> Result<DiscoveryOutcome, CoordinatorStopped> {
        self.request(|reply| Command::Discovered { scan, reply }).await
    }

    pub(crate) fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoordinatorStopped> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| CoordinatorStopped)?;
        response.await.map_err(|_| CoordinatorStopped)
    }
}
