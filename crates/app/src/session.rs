//! Session controller — bring a bridge up against one dongle, and take it down.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::sensor::InitialState;

use crate::coordinator::{BridgeHandle, Coordinator, CoordinatorStopped};
use crate::discovery::{DEFAULT_SCAN_TIMEOUT, DiscoveryRunner};
use crate::ports::{Driver, DriverError, DriverSession, HostPlatform, IdentityStore};

/// Which dongle to open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeviceTarget {
    /// Probe the system for the dongle.
    #[default]
    Auto,
    Path(PathBuf),
}

impl From<&str> for DeviceTarget {
    fn from(value: &str) -> Self {
        match value.trim() {
            "" | "auto" => Self::Auto,
            path => Self::Path(PathBuf::from(path)),
        }
    }
}

impl std::str::FromStr for DeviceTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl std::fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub target: DeviceTarget,
    pub scan_timeout: Duration,
    pub initial_states: BTreeMap<DeviceIdentifier, InitialState>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: DeviceTarget::Auto,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            initial_states: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no dongle found")]
    NoDongle,

    #[error("failed to connect to dongle")]
    Connection(#[source] DriverError),

    #[error("failed to load paired sensors")]
    Storage(#[source] BridgeError),

    #[error("blocking worker failed")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorStopped),
}

/// Resolve the configured target into a device path.
///
/// # Errors
///
/// Returns [`SessionError::NoDongle`] when auto-probing finds nothing.
pub fn resolve_target(
    target: &DeviceTarget,
    probe: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, SessionError> {
    match target {
        DeviceTarget::Path(path) => Ok(path.clone()),
        DeviceTarget::Auto => probe().ok_or(SessionError::NoDongle),
    }
}

/// A running bridge: coordinator, open driver session and discovery service.
pub struct Bridge {
    handle: BridgeHandle,
    discovery: Arc<DiscoveryRunner>,
    session: Arc<dyn DriverSession>,
    coordinator: JoinHandle<()>,
    device: PathBuf,
}

impl Bridge {
    /// Start a session.
    ///
    /// Loads the paired sensors, opens the dongle with the coordinator's
    /// event sink as callback, then seeds a placeholder for every paired
    /// sensor that is not already live.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the store cannot be read, no dongle is
    /// found or the dongle cannot be opened. Nothing keeps running then.
    pub async fn start<S, H>(
        driver: Arc<dyn Driver>,
        store: S,
        host: H,
        config: SessionConfig,
        probe: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, SessionError>
    where
        S: IdentityStore + Send + Sync + 'static,
        H: HostPlatform + Send + Sync + 'static,
    {
        let paired = store.load().await.map_err(SessionError::Storage)?;
        if paired.is_empty() {
            store.save(&paired).await.map_err(SessionError::Storage)?;
        }
        tracing::debug!(count = paired.len(), "loaded paired sensors");

        let device = resolve_target(&config.target, probe)?;
        tracing::info!(device = %device.display(), "opening dongle");

        let (handle, coordinator) = Coordinator::spawn(store, host);
        let callback = handle.event_sink().into_callback();

        let path = device.clone();
        let opened = tokio::task::spawn_blocking(move || driver.open(&path, callback)).await;
        let session = match opened {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => {
                handle.shutdown();
                return Err(SessionError::Connection(err));
            }
            Err(err) => {
                handle.shutdown();
                return Err(SessionError::Worker(err));
            }
        };

        let seeded = match handle
            .seed(paired.into_iter().collect(), config.initial_states)
            .await
        {
            Ok(seeded) => seeded,
            Err(err) => {
                session.stop();
                return Err(err.into());
            }
        };
        tracing::info!(placeholders = seeded, "sensebridge session started");

        let discovery = Arc::new(DiscoveryRunner::new(
            Arc::clone(&session),
            handle.clone(),
            config.scan_timeout,
        ));

        Ok(Self {
            handle,
            discovery,
            session,
            coordinator,
            device,
        })
    }

    #[must_use]
    pub fn handle(&self) -> &BridgeHandle {
        &self.handle
    }

    #[must_use]
    pub fn discovery(&self) -> Arc<DiscoveryRunner> {
        Arc::clone(&self.discovery)
    }

    #[must_use]
    pub fn device(&self) -> &std::path::Path {
        &self.device
    }

    /// Stop the driver, then the coordinator.
    pub async fn shutdown(self) {
        let session = self.session;
        if let Err(err) = tokio::task::spawn_blocking(move || session.stop()).await {
            tracing::error!(%err, "failed to stop dongle session");
        }
        self.handle.shutdown();
        if let Err(err) = self.coordinator.await {
            tracing::error!(%err, "coordinator task failed");
        }
        tracing::info!("sensebridge session stopped");
    }
}
