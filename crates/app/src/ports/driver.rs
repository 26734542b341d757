//! Driver port — the opaque dongle transport.
//!
//! The driver owns framing, the HID file handle and its reader thread. The
//! bridge only opens it, asks it to scan, and stops it. Events arrive through
//! the callback on whatever thread the driver reads from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sensebridge_domain::driver::{DriverEvent, ScanResult};

/// Callback the driver invokes for every decoded event.
///
/// May be called from a driver-owned thread; implementations must not block.
pub type EventCallback = Arc<dyn Fn(DriverEvent) + Send + Sync>;

/// Opens sessions against a dongle.
pub trait Driver: Send + Sync {
    /// Open the dongle at `target`, delivering events through `callback`.
    ///
    /// Blocking: callers run it on a blocking worker.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the dongle cannot be opened.
    fn open(
        &self,
        target: &Path,
        callback: EventCallback,
    ) -> Result<Arc<dyn DriverSession>, DriverError>;
}

/// An open connection to the dongle.
pub trait DriverSession: Send + Sync {
    /// Put the dongle in pairing mode and wait for one sensor.
    ///
    /// Blocking, and not safe to call concurrently: the dongle runs one scan
    /// at a time. Returns `Ok(None)` when the dongle gave up without a result.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] on I/O failure or when the session is closed.
    fn scan(&self) -> Result<Option<ScanResult>, DriverError>;

    /// Stop the reader and release the dongle.
    fn stop(&self);
}

/// Errors reported by a driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The dongle could not be opened.
    #[error("failed to open dongle at {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the dongle failed.
    #[error("dongle I/O error")]
    Io(#[from] std::io::Error),

    /// The session was stopped.
    #[error("dongle session is closed")]
    Closed,
}
