//! Identity store port — the durable set of every sensor ever paired.

use std::collections::BTreeSet;
use std::future::Future;

use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;

/// Namespace the identity set is stored under.
pub const STORAGE_KEY: &str = "sensebridge";

/// Format version written alongside the identity set.
pub const STORAGE_VERSION: i64 = 1;

/// Durable map from [`STORAGE_KEY`] to the set of paired identifiers.
pub trait IdentityStore {
    /// Load the stored set. An absent record is an empty set, not an error.
    fn load(&self) -> impl Future<Output = Result<BTreeSet<DeviceIdentifier>, BridgeError>> + Send;

    /// Replace the stored set with `identifiers`.
    fn save(
        &self,
        identifiers: &BTreeSet<DeviceIdentifier>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
