//! Shared application state for axum handlers.

use std::sync::Arc;

use sensebridge_app::coordinator::BridgeHandle;
use sensebridge_app::discovery::DiscoveryRunner;
use sensebridge_app::event_bus::InProcessEventBus;

/// Handles into a running bridge session.
#[derive(Clone)]
pub struct SessionState {
    pub handle: BridgeHandle,
    pub discovery: Arc<DiscoveryRunner>,
}

/// Application state shared across all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the bridge session failed to start.
    pub session: Option<SessionState>,
    /// Event bus for the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl AppState {
    /// State for a running bridge.
    #[must_use]
    pub fn running(
        handle: BridgeHandle,
        discovery: Arc<DiscoveryRunner>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            session: Some(SessionState { handle, discovery }),
            event_bus,
        }
    }

    /// State when no bridge session is available.
    #[must_use]
    pub fn offline(event_bus: Arc<InProcessEventBus>) -> Self {
        Self {
            session: None,
            event_bus,
        }
    }
}
