//! # sensebridged — sensebridge daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file) and initialise logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the identity store, the hub platform and the dongle driver
//! - Start the bridge session; keep serving HTTP even when it fails
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT), then stop the bridge
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sensebridge_adapter_dongle::SimulatedDongle;
use sensebridge_adapter_dongle::probe::{HIDRAW_CLASS_DIR, find_dongle};
use sensebridge_adapter_http_axum::state::AppState;
use sensebridge_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteEntityRepository, SqliteIdentityStore,
};
use sensebridge_app::event_bus::InProcessEventBus;
use sensebridge_app::services::host_platform::HubPlatform;
use sensebridge_app::session::Bridge;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Host platform
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let host = HubPlatform::new(SqliteEntityRepository::new(pool.clone()), Arc::clone(&event_bus));
    let store = SqliteIdentityStore::new(pool);

    // Bridge session
    let driver = Arc::new(SimulatedDongle::new(config.dongle.simulated.clone()));
    let bridge = match Bridge::start(driver, store, host, config.session()?, probe).await {
        Ok(bridge) => {
            tracing::info!(device = %bridge.device().display(), "bridge session running");
            Some(bridge)
        }
        Err(err) => {
            tracing::error!(%err, "failed to start bridge session, serving without it");
            None
        }
    };

    // HTTP
    let state = match &bridge {
        Some(bridge) => AppState::running(
            bridge.handle().clone(),
            bridge.discovery(),
            Arc::clone(&event_bus),
        ),
        None => AppState::offline(Arc::clone(&event_bus)),
    };
    let app = sensebridge_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "sensebridged listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(bridge) = bridge {
        bridge.shutdown().await;
    }
    tracing::info!("sensebridged stopped");

    Ok(())
}

fn probe() -> Option<PathBuf> {
    match find_dongle(Path::new(HIDRAW_CLASS_DIR)) {
        Ok(found) => found,
        Err(err) => {
            tracing::error!(%err, "dongle auto-probe failed");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
