//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `sensebridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use sensebridge_adapter_dongle::SimulatedConfig;
use sensebridge_app::session::{DeviceTarget, SessionConfig};
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::sensor::InitialState;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Dongle selection and the simulated dongle's script.
    pub dongle: DongleConfig,
    /// Discovery scan settings.
    pub discovery: DiscoveryConfig,
    /// Forced startup state per paired sensor (`"on"` / `"off"`).
    pub initial_state: BTreeMap<String, String>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DongleConfig {
    /// `auto` to probe `/sys/class/hidraw`, or an explicit device path.
    pub device: String,
    pub simulated: SimulatedConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Hard limit on one scan, in seconds.
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from `sensebridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("sensebridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SENSEBRIDGE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SENSEBRIDGE_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("SENSEBRIDGE_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SENSEBRIDGE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SENSEBRIDGE_DEVICE") {
            self.dongle.device = val;
        }
        if let Ok(val) = std::env::var("SENSEBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.discovery.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "discovery timeout must be non-zero".to_string(),
            ));
        }
        self.initial_states()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Parsed `[initial_state]` table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a malformed identifier or a
    /// value other than `on` / `off`.
    pub fn initial_states(&self) -> Result<BTreeMap<DeviceIdentifier, InitialState>, ConfigError> {
        self.initial_state
            .iter()
            .map(|(mac, state)| {
                let id = DeviceIdentifier::parse(mac.as_str())
                    .map_err(|err| ConfigError::Validation(format!("initial_state.{mac}: {err}")))?;
                let state = state
                    .parse::<InitialState>()
                    .map_err(|err| ConfigError::Validation(format!("initial_state.{mac}: {err}")))?;
                Ok((id, state))
            })
            .collect()
    }

    /// Session settings for the bridge.
    ///
    /// # Errors
    ///
    /// Same as [`initial_states`](Self::initial_states).
    pub fn session(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig {
            target: DeviceTarget::from(self.dongle.device.as_str()),
            scan_timeout: Duration::from_secs(self.discovery.timeout_secs),
            initial_states: self.initial_states()?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:sensebridge.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sensebridged=info,sensebridge=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for DongleConfig {
    fn default() -> Self {
        Self {
            device: DeviceTarget::Auto.to_string(),
            simulated: SimulatedConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
