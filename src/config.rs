//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `hub.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: where to listen and how long a request may take.
//!     - LoggingConfig: default log level and whether to log every reading.
//!
//! the pressure threshold, the 4095 full-scale value and the 5s / 30s status
//! windows are fixed constants in domain.rs, not configuration.
//!
//! ==============================================================================

use anyhow::Context;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5002,
            request_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// log each accepted reading at info instead of debug
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_sensor_data: true,
        }
    }
}

impl HubConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// First existing config file in the search path, if any
    pub fn find() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config").join("hub.toml"),
            PathBuf::from("..").join("config").join("hub.toml"),
        ];
        paths.into_iter().find(|path| path.exists())
    }

    /// Load from the search path, or defaults when no file exists.
    ///
    /// A file that exists but does not parse is an error, not a silent fallback.
    pub fn load_or_default() -> anyhow::Result<(Self, Option<PathBuf>)> {
        match Self::find() {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.bind_address, self.server.port);
        addr.parse::<SocketAddr>()
            .with_context(|| format!("Invalid listen address {addr}"))
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        log::info!("┌─────────────────────────────────────────┐");
        log::info!("│            HUB CONFIGURATION            │");
        log::info!("├─────────────────────────────────────────┤");
        log::info!("│ Listen: {}:{}", self.server.bind_address, self.server.port);
        log::info!("│ Request Timeout: {}ms", self.server.request_timeout_ms);
        log::info!("│ Log Level: {}", self.logging.level);
        log::info!("│ Show Sensor Data: {}", self.logging.show_sensor_data);
        log::info!("└─────────────────────────────────────────┘");
    }
}
