//! Configuration structures for the clock daemon.
//!
//! Supports TOML deserialization with sensible defaults for local use.
//! Every section may be omitted.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Period between ticks. One tick advances the clock by one second.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Initial position of the hands at startup.
    pub start_mode: StartMode,

    /// HTTP query/command endpoint configuration.
    pub web: WebConfig,

    /// Snapshot publishing configuration.
    pub publish: PublishConfig,

    /// File mailbox configuration.
    pub mailbox: MailboxConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            start_mode: StartMode::default(),
            web: WebConfig::default(),
            publish: PublishConfig::default(),
            mailbox: MailboxConfig::default(),
        }
    }
}

/// Where the hands start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    /// Synchronize with the wall clock before the first tick.
    #[default]
    WallClock,
    /// Start at 12:00:00.
    Midnight,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the HTTP endpoints.
    pub enabled: bool,

    /// Address to bind the server to.
    pub bind_addr: SocketAddr,

    /// Send permissive CORS headers so a browser renderer on another origin can poll.
    pub enable_cors: bool,

    /// WebSocket broadcast channel capacity.
    pub ws_channel_capacity: usize,

    /// Serve files from this directory for paths no route matches, so a
    /// browser renderer loads from the origin it polls.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            enable_cors: true,
            ws_channel_capacity: 64,
            static_dir: None,
        }
    }
}

/// Snapshot publishing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Write each published snapshot to this JSON file.
    pub snapshot_path: Option<PathBuf>,
}

/// File mailbox configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Directory polled for `set_alarm.json`, `set_time.json`,
    /// `sync_time.json`, and `clear_alarm.json` before every tick.
    pub dir: Option<PathBuf>,
}

impl ClockConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or describes an unusable clock.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check values that parse but cannot drive a clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be greater than zero".into(),
            ));
        }
        if self.web.ws_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "web.ws_channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
