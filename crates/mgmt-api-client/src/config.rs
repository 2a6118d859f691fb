// ============================================
// File: crates/mgmt-api-client/src/config.rs
// ============================================
//! # Client Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the management API client,
//! loaded from a TOML file and overridable from the command line.
//!
//! ## Main Functionality
//! - `ClientConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Defaults matching the management server's conventions
//!
//! ## Configuration Sections
//! - `server`: Management server host and port
//! - `fingerprint`: Fingerprint file location
//! - `transport`: Timeouts, user agent, fingerprint checking, proxy
//! - `query`: Page size and page ceiling for aggregated queries
//! - `tasks`: Task polling interval and optional deadline
//! - `logging`: Log level and optional debug file
//!
//! ## Example Configuration
//! ```toml
//! [server]
//! host = "mgmt.example.com"
//! port = 443
//!
//! [fingerprint]
//! file = "./fingerprints.txt"
//!
//! [transport]
//! connect_timeout_secs = 180
//! read_timeout_secs = 300
//! check_fingerprint = true
//! # proxy = "user:secret@proxy.local:3128"
//!
//! [query]
//! limit = 50
//!
//! [tasks]
//! poll_interval_secs = 2
//! # deadline_secs = 600
//!
//! [logging]
//! level = "info"
//! # debug_file = "./api_calls.json"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - An empty `server.host` is valid here; the CLI may supply it with `--server`
//! - Validate config before building a client
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use mgmt_api_common::types::{ServerEndpoint, DEFAULT_PORT};
use mgmt_api_core::store::DEFAULT_FINGERPRINT_FILE;
use mgmt_api_transport::TransportConfig;

use crate::error::{ClientError, Result};

// ============================================
// ClientConfig
// ============================================

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClientConfig {
    /// Management server address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Fingerprint file settings.
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    /// HTTPS transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Aggregated query settings.
    #[serde(default)]
    pub query: QueryConfig,

    /// Task polling settings.
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClientError::config_load(&path_str, e))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ClientError::config_load(&path_str, e))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the string cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ClientError::config_load("<string>", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.fingerprint.validate()?;
        self.query.validate()?;
        self.tasks.validate()?;
        self.logging.validate()?;

        self.transport
            .validate()
            .map_err(|e| ClientError::config_invalid("transport", e.to_string()))?;

        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// Server Section
// ============================================

/// Management server address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host name or IP address; empty when supplied on the command line.
    #[serde(default)]
    pub host: String,

    /// HTTPS port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ClientError::config_invalid("server.port", "must not be 0"));
        }
        Ok(())
    }

    /// Configured endpoint, `None` while no host is set.
    #[must_use]
    pub fn endpoint(&self) -> Option<ServerEndpoint> {
        let host = self.host.trim();
        (!host.is_empty()).then(|| ServerEndpoint::new(host, self.port))
    }
}

// ============================================
// Fingerprint Section
// ============================================

/// Fingerprint file settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FingerprintConfig {
    /// Path of the JSON fingerprint file.
    #[serde(default = "default_fingerprint_file")]
    pub file: PathBuf,
}

fn default_fingerprint_file() -> PathBuf {
    PathBuf::from(DEFAULT_FINGERPRINT_FILE)
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            file: default_fingerprint_file(),
        }
    }
}

impl FingerprintConfig {
    fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(ClientError::config_invalid(
                "fingerprint.file",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

// ============================================
// Query Section
// ============================================

/// Aggregated query settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryConfig {
    /// Items requested per page.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Pages fetched before giving up on a collection that never ends.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_limit() -> u32 {
    50
}

fn default_max_pages() -> u32 {
    10_000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_pages: default_max_pages(),
        }
    }
}

impl QueryConfig {
    fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(ClientError::config_invalid("query.limit", "must be at least 1"));
        }
        if self.max_pages == 0 {
            return Err(ClientError::config_invalid(
                "query.max_pages",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================
// Tasks Section
// ============================================

/// Task polling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TasksConfig {
    /// Wait for tasks started by a call before returning.
    #[serde(default = "default_wait")]
    pub wait: bool,

    /// Seconds between two status checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound on the total wait, unbounded when absent.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

fn default_wait() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    2
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            wait: default_wait(),
            poll_interval_secs: default_poll_interval(),
            deadline_secs: None,
        }
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(ClientError::config_invalid(
                "tasks.poll_interval_secs",
                "must be at least 1",
            ));
        }
        if self.deadline_secs == Some(0) {
            return Err(ClientError::config_invalid(
                "tasks.deadline_secs",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Deadline as a `Duration`.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

// ============================================
// Logging Section
// ============================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// File receiving a JSON record of every call.
    #[serde(default)]
    pub debug_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            debug_file: None,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ClientError::config_invalid(
                "logging.level",
                format!("unknown level '{}'", self.level),
            ));
        }
        Ok(())
    }
}

// ============================================
// Tests
// ============================================
