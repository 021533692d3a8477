//! Console configuration with TOML file support.

use metis_client::BuildClient;
use metis_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::ConsoleError;

/// Configuration for the build console.
///
/// Can be loaded from a TOML file via [`ConsoleConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Base URL of the build backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Whole-request timeout for backend calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout for backend calls, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Rows per history page; a shorter page means there are no more.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,

    /// Days the backend keeps a finished build before cleaning it up.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Countdown refresh period, in milliseconds.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,

    /// Task state polling period, in milliseconds.
    #[serde(default = "default_task_poll_interval_ms")]
    pub task_poll_interval_ms: u64,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_history_page_size() -> u32 {
    50
}

fn default_retention_days() -> u32 {
    metis_types::time::DEFAULT_RETENTION_DAYS
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

fn default_task_poll_interval_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ConsoleConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConsoleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConsoleError> {
        let config: Self = toml::from_str(s).map_err(|e| ConsoleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConsoleError> {
        toml::to_string_pretty(self).map_err(|e| ConsoleError::Config(e.to_string()))
    }

    /// Reject values that would stall polling or paging.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.history_page_size == 0 {
            return Err(ConsoleError::Config("history_page_size must be positive".into()));
        }
        if self.countdown_tick_ms == 0 || self.task_poll_interval_ms == 0 {
            return Err(ConsoleError::Config("polling intervals must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn task_poll_interval(&self) -> Duration {
        Duration::from_millis(self.task_poll_interval_ms)
    }

    /// HTTP client for the configured backend.
    pub fn build_client(&self) -> BuildClient {
        BuildClient::with_timeouts(
            &self.api_base_url,
            self.request_timeout(),
            self.connect_timeout(),
        )
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            history_page_size: default_history_page_size(),
            retention_days: default_retention_days(),
            countdown_tick_ms: default_countdown_tick_ms(),
            task_poll_interval_ms: default_task_poll_interval_ms(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}
