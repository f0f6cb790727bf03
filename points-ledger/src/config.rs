//! Configuration for the ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address
    pub http_listen_addr: String,

    /// Actor mailbox capacity (requests queued before callers wait)
    pub mailbox_capacity: usize,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "points-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            http_listen_addr: "0.0.0.0:3001".to_string(),
            mailbox_capacity: 1000,
            log_format: LogFormat::Text,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(crate::Error::Config(format!("Unknown log format: {}", other))),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables on top of the defaults
    pub fn from_env() -> crate::Result<Self> {
        Config::default().with_env_overrides()
    }

    /// Apply `POINTS_*` environment overrides
    pub fn with_env_overrides(mut self) -> crate::Result<Self> {
        if let Ok(addr) = std::env::var("POINTS_HTTP_ADDR") {
            self.http_listen_addr = addr;
        }

        if let Ok(capacity) = std::env::var("POINTS_MAILBOX_CAPACITY") {
            self.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid POINTS_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(format) = std::env::var("POINTS_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        Ok(self)
    }
}
