//! Configuration schema definitions.
//!
//! The `[scanner]` section keeps its line settings as text, the way the
//! settings file has always stored them; they are only validated when
//! converted into [`ConnectionParameters`]. Numeric fields accept either a
//! TOML integer or a string.

use super::error::{ConfigError, ConfigResult};
use crate::params::{ConnectionParameters, DataBits, Parity, StopBits};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner line settings
    pub scanner: ScannerConfig,
    /// Reader thread settings
    pub listener: ListenerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Accept `9600` as well as `"9600"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

/// Scanner line settings section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Port used when no name is given explicitly
    pub current_port_name: String,
    /// Baud rate
    #[serde(deserialize_with = "string_or_number")]
    pub baud_rate: String,
    /// Parity name: none, odd, even, mark, space
    pub parity: String,
    /// Data bits, 4 to 8
    #[serde(deserialize_with = "string_or_number")]
    pub data_bits: String,
    /// Stop bits name: one, one_point_five, two
    pub stop_bits: String,
    /// Friendly names for ports
    pub port_aliases: HashMap<String, String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            current_port_name: "COM1".to_string(),
            baud_rate: "9600".to_string(),
            parity: "None".to_string(),
            data_bits: "8".to_string(),
            stop_bits: "One".to_string(),
            port_aliases: HashMap::new(),
        }
    }
}

impl ScannerConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Validate the line settings for `port_name`, or for
    /// `current_port_name` when no name is given.
    pub fn to_parameters(&self, port_name: Option<&str>) -> ConfigResult<ConnectionParameters> {
        let port_name = match port_name {
            Some(name) => self.resolve_port(name),
            None => self.resolve_port(&self.current_port_name),
        };
        let baud_rate = self.baud_rate.trim().parse::<u32>().map_err(|_| {
            ConfigError::validation(
                "baud_rate",
                format!("'{}' is not a positive integer", self.baud_rate),
            )
        })?;

        ConnectionParameters::new(
            port_name,
            baud_rate,
            Parity::from_str(&self.parity)?,
            DataBits::from_str(&self.data_bits)?,
            StopBits::from_str(&self.stop_bits)?,
        )
    }
}

/// Reader thread settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Longest a reader waits on the port before checking for shutdown
    pub poll_interval_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
        }
    }
}

impl ListenerConfig {
    /// Get the poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{other}'"),
            )),
        }
    }
}
