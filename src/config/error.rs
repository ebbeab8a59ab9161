//! Errors raised while reading scanner settings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading settings or turning them into
/// connection parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named settings file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The settings file exists but could not be read.
    #[error("Failed to read configuration file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for the `[scanner]`, `[listener]`
    /// and `[logging]` layout.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A line setting such as baud rate or parity has a value no scanner
    /// port accepts. `key` names the setting.
    #[error("Invalid configuration value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    /// A `SERIAL_SCANNER_*` override could not be parsed.
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParseError { var: String, message: String },

    /// No port name was configured.
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// A parameter provider could not produce a settings record.
    #[error("Parameter provider failed: {0}")]
    Provider(String),
}

impl ConfigError {
    pub fn validation<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse<V: Into<String>, M: Into<String>>(var: V, message: M) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
