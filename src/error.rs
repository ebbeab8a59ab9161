//! Unified error type for scanner connections.
//!
//! Three failure families reach callers and the error sink: settings that
//! cannot be turned into line parameters, ports that cannot be opened, and
//! reads that fail while a port is listening.

use crate::config::ConfigError;
use crate::port::PortError;
use thiserror::Error;

/// A specialized `Result` type for scanner operations.
pub type ScannerResult<T> = Result<T, ScannerError>;

#[derive(Debug, Error)]
pub enum ScannerError {
    /// Parameter lookup or parsing failed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The port could not be activated.
    #[error("Failed to open '{port}': {source}")]
    Connection {
        port: String,
        #[source]
        source: PortError,
    },

    /// A read on an open port failed.
    #[error("Read failed on '{port}': {source}")]
    Io {
        port: String,
        #[source]
        source: PortError,
    },

    /// Enumerating the available ports failed.
    #[error("Could not list serial ports: {0}")]
    Discovery(#[source] PortError),
}

impl ScannerError {
    pub fn connection(port: impl Into<String>, source: PortError) -> Self {
        Self::Connection {
            port: port.into(),
            source,
        }
    }

    pub fn io(port: impl Into<String>, source: PortError) -> Self {
        Self::Io {
            port: port.into(),
            source,
        }
    }

    /// The port this error concerns, when there is one.
    pub fn port(&self) -> Option<&str> {
        match self {
            Self::Connection { port, .. } | Self::Io { port, .. } => Some(port),
            Self::Configuration(_) | Self::Discovery(_) => None,
        }
    }
}
