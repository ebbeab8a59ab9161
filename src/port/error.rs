//! Port-specific error types.
//!
//! Kept separate from the configuration and top-level scanner errors so the
//! backend implementations only depend on this module.

use thiserror::Error;

/// Errors that can occur while opening, reading or releasing a serial port.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The port exists but another process (or handle) holds it.
    #[error("Serial port is already in use: {0}")]
    AlreadyInUse(String),

    /// The platform binding cannot express the requested line setting.
    #[error("Unsupported line setting: {0}")]
    Unsupported(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The platform rejected the port configuration.
    #[error("Configuration rejected: {0}")]
    Config(String),

    /// Attempted to use a port that has already been released.
    #[error("Port is not open")]
    NotOpen,

    /// Enumeration of the available ports failed.
    #[error("Port enumeration failed: {0}")]
    Enumeration(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create an AlreadyInUse error from a port name.
    pub fn in_use(port_name: impl Into<String>) -> Self {
        Self::AlreadyInUse(port_name.into())
    }

    /// Create an Unsupported error describing the rejected setting.
    pub fn unsupported(setting: impl Into<String>) -> Self {
        Self::Unsupported(setting.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the error means "nothing arrived before the poll timeout".
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
