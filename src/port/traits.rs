//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` is one open port; `PortBackend` is the platform that
//! enumerates and opens them. Both have a `serialport`-backed implementation
//! and a mock, so the connection lifecycle can be tested without hardware.

use super::error::PortError;
use crate::params::ConnectionParameters;
use std::time::Duration;

/// Trait for one open serial port.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Wait up to the port timeout for data, then return every byte that is
    /// currently buffered.
    ///
    /// Returns an empty vector when nothing arrived before the timeout.
    fn read_existing(&mut self) -> Result<Vec<u8>, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the timeout used by `read_existing`.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Release the platform resource.
    ///
    /// Closing an already released port is a no-op.
    fn close(&mut self) -> Result<(), PortError>;
}

/// The platform capability that lists and opens ports.
pub trait PortBackend: Send + Sync + std::fmt::Debug {
    /// Names of the ports currently present on the system.
    fn enumerate(&self) -> Result<Vec<String>, PortError>;

    /// Open a port with the given line parameters.
    ///
    /// `poll_timeout` bounds how long a single `read_existing` call may block.
    fn open(
        &self,
        params: &ConnectionParameters,
        poll_timeout: Duration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
