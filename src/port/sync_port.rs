//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter`, and exposes the system port list as a `PortBackend`.

use super::error::PortError;
use super::traits::{PortBackend, SerialPortAdapter};
use crate::params::ConnectionParameters;
use std::io::Read;
use std::time::Duration;

/// Size of a single read from the driver buffer.
const READ_CHUNK: usize = 256;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port, `None` once released.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given parameters.
    ///
    /// # Example
    /// ```no_run
    /// use serial_scanner_agent::port::SyncSerialPort;
    /// use serial_scanner_agent::{ConnectionParameters, DataBits, Parity, StopBits};
    /// use std::time::Duration;
    ///
    /// let params =
    ///     ConnectionParameters::new("COM3", 9600, Parity::None, DataBits::Eight, StopBits::One)?;
    /// let port = SyncSerialPort::open(&params, Duration::from_millis(50))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(params: &ConnectionParameters, timeout: Duration) -> Result<Self, PortError> {
        let port_name = params.port_name();
        let port = serialport::new(port_name, params.baud_rate())
            .data_bits(params.data_bits().try_into()?)
            .parity(params.parity().try_into()?)
            .stop_bits(params.stop_bits().try_into()?)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
                | serialport::ErrorKind::Io(std::io::ErrorKind::AddrInUse) => {
                    PortError::in_use(port_name)
                }
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::NotOpen)
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn read_existing(&mut self) -> Result<Vec<u8>, PortError> {
        let port = self.port_mut()?;
        let mut chunk = [0u8; READ_CHUNK];

        // The first read blocks up to the timeout; the rest only drain what
        // the driver already holds.
        let mut data = match port.read(&mut chunk) {
            Ok(n) => chunk[..n].to_vec(),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(Vec::new()),
            Err(e) => return Err(PortError::Io(e)),
        };

        while port.bytes_to_read().unwrap_or(0) > 0 {
            match port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => data.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(PortError::Io(e)),
            }
        }

        Ok(data)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port_mut()?
            .set_timeout(timeout)
            .map_err(PortError::Serial)
    }

    fn close(&mut self) -> Result<(), PortError> {
        // Dropping the boxed port closes the file descriptor / handle.
        self.port.take();
        Ok(())
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// `PortBackend` over the ports reported by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl PortBackend for SystemBackend {
    fn enumerate(&self) -> Result<Vec<String>, PortError> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .map_err(|e| PortError::Enumeration(e.to_string()))
    }

    fn open(
        &self,
        params: &ConnectionParameters,
        poll_timeout: Duration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(SyncSerialPort::open(params, poll_timeout)?))
    }
}
