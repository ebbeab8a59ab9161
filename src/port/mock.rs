//! Mock serial port and backend for testing.
//!
//! `MockSerialPort` delivers injected byte bursts to `read_existing`, one
//! burst per call, which mirrors one "data received" event on real
//! hardware. `MockBackend` plays the platform: it lists a configurable set
//! of port names, refuses selected ones, and tracks which ports are held so
//! that "already in use" and "released on close" can be asserted.

use super::error::PortError;
use super::traits::{PortBackend, SerialPortAdapter};
use crate::params::ConnectionParameters;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Names of ports currently held, shared between a backend and its ports.
type Registry = Arc<Mutex<HashSet<String>>>;

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug)]
struct MockPortState {
    /// Bursts waiting to be returned by `read_existing`.
    bursts: VecDeque<Vec<u8>>,
    /// Errors to return from the next reads, ahead of any bursts.
    read_errors: VecDeque<std::io::ErrorKind>,
    /// Whether the simulated resource is held.
    open: bool,
    /// How long `read_existing` waits for a burst.
    timeout: Duration,
    /// Number of `close` calls that actually released the port.
    releases: usize,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MockPortState>,
    arrived: Condvar,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep a clone and inject data while the
/// connection under test owns the other.
///
/// # Example
/// ```
/// use serial_scanner_agent::port::{MockSerialPort, PortError, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.inject(b"A1234\r\n");
///
/// assert_eq!(port.read_existing().unwrap(), b"A1234\r\n");
/// assert!(port.read_existing().unwrap().is_empty());
///
/// port.close().unwrap();
/// assert_eq!(port.release_count(), 1);
/// assert!(matches!(port.read_existing(), Err(PortError::NotOpen)));
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    shared: Arc<Shared>,
    registry: Option<Registry>,
}

impl MockSerialPort {
    /// Create a new, open mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                state: Mutex::new(MockPortState {
                    bursts: VecDeque::new(),
                    read_errors: VecDeque::new(),
                    open: true,
                    timeout: Duration::from_millis(10),
                    releases: 0,
                }),
                arrived: Condvar::new(),
            }),
            registry: None,
        }
    }

    fn registered(name: &str, registry: Registry) -> Self {
        let mut port = Self::new(name);
        port.registry = Some(registry);
        port
    }

    /// Queue one arrival event.
    pub fn inject(&self, data: &[u8]) {
        let mut state = self.shared.state.lock();
        state.bursts.push_back(data.to_vec());
        self.shared.arrived.notify_all();
    }

    /// Make the next read fail with an I/O error of the given kind.
    pub fn fail_next_read(&self, kind: std::io::ErrorKind) {
        let mut state = self.shared.state.lock();
        state.read_errors.push_back(kind);
        self.shared.arrived.notify_all();
    }

    /// Number of bursts not yet read.
    pub fn pending_bursts(&self) -> usize {
        self.shared.state.lock().bursts.len()
    }

    /// Number of times the port was actually released.
    pub fn release_count(&self) -> usize {
        self.shared.state.lock().releases
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn read_existing(&mut self) -> Result<Vec<u8>, PortError> {
        let mut state = self.shared.state.lock();
        if !state.open {
            return Err(PortError::NotOpen);
        }

        if state.bursts.is_empty() && state.read_errors.is_empty() {
            let timeout = state.timeout;
            self.shared.arrived.wait_for(&mut state, timeout);
        }

        if let Some(kind) = state.read_errors.pop_front() {
            return Err(PortError::Io(std::io::Error::new(kind, "injected read failure")));
        }

        Ok(state.bursts.pop_front().unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.shared.state.lock().timeout = timeout;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        let mut state = self.shared.state.lock();
        if !state.open {
            return Ok(());
        }
        state.open = false;
        state.releases += 1;
        self.shared.arrived.notify_all();
        drop(state);

        if let Some(registry) = &self.registry {
            registry.lock().remove(&self.name);
        }
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("pending_bursts", &self.pending_bursts())
            .finish()
    }
}

#[derive(Debug, Default)]
struct BackendState {
    ports: Vec<String>,
    refused: HashMap<String, String>,
    enumeration_error: Option<String>,
    opened: HashMap<String, MockSerialPort>,
    open_attempts: HashMap<String, usize>,
}

/// In-memory `PortBackend` for tests.
///
/// # Example
/// ```
/// use serial_scanner_agent::port::{MockBackend, PortBackend};
///
/// let backend = MockBackend::with_ports(["COM1", "COM3"]);
/// backend.refuse("COM1", "device unplugged");
/// assert_eq!(backend.enumerate().unwrap(), vec!["COM1", "COM3"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
    in_use: Registry,
}

impl MockBackend {
    /// Create a backend exposing the given port names, in order.
    pub fn with_ports<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        backend.state.lock().ports = names.into_iter().map(Into::into).collect();
        backend
    }

    /// Make every open of `name` fail with a configuration error.
    pub fn refuse(&self, name: &str, reason: &str) {
        self.state
            .lock()
            .refused
            .insert(name.to_string(), reason.to_string());
    }

    /// Make `enumerate` fail.
    pub fn fail_enumeration(&self, reason: &str) {
        self.state.lock().enumeration_error = Some(reason.to_string());
    }

    /// Simulate another process holding `name`.
    pub fn occupy(&self, name: &str) {
        self.in_use.lock().insert(name.to_string());
    }

    /// The most recently opened port with this name, for injecting data.
    pub fn port(&self, name: &str) -> Option<MockSerialPort> {
        self.state.lock().opened.get(name).cloned()
    }

    /// Whether a port with this name is currently held.
    pub fn is_in_use(&self, name: &str) -> bool {
        self.in_use.lock().contains(name)
    }

    /// How many times opening `name` was attempted.
    pub fn open_attempts(&self, name: &str) -> usize {
        self.state
            .lock()
            .open_attempts
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

impl PortBackend for MockBackend {
    fn enumerate(&self) -> Result<Vec<String>, PortError> {
        let state = self.state.lock();
        match &state.enumeration_error {
            Some(reason) => Err(PortError::Enumeration(reason.clone())),
            None => Ok(state.ports.clone()),
        }
    }

    fn open(
        &self,
        params: &ConnectionParameters,
        poll_timeout: Duration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let name = params.port_name();
        let mut state = self.state.lock();
        *state.open_attempts.entry(name.to_string()).or_default() += 1;

        if !state.ports.iter().any(|p| p == name) {
            return Err(PortError::not_found(name));
        }
        if let Some(reason) = state.refused.get(name) {
            return Err(PortError::config(reason.clone()));
        }

        // Same restrictions as the serialport binding.
        let _: serialport::Parity = params.parity().try_into()?;
        let _: serialport::DataBits = params.data_bits().try_into()?;
        let _: serialport::StopBits = params.stop_bits().try_into()?;

        let mut in_use = self.in_use.lock();
        if !in_use.insert(name.to_string()) {
            return Err(PortError::in_use(name));
        }
        drop(in_use);

        let mut port = MockSerialPort::registered(name, Arc::clone(&self.in_use));
        port.set_timeout(poll_timeout)?;
        state.opened.insert(name.to_string(), port.clone());
        Ok(Box::new(port))
    }
}
