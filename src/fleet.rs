//! Managing every scanner port under one callback.
//!
//! A [`PortFleetManager`] is built in one of two modes, fixed for its
//! lifetime: *fleet* mode holds one connection per discovered port, *single*
//! mode holds at most one connection for a named or explicit port. Every
//! connection reads the same callback slot, so arrivals from all ports fan
//! in to whatever callback is currently assigned.
//!
//! Discovery and named construction never fail: each problem is sent to
//! the error sink and kept as an [`ActivationFailure`], and the affected
//! port is left out. Construction from explicit parameters returns its
//! error instead.

use crate::callback::{Callback, CallbackSlot};
use crate::config::ParameterProvider;
use crate::context::ScannerContext;
use crate::error::{ScannerError, ScannerResult};
use crate::handle::{ConnectionHandle, ConnectionState};
use crate::params::ConnectionParameters;
use crate::worker::run_on_close_worker;
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, info};

/// Which construction path a manager came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetMode {
    Single,
    Fleet,
}

/// A port that could not be brought up, and why.
#[derive(Debug)]
pub struct ActivationFailure {
    /// `None` when enumeration itself failed.
    pub port: Option<String>,
    pub error: ScannerError,
}

enum Connections {
    Single(Option<ConnectionHandle>),
    Fleet(Vec<ConnectionHandle>),
}

/// Owns the scanner connections of one host and closes them together.
///
/// # Example
/// ```
/// use serial_scanner_agent::config::{ScannerConfig, StaticParameterProvider};
/// use serial_scanner_agent::dispatch::OwningContext;
/// use serial_scanner_agent::port::MockBackend;
/// use serial_scanner_agent::{PortFleetManager, ScannerContext};
///
/// let backend = MockBackend::with_ports(["COM1", "COM3"]);
/// backend.refuse("COM1", "modem, not a scanner");
///
/// let (_owner, dispatcher) = OwningContext::new();
/// let context = ScannerContext::new(dispatcher).with_backend(backend);
/// let provider = StaticParameterProvider::new(ScannerConfig::default());
///
/// let manager = PortFleetManager::discover_all(context, &provider, None);
/// assert_eq!(manager.active_ports(), vec!["COM3"]);
/// assert_eq!(manager.failures().len(), 1);
/// manager.close();
/// ```
pub struct PortFleetManager {
    connections: Connections,
    callback: CallbackSlot,
    failures: Vec<ActivationFailure>,
}

impl PortFleetManager {
    /// Open every port the backend reports, each with a fresh provider lookup.
    ///
    /// `on_scan` is in place before the first port opens.
    pub fn discover_all(
        context: ScannerContext,
        provider: &dyn ParameterProvider,
        on_scan: Option<Callback>,
    ) -> Self {
        let callback = slot_with(on_scan);
        let mut failures = Vec::new();

        let names = match context.list_ports() {
            Ok(names) => names,
            Err(e) => {
                record(&context, &mut failures, None, e);
                Vec::new()
            }
        };

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let opened = lookup(provider, Some(&name))
                .and_then(|params| open_one(&context, &callback, &params));
            match opened {
                Ok(handle) => handles.push(handle),
                Err(e) => record(&context, &mut failures, Some(name), e),
            }
        }

        info!(
            active = handles.len(),
            failed = failures.len(),
            "Scanner discovery finished"
        );

        Self {
            connections: Connections::Fleet(handles),
            callback,
            failures,
        }
    }

    /// Open one port by name, or the configured current port when `name` is
    /// `None`. A failure is recorded and leaves the manager inert.
    pub fn with_port_name(
        context: ScannerContext,
        provider: &dyn ParameterProvider,
        name: Option<&str>,
        on_scan: Option<Callback>,
    ) -> Self {
        let callback = slot_with(on_scan);
        let mut failures = Vec::new();

        let handle = match lookup(provider, name)
            .and_then(|params| open_one(&context, &callback, &params))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                let port = e.port().map(str::to_string).or(name.map(str::to_string));
                record(&context, &mut failures, port, e);
                None
            }
        };

        Self {
            connections: Connections::Single(handle),
            callback,
            failures,
        }
    }

    /// Open one port with caller-supplied parameters.
    ///
    /// # Errors
    ///
    /// `ScannerError::Connection` if the port cannot be activated.
    pub fn with_parameters(
        context: ScannerContext,
        params: &ConnectionParameters,
        on_scan: Option<Callback>,
    ) -> ScannerResult<Self> {
        let callback = slot_with(on_scan);
        let handle = open_one(&context, &callback, params)?;

        Ok(Self {
            connections: Connections::Single(Some(handle)),
            callback,
            failures: Vec::new(),
        })
    }

    /// Assign the callback every connection forwards to.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.callback.set(callback);
    }

    pub fn clear_callback(&self) {
        self.callback.clear();
    }

    pub fn mode(&self) -> FleetMode {
        match self.connections {
            Connections::Single(_) => FleetMode::Single,
            Connections::Fleet(_) => FleetMode::Fleet,
        }
    }

    fn handles(&self) -> &[ConnectionHandle] {
        match &self.connections {
            Connections::Single(handle) => handle.as_slice(),
            Connections::Fleet(handles) => handles,
        }
    }

    /// Names of the ports that are currently open, in discovery order.
    pub fn active_ports(&self) -> Vec<String> {
        self.handles()
            .iter()
            .filter(|h| h.is_open())
            .filter_map(ConnectionHandle::port_name)
            .collect()
    }

    /// Problems met during construction.
    pub fn failures(&self) -> &[ActivationFailure] {
        &self.failures
    }

    /// True when no port is open; the callback will never be invoked.
    pub fn is_inert(&self) -> bool {
        !self.handles().iter().any(ConnectionHandle::is_open)
    }

    /// Close every connection. Safe from any thread, any number of times.
    ///
    /// In fleet mode all ports are released in sequence on a single worker
    /// thread; connections that are already closed are skipped.
    pub fn close(&self) {
        match &self.connections {
            Connections::Single(Some(handle)) => handle.close(),
            Connections::Single(None) => {}
            Connections::Fleet(handles) => {
                if handles
                    .iter()
                    .all(|h| h.state() == ConnectionState::Closed)
                {
                    return;
                }
                let caller = thread::current().id();
                run_on_close_worker("fleet", || {
                    let mut closed = 0usize;
                    for handle in handles {
                        if handle.close_in_place(caller) {
                            closed += 1;
                        }
                    }
                    debug!(closed, "Fleet close finished");
                });
            }
        }
    }

    /// A `'static` closure that closes this manager if it still exists.
    pub fn close_hook(self: &Arc<Self>) -> impl Fn() + Send + Sync + 'static {
        let weak: Weak<Self> = Arc::downgrade(self);
        move || {
            if let Some(manager) = weak.upgrade() {
                manager.close();
            }
        }
    }
}

impl Drop for PortFleetManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PortFleetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortFleetManager")
            .field("mode", &self.mode())
            .field("active_ports", &self.active_ports())
            .field("failures", &self.failures.len())
            .finish()
    }
}

fn slot_with(on_scan: Option<Callback>) -> CallbackSlot {
    let slot = CallbackSlot::new();
    if let Some(callback) = on_scan {
        slot.set_shared(callback);
    }
    slot
}

fn lookup(
    provider: &dyn ParameterProvider,
    name: Option<&str>,
) -> ScannerResult<ConnectionParameters> {
    Ok(provider.lookup()?.to_parameters(name)?)
}

fn open_one(
    context: &ScannerContext,
    callback: &CallbackSlot,
    params: &ConnectionParameters,
) -> ScannerResult<ConnectionHandle> {
    let handle = ConnectionHandle::with_callback_slot(context.clone(), callback.clone());
    handle.activate(params)?;
    Ok(handle)
}

fn record(
    context: &ScannerContext,
    failures: &mut Vec<ActivationFailure>,
    port: Option<String>,
    error: ScannerError,
) {
    context.sink().record(&error);
    failures.push(ActivationFailure { port, error });
}
