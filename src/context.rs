//! Collaborators shared by every connection a host creates.

use crate::config::ListenerConfig;
use crate::dispatch::Dispatcher;
use crate::error::{ScannerError, ScannerResult};
use crate::port::{PortBackend, SystemBackend};
use crate::sink::{ErrorSink, TracingSink};
use std::sync::Arc;
use std::time::Duration;

/// The platform backend, owning-context dispatcher and error sink used by
/// connections, passed in explicitly at construction.
///
/// # Example
/// ```
/// use serial_scanner_agent::dispatch::OwningContext;
/// use serial_scanner_agent::port::MockBackend;
/// use serial_scanner_agent::ScannerContext;
///
/// let (_owner, dispatcher) = OwningContext::new();
/// let context = ScannerContext::new(dispatcher).with_backend(MockBackend::with_ports(["COM3"]));
/// assert_eq!(context.list_ports().unwrap(), vec!["COM3"]);
/// ```
#[derive(Clone)]
pub struct ScannerContext {
    backend: Arc<dyn PortBackend>,
    dispatcher: Arc<dyn Dispatcher>,
    sink: Arc<dyn ErrorSink>,
    poll_interval: Duration,
}

impl ScannerContext {
    /// Use the system serial ports and log errors through `tracing`.
    pub fn new(dispatcher: impl Dispatcher + 'static) -> Self {
        Self {
            backend: Arc::new(SystemBackend),
            dispatcher: Arc::new(dispatcher),
            sink: Arc::new(TracingSink),
            poll_interval: ListenerConfig::default().poll_interval(),
        }
    }

    pub fn with_backend(mut self, backend: impl PortBackend + 'static) -> Self {
        self.backend = Arc::new(backend);
        self
    }

    pub fn with_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn with_listener_config(mut self, listener: &ListenerConfig) -> Self {
        self.poll_interval = listener.poll_interval();
        self
    }

    /// Names of the ports the backend currently reports.
    pub fn list_ports(&self) -> ScannerResult<Vec<String>> {
        self.backend.enumerate().map_err(ScannerError::Discovery)
    }

    pub(crate) fn backend(&self) -> &dyn PortBackend {
        self.backend.as_ref()
    }

    pub(crate) fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub(crate) fn sink(&self) -> &Arc<dyn ErrorSink> {
        &self.sink
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl std::fmt::Debug for ScannerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerContext")
            .field("backend", &self.backend)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
