//! One scanner connection: activation, listening and release.
//!
//! # Lifecycle
//!
//! ```text
//! Closed ──activate ok──> Open ──close──> Closing ──worker done──> Closed (terminal)
//! Closed ──activate err─> Closed (terminal, nothing held)
//! ```
//!
//! A reader thread per open port stands in for the platform's
//! data-received event: it waits on the port, and every burst it reads is
//! decoded, trimmed and submitted to the owning context's dispatcher.
//! `close` may be called from any thread, any number of times; concurrent
//! callers all return once the port has been released.

use crate::callback::{Callback, CallbackSlot};
use crate::context::ScannerContext;
use crate::dispatch::Dispatcher;
use crate::error::{ScannerError, ScannerResult};
use crate::params::ConnectionParameters;
use crate::port::{PortError, SerialPortAdapter};
use crate::sink::ErrorSink;
use crate::worker::run_on_close_worker;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

type PortSlot = Arc<Mutex<Option<Box<dyn SerialPortAdapter>>>>;

/// Label used before a port name is known.
const UNBOUND: &str = "<unbound>";

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Never activated.
    Fresh,
    Opening,
    Open,
    Closing,
    /// Closed after an activation attempt; terminal.
    Retired,
}

impl Phase {
    fn state(self) -> ConnectionState {
        match self {
            Phase::Fresh | Phase::Retired => ConnectionState::Closed,
            Phase::Opening => ConnectionState::Opening,
            Phase::Open => ConnectionState::Open,
            Phase::Closing => ConnectionState::Closing,
        }
    }
}

struct Lifecycle {
    phase: Phase,
    port_name: Option<String>,
    listener: Option<JoinHandle<()>>,
    /// Id of the listener thread; kept after the join handle is taken.
    reader: Option<ThreadId>,
}

/// Decode one arrival burst the way it is handed to the callback.
///
/// Invalid UTF-8 sequences become U+FFFD; surrounding whitespace, including
/// the scanner's CR/LF suffix, is removed.
pub fn decode_burst(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

/// Hand one burst to the current callback on the owning context.
fn deliver(port_name: &str, raw: &[u8], callback: &CallbackSlot, dispatcher: &dyn Dispatcher) {
    let text = decode_burst(raw);
    let Some(action) = callback.current() else {
        trace!(port = %port_name, bytes = raw.len(), "No callback registered, discarding scan");
        return;
    };
    debug!(port = %port_name, bytes = raw.len(), "Scanner data received");
    dispatcher.submit(Box::new(move || action(text)));
}

/// Everything the reader thread needs, moved onto it.
struct Listener {
    port_name: String,
    slot: PortSlot,
    stop: Arc<AtomicBool>,
    callback: CallbackSlot,
    dispatcher: Arc<dyn Dispatcher>,
    sink: Arc<dyn ErrorSink>,
    backoff: Duration,
}

impl Listener {
    fn run(self) {
        debug!(port = %self.port_name, "Listener started");
        while !self.stop.load(Ordering::Acquire) {
            // The slot lock is held for at most one poll interval.
            let outcome = match self.slot.lock().as_mut() {
                Some(port) => port.read_existing(),
                None => break,
            };

            match outcome {
                Ok(raw) if raw.is_empty() => {}
                Ok(raw) => deliver(
                    &self.port_name,
                    &raw,
                    &self.callback,
                    self.dispatcher.as_ref(),
                ),
                Err(e) if e.is_timeout() => {}
                Err(PortError::NotOpen) => break,
                Err(e) => {
                    if self.stop.load(Ordering::Acquire) {
                        break;
                    }
                    self.sink.record(&ScannerError::io(&self.port_name, e));
                    thread::sleep(self.backoff);
                }
            }
        }
        debug!(port = %self.port_name, "Listener stopped");
    }
}

/// Owns one serial port and forwards what the scanner sends.
///
/// # Example
/// ```
/// use serial_scanner_agent::dispatch::OwningContext;
/// use serial_scanner_agent::port::MockBackend;
/// use serial_scanner_agent::{ConnectionHandle, ConnectionParameters, ScannerContext};
/// use serial_scanner_agent::{DataBits, Parity, StopBits};
///
/// let backend = MockBackend::with_ports(["COM3"]);
/// let (_owner, dispatcher) = OwningContext::new();
/// let context = ScannerContext::new(dispatcher).with_backend(backend.clone());
/// let params = ConnectionParameters::new("COM3", 9600, Parity::None, DataBits::Eight, StopBits::One)?;
///
/// let handle = ConnectionHandle::open(context, &params, None)?;
/// assert!(backend.is_in_use("COM3"));
///
/// handle.close();
/// assert!(!backend.is_in_use("COM3"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ConnectionHandle {
    context: ScannerContext,
    callback: CallbackSlot,
    lifecycle: Mutex<Lifecycle>,
    changed: Condvar,
    slot: PortSlot,
    stop: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// Create a handle with no port and no callback.
    pub fn new(context: ScannerContext) -> Self {
        Self::with_callback_slot(context, CallbackSlot::new())
    }

    /// Create a handle that reads its callback from a shared slot.
    pub fn with_callback_slot(context: ScannerContext, callback: CallbackSlot) -> Self {
        Self {
            context,
            callback,
            lifecycle: Mutex::new(Lifecycle {
                phase: Phase::Fresh,
                port_name: None,
                listener: None,
                reader: None,
            }),
            changed: Condvar::new(),
            slot: Arc::new(Mutex::new(None)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create and activate in one step. Errors are returned, not logged.
    pub fn open(
        context: ScannerContext,
        params: &ConnectionParameters,
        callback: Option<Callback>,
    ) -> ScannerResult<Self> {
        let handle = Self::new(context);
        if let Some(callback) = callback {
            handle.callback.set_shared(callback);
        }
        handle.activate(params)?;
        Ok(handle)
    }

    /// Open the port and start listening.
    ///
    /// # Errors
    ///
    /// `ScannerError::Connection` if the port is missing, held elsewhere,
    /// rejects the parameters, or this handle was already activated. The
    /// handle is left closed and holds nothing.
    pub fn activate(&self, params: &ConnectionParameters) -> ScannerResult<()> {
        let port_name = params.port_name().to_string();
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.phase != Phase::Fresh {
                return Err(ScannerError::connection(
                    port_name,
                    PortError::config("connection handle was already activated"),
                ));
            }
            lifecycle.phase = Phase::Opening;
            lifecycle.port_name = Some(port_name.clone());
        }

        match self.start(params) {
            Ok(listener) => {
                let mut lifecycle = self.lifecycle.lock();
                lifecycle.phase = Phase::Open;
                lifecycle.reader = Some(listener.thread().id());
                lifecycle.listener = Some(listener);
                self.changed.notify_all();
                info!(port = %port_name, params = %params, "Scanner port opened");
                Ok(())
            }
            Err(e) => {
                self.lifecycle.lock().phase = Phase::Retired;
                self.changed.notify_all();
                Err(ScannerError::connection(port_name, e))
            }
        }
    }

    fn start(&self, params: &ConnectionParameters) -> Result<JoinHandle<()>, PortError> {
        let port = self
            .context
            .backend()
            .open(params, self.context.poll_interval())?;
        *self.slot.lock() = Some(port);

        let listener = Listener {
            port_name: params.port_name().to_string(),
            slot: Arc::clone(&self.slot),
            stop: Arc::clone(&self.stop),
            callback: self.callback.clone(),
            dispatcher: Arc::clone(self.context.dispatcher()),
            sink: Arc::clone(self.context.sink()),
            backoff: self.context.poll_interval(),
        };

        thread::Builder::new()
            .name(format!("scanner-rx-{}", params.port_name()))
            .spawn(move || listener.run())
            .map_err(|e| {
                self.release();
                PortError::Io(e)
            })
    }

    /// Replace the callback. Later arrivals use the new one.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.callback.set(callback);
    }

    pub fn clear_callback(&self) {
        self.callback.clear();
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.lock().phase.state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// The port this handle was activated with.
    pub fn port_name(&self) -> Option<String> {
        self.lifecycle.lock().port_name.clone()
    }

    fn label(&self) -> String {
        self.port_name().unwrap_or_else(|| UNBOUND.to_string())
    }

    /// Deliver one arrival burst as if the port had produced it.
    ///
    /// The listener calls the same path for every burst it reads; hosts
    /// with their own event source can feed bytes through here.
    pub fn on_data_received(&self, raw: &[u8]) {
        deliver(
            &self.label(),
            raw,
            &self.callback,
            self.context.dispatcher().as_ref(),
        );
    }

    /// Release the port and stop listening.
    ///
    /// Never fails and never panics; release errors go to the error sink.
    /// The release itself runs on a dedicated worker thread that is joined
    /// before returning.
    pub fn close(&self) {
        let caller = thread::current().id();
        if !self.begin_close(caller) {
            return;
        }
        run_on_close_worker(&self.label(), || self.release());
        self.finish_close(caller);
    }

    /// Close without spawning a worker; the caller already is one.
    ///
    /// `caller` is the thread that requested the close. Returns whether this
    /// call performed the release.
    pub(crate) fn close_in_place(&self, caller: ThreadId) -> bool {
        if !self.begin_close(caller) {
            return false;
        }
        self.release();
        self.finish_close(caller);
        true
    }

    /// A `'static` closure that closes this handle if it still exists, for
    /// wiring into a host's "window closed" notification.
    pub fn close_hook(self: &Arc<Self>) -> impl Fn() + Send + Sync + 'static {
        let weak: Weak<Self> = Arc::downgrade(self);
        move || {
            if let Some(handle) = weak.upgrade() {
                handle.close();
            }
        }
    }

    /// Move Open to Closing. Waits out in-flight transitions; returns false
    /// when there is nothing (left) to close.
    ///
    /// The listener itself never waits on a close in flight: that close is
    /// joining it.
    fn begin_close(&self, caller: ThreadId) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        loop {
            match lifecycle.phase {
                Phase::Fresh | Phase::Retired => return false,
                Phase::Closing if lifecycle.reader == Some(caller) => return false,
                Phase::Opening | Phase::Closing => self.changed.wait(&mut lifecycle),
                Phase::Open => {
                    lifecycle.phase = Phase::Closing;
                    return true;
                }
            }
        }
    }

    fn release(&self) {
        self.stop.store(true, Ordering::Release);
        let port = self.slot.lock().take();
        if let Some(mut port) = port {
            if let Err(e) = port.close() {
                self.context
                    .sink()
                    .record(&ScannerError::io(port.name().to_string(), e));
            }
        }
    }

    fn finish_close(&self, caller: ThreadId) {
        let listener = self.lifecycle.lock().listener.take();
        if let Some(listener) = listener {
            // A callback running inline on the reader thread may close us.
            if listener.thread().id() != caller && listener.join().is_err() {
                warn!(port = %self.label(), "Listener thread panicked");
            }
        }

        let mut lifecycle = self.lifecycle.lock();
        lifecycle.phase = Phase::Retired;
        self.changed.notify_all();
        info!(
            port = %lifecycle.port_name.as_deref().unwrap_or(UNBOUND),
            "Scanner port closed"
        );
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lifecycle = self.lifecycle.lock();
        f.debug_struct("ConnectionHandle")
            .field("port_name", &lifecycle.port_name)
            .field("state", &lifecycle.phase.state())
            .field("callback", &self.callback)
            .finish()
    }
}
