//! Shared test utilities for the scanner tests.
//!
//! This module provides common test infrastructure including:
//! - A mock-backed scanner context with its owning context
//! - Connection parameter builders
//! - Helpers that pump the owning context until scans arrive

#![allow(dead_code)]

use serial_scanner_agent::dispatch::OwningContext;
use serial_scanner_agent::port::MockBackend;
use serial_scanner_agent::{
    ConnectionParameters, DataBits, MemorySink, Parity, ScannerContext, StopBits,
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// How long a test waits for an arrival before giving up.
pub const ARRIVAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a test needs to drive connections against mock ports.
pub struct TestHarness {
    pub backend: MockBackend,
    pub sink: MemorySink,
    pub owner: OwningContext,
    pub context: ScannerContext,
}

impl TestHarness {
    /// Create a harness whose backend exposes `ports`.
    pub fn with_ports(ports: &[&str]) -> Self {
        let backend = MockBackend::with_ports(ports.iter().copied());
        let sink = MemorySink::new();
        let (owner, dispatcher) = OwningContext::new();
        let context = ScannerContext::new(dispatcher)
            .with_backend(backend.clone())
            .with_sink(sink.clone());

        Self {
            backend,
            sink,
            owner,
            context,
        }
    }

    /// Push one burst into an opened port.
    pub fn inject(&self, port: &str, data: &[u8]) {
        self.backend
            .port(port)
            .unwrap_or_else(|| panic!("port {port} was never opened"))
            .inject(data);
    }

    /// Pump the owning context until `rx` yields a value or the timeout passes.
    pub fn next_scan(&mut self, rx: &Receiver<String>) -> Option<String> {
        let deadline = Instant::now() + ARRIVAL_TIMEOUT;
        while Instant::now() < deadline {
            self.owner.run_pending();
            if let Ok(text) = rx.try_recv() {
                return Some(text);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    /// Pump the owning context for `window` and collect everything received.
    pub fn drain_scans(&mut self, rx: &Receiver<String>, window: Duration) -> Vec<String> {
        let deadline = Instant::now() + window;
        let mut scans = Vec::new();
        while Instant::now() < deadline {
            self.owner.run_pending();
            scans.extend(rx.try_iter());
            std::thread::sleep(Duration::from_millis(5));
        }
        scans
    }
}

/// 9600 8N1 on `port`.
pub fn params(port: &str) -> ConnectionParameters {
    ConnectionParameters::new(port, 9600, Parity::None, DataBits::Eight, StopBits::One)
        .expect("valid parameters")
}

/// A callback that forwards every scan into a channel.
pub fn recording_callback() -> (impl Fn(String) + Send + Sync + 'static, Receiver<String>) {
    let (tx, rx): (Sender<String>, Receiver<String>) = mpsc::channel();
    let callback = move |text: String| {
        let _ = tx.send(text);
    };
    (callback, rx)
}

/// Wait until `condition` holds or the arrival timeout passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + ARRIVAL_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
