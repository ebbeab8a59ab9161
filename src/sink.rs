//! Best-effort error reporting.
//!
//! Failures that are not returned to a caller (fleet activation, reads on
//! the listener thread, release during close) are handed to an `ErrorSink`.

use crate::error::ScannerError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, warn};

/// Accepts errors for diagnostic recording. Must not block or panic.
pub trait ErrorSink: Send + Sync {
    fn record(&self, error: &ScannerError);
}

/// Forwards every error to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn record(&self, err: &ScannerError) {
        let port = err.port().unwrap_or("-");
        match err {
            ScannerError::Io { .. } => warn!(port = %port, error = %err, "Scanner read failed"),
            _ => error!(port = %port, error = %err, "Scanner error"),
        }
    }
}

/// Keeps the rendered messages in memory and forwards to `tracing`.
///
/// Useful for hosts that show recent scanner problems in their own UI.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl ErrorSink for MemorySink {
    fn record(&self, error: &ScannerError) {
        TracingSink.record(error);
        self.messages.lock().push(error.to_string());
    }
}
