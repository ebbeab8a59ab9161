//! Serial Scanner Agent Library
//!
//! Opens serial ports that barcode scanners are attached to, forwards every
//! scan as trimmed text to a callback running on the host's owning context,
//! and closes ports safely from any thread.
//!
//! # Modules
//!
//! - `params`: Line parameters for one connection
//! - `config`: Configuration management with TOML support and parameter providers
//! - `port`: Port abstraction layer (system ports and mocks)
//! - `dispatch`: Delivery of callbacks onto the owning context
//! - `handle`: A single scanner connection
//! - `fleet`: All scanner connections of a host under one callback
//! - `sink`: Best-effort error reporting
//! - `error`: Unified error handling

pub mod callback;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod fleet;
pub mod handle;
pub mod params;
pub mod port;
pub mod sink;

mod worker;

// Re-export commonly used types for convenience
pub use callback::{Callback, CallbackSlot};
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult, ParameterProvider};
pub use context::ScannerContext;
pub use dispatch::{ContextHandle, ContextThread, Dispatcher, OwningContext};
pub use error::{ScannerError, ScannerResult};
pub use fleet::{ActivationFailure, FleetMode, PortFleetManager};
pub use handle::{decode_burst, ConnectionHandle, ConnectionState};
pub use params::{ConnectionParameters, DataBits, Parity, StopBits};
pub use port::{MockBackend, MockSerialPort, PortBackend, PortError, SerialPortAdapter};
pub use sink::{ErrorSink, MemorySink, TracingSink};
