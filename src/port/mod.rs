//! Port abstraction layer for serial communication.
//!
//! Provides the adapter/backend traits, the `serialport` implementation and
//! a mock, enabling dependency injection and hardware-free tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockBackend, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
