//! Configuration module.
//!
//! This module provides TOML-based configuration with environment variable
//! overrides, and the parameter providers that turn it into line settings.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_SCANNER_CONFIG` environment variable (explicit path)
//! 2. `./scanner.toml` (current directory)
//! 3. `scanner.toml` in the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `SERIAL_SCANNER_<SECTION>_<KEY>`, e.g.
//! `SERIAL_SCANNER_SCANNER_PARITY=Even` or `SERIAL_SCANNER_LOGGING_FORMAT=json`.
//!
//! # Example
//!
//! ```toml
//! [scanner]
//! current_port_name = "COM3"
//! baud_rate = 9600
//! parity = "None"
//! data_bits = 8
//! stop_bits = "One"
//!
//! [scanner.port_aliases]
//! front_till = "COM3"
//!
//! [listener]
//! poll_interval_ms = 50
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

mod error;
mod loader;
mod provider;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
#[cfg(test)]
pub use provider::MockParameterProvider;
pub use provider::{FileParameterProvider, NoSettings, ParameterProvider, StaticParameterProvider};
pub use schema::{Config, ListenerConfig, LogFormat, LoggingConfig, ScannerConfig};
