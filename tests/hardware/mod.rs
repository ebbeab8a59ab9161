//! Hardware-specific tests requiring a real serial port.
//!
//! These tests are ignored by default and require actual hardware to run.
//! They should be run manually with the `--ignored` flag and appropriate
//! environment variables set.

pub mod scanner_port_tests;
pub mod utils;
