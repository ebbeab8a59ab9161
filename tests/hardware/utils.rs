//! Utility functions for hardware testing.
//!
//! Provides helpers for port discovery, test setup and timing.

use serial_scanner_agent::{ConnectionParameters, DataBits, Parity, StopBits};
use serialport::{available_ports, SerialPortInfo, SerialPortType};
use std::env;
use std::time::{Duration, Instant};

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    /// Whether someone will scan a barcode during the test.
    pub interactive: bool,
}

impl TestPortConfig {
    /// Get test configuration from environment variables.
    ///
    /// - `TEST_PORT`: port the scanner is attached to
    /// - `TEST_BAUD`: optional, default 9600
    /// - `TEST_SCAN=1`: a person will scan a barcode when prompted
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let interactive = env::var("TEST_SCAN").ok().as_deref() == Some("1");

        Some(TestPortConfig {
            port_name,
            baud_rate,
            interactive,
        })
    }

    /// 8N1 parameters for the configured port.
    pub fn to_parameters(&self) -> ConnectionParameters {
        ConnectionParameters::new(
            self.port_name.clone(),
            self.baud_rate,
            Parity::None,
            DataBits::Eight,
            StopBits::One,
        )
        .expect("TEST_PORT and TEST_BAUD must describe a valid port")
    }
}

/// Discover all available serial ports on the system.
pub fn discover_available_ports() -> Vec<SerialPortInfo> {
    available_ports().unwrap_or_default()
}

/// Print available ports for debugging.
pub fn print_available_ports() {
    let ports = discover_available_ports();

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }

    println!("Available serial ports ({}):", ports.len());
    for (idx, port) in ports.iter().enumerate() {
        println!("  {}. {}", idx + 1, port.port_name);
        if let SerialPortType::UsbPort(usb_info) = &port.port_type {
            println!("     VID:PID = {:04x}:{:04x}", usb_info.vid, usb_info.pid);
            if let Some(ref product) = usb_info.product {
                println!("     Product: {}", product);
            }
        }
    }
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}

/// Return early from a test when `TEST_PORT` is not set.
#[macro_export]
macro_rules! skip_without_hardware {
    () => {
        match $crate::hardware::utils::TestPortConfig::from_env() {
            Some(config) => config,
            None => {
                println!("Skipping hardware test: TEST_PORT not set");
                return;
            }
        }
    };
}
