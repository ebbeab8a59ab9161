//! Unit tests for the scanner's value types
//!
//! This module contains tests for:
//! - `params.rs`: ConnectionParameters and the line setting enums
//! - `config`: Settings files, aliases and providers
//! - `error.rs`: ScannerError and error conversions
//!
//! Tests follow the Arrange-Act-Assert pattern.

use serial_scanner_agent::config::{
    Config, FileParameterProvider, LogFormat, ParameterProvider, ScannerConfig,
};
use serial_scanner_agent::port::PortError;
use serial_scanner_agent::{
    ConfigError, ConnectionParameters, DataBits, Parity, ScannerError, StopBits,
};

// ============================================================================
// ConnectionParameters Tests
// ============================================================================

#[cfg(test)]
mod connection_parameters_tests {
    use super::*;

    #[test]
    fn test_parameters_keep_what_they_were_given() {
        // Arrange & Act
        let params = ConnectionParameters::new(
            "/dev/ttyUSB0",
            115200,
            Parity::Even,
            DataBits::Seven,
            StopBits::Two,
        )
        .expect("valid parameters");

        // Assert
        assert_eq!(params.port_name(), "/dev/ttyUSB0");
        assert_eq!(params.baud_rate(), 115200);
        assert_eq!(params.parity(), Parity::Even);
        assert_eq!(params.data_bits(), DataBits::Seven);
        assert_eq!(params.stop_bits(), StopBits::Two);
        assert_eq!(params.to_string(), "/dev/ttyUSB0 115200 7E2");
    }

    #[test]
    fn test_blank_port_name_is_rejected() {
        let result =
            ConnectionParameters::new("  ", 9600, Parity::None, DataBits::Eight, StopBits::One);
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_zero_baud_is_rejected() {
        let result =
            ConnectionParameters::new("COM3", 0, Parity::None, DataBits::Eight, StopBits::One);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_platform_restricted_values_are_still_valid_parameters() {
        // Mark parity, 4 data bits and 1.5 stop bits are only refused when opening.
        let params = ConnectionParameters::new(
            "COM3",
            9600,
            Parity::Mark,
            DataBits::Four,
            StopBits::OnePointFive,
        )
        .expect("valid parameters");
        assert_eq!(params.to_string(), "COM3 9600 4M1.5");
    }

    #[test]
    fn test_line_setting_names() {
        let cases = vec![
            ("none", Parity::None),
            ("Odd", Parity::Odd),
            ("EVEN", Parity::Even),
            ("mark", Parity::Mark),
            ("Space", Parity::Space),
        ];
        for (name, expected) in cases {
            assert_eq!(name.parse::<Parity>().unwrap(), expected, "parity {name}");
        }

        assert_eq!("5".parse::<DataBits>().unwrap(), DataBits::Five);
        assert_eq!(" 8 ".parse::<DataBits>().unwrap(), DataBits::Eight);
        assert_eq!("OnePointFive".parse::<StopBits>().unwrap(), StopBits::OnePointFive);
        assert_eq!("one_point_five".parse::<StopBits>().unwrap(), StopBits::OnePointFive);
        assert!("nine".parse::<DataBits>().is_err());
        assert!("three".parse::<StopBits>().is_err());
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[cfg(test)]
mod configuration_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_file_produces_parameters() {
        // Arrange
        let toml = r#"
            [scanner]
            current_port_name = "COM3"
            baud_rate = 19200
            parity = "Odd"
            data_bits = 7
            stop_bits = "Two"
        "#;

        // Act
        let config: Config = toml::from_str(toml).expect("Failed to parse");
        let params = config.scanner.to_parameters(None).expect("valid settings");

        // Assert
        assert_eq!(params.port_name(), "COM3");
        assert_eq!(params.baud_rate(), 19200);
        assert_eq!(params.parity(), Parity::Odd);
        assert_eq!(params.data_bits(), DataBits::Seven);
        assert_eq!(params.stop_bits(), StopBits::Two);
    }

    #[test]
    fn test_quoted_numbers_are_accepted() {
        let toml = r#"
            [scanner]
            baud_rate = "4800"
            data_bits = "7"
        "#;
        let config: Config = toml::from_str(toml).expect("Failed to parse");
        let params = config.scanner.to_parameters(Some("COM2")).unwrap();
        assert_eq!(params.baud_rate(), 4800);
        assert_eq!(params.data_bits(), DataBits::Seven);
    }

    #[test]
    fn test_unparsable_values_are_configuration_errors() {
        let settings = ScannerConfig {
            baud_rate: "fast".into(),
            ..Default::default()
        };
        let err = settings.to_parameters(None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "baud_rate"));

        let settings = ScannerConfig {
            stop_bits: "Three".into(),
            ..Default::default()
        };
        assert!(settings.to_parameters(None).is_err());
    }

    #[test]
    fn test_aliases_resolve_to_device_paths() {
        let toml = r#"
            [scanner]
            current_port_name = "front-desk"

            [scanner.port_aliases]
            front-desk = "/dev/ttyUSB0"
        "#;
        let config: Config = toml::from_str(toml).expect("Failed to parse");
        let params = config.scanner.to_parameters(None).unwrap();
        assert_eq!(params.port_name(), "/dev/ttyUSB0");
    }

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let config: Config = toml::from_str("").expect("Failed to parse");
        assert_eq!(config.scanner, ScannerConfig::default());
        assert_eq!(config.listener.poll_interval_ms, 50);
        assert_eq!(config.logging.format, LogFormat::Pretty);

        let params = config.scanner.to_parameters(None).unwrap();
        assert_eq!(params.to_string(), "COM1 9600 8N1");
    }

    #[test]
    fn test_file_provider_reads_fresh_settings_each_lookup() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[scanner]\ncurrent_port_name = \"COM4\"").unwrap();
        let provider = FileParameterProvider::from_path(file.path());

        // Act
        let first = provider.lookup().expect("first lookup");
        std::fs::write(file.path(), "[scanner]\ncurrent_port_name = \"COM5\"\n").unwrap();
        let second = provider.lookup().expect("second lookup");

        // Assert
        assert_eq!(first.current_port_name, "COM4");
        assert_eq!(second.current_port_name, "COM5");
    }

    #[test]
    fn test_file_provider_with_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileParameterProvider::from_path(dir.path().join("absent.toml"));
        assert!(provider.lookup().is_err());
    }
}

// ============================================================================
// ScannerError Tests
// ============================================================================

#[cfg(test)]
mod scanner_error_tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_config_error_converts() {
        let err: ScannerError = ConfigError::Provider("locked".into()).into();
        assert!(matches!(err, ScannerError::Configuration(_)));
        assert_eq!(err.port(), None);
        assert_eq!(
            err.to_string(),
            "Configuration error: Parameter provider failed: locked"
        );
    }

    #[test]
    fn test_connection_error_keeps_its_source() {
        let err = ScannerError::connection("COM3", PortError::not_found("COM3"));
        assert_eq!(err.port(), Some("COM3"));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Failed to open 'COM3'"));
    }

    #[test]
    fn test_read_error_display() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "cable pulled");
        let err = ScannerError::io("COM3", PortError::Io(io));
        assert!(err.to_string().contains("Read failed on 'COM3'"));
        assert!(err.to_string().contains("cable pulled"));
    }
}
