//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_SCANNER";

/// Config file name
const CONFIG_FILE_NAME: &str = "scanner.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_SCANNER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_SCANNER_CONFIG` environment variable (explicit path)
    /// 2. `./scanner.toml` (current directory)
    /// 3. the platform config directory, e.g. `~/.config/serial-scanner/scanner.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    ///
    /// Environment overrides apply all-or-nothing: if any of them fails to
    /// parse, a warning is logged and the plain defaults are used.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if let Err(e) = apply_env_overrides(&mut config) {
            warn!(error = %e, "Ignoring environment overrides");
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-scanner").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn env_var(key: &str) -> Option<(String, String)> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&var).ok().map(|val| (var, val))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_SCANNER_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_SCANNER_SCANNER_CURRENT_PORT_NAME=COM4`
/// - `SERIAL_SCANNER_SCANNER_BAUD_RATE=115200`
/// - `SERIAL_SCANNER_LISTENER_POLL_INTERVAL_MS=20`
///
/// Line settings stay textual here; they are validated on conversion.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Scanner overrides
    if let Some((_, val)) = env_var("SCANNER_CURRENT_PORT_NAME") {
        config.scanner.current_port_name = val;
    }
    if let Some((_, val)) = env_var("SCANNER_BAUD_RATE") {
        config.scanner.baud_rate = val;
    }
    if let Some((_, val)) = env_var("SCANNER_PARITY") {
        config.scanner.parity = val;
    }
    if let Some((_, val)) = env_var("SCANNER_DATA_BITS") {
        config.scanner.data_bits = val;
    }
    if let Some((_, val)) = env_var("SCANNER_STOP_BITS") {
        config.scanner.stop_bits = val;
    }

    // Listener overrides
    if let Some((var, val)) = env_var("LISTENER_POLL_INTERVAL_MS") {
        config.listener.poll_interval_ms = val
            .parse()
            .map_err(|_| ConfigError::env_parse(var, "Invalid poll interval"))?;
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = val
            .parse()
            .map_err(|_| ConfigError::env_parse(var, "Expected json, pretty or compact"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().listener.poll_interval_ms, 50);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_SCANNER_SCANNER_BAUD_RATE", "19200");
        env::set_var("SERIAL_SCANNER_SCANNER_CURRENT_PORT_NAME", "COM9");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().scanner.baud_rate, "19200");
        assert_eq!(loader.config().scanner.current_port_name, "COM9");

        env::remove_var("SERIAL_SCANNER_SCANNER_BAUD_RATE");
        env::remove_var("SERIAL_SCANNER_SCANNER_CURRENT_PORT_NAME");
    }

    #[test]
    #[serial]
    fn test_invalid_env_override_is_reported() {
        env::set_var("SERIAL_SCANNER_LISTENER_POLL_INTERVAL_MS", "soon");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        env::remove_var("SERIAL_SCANNER_LISTENER_POLL_INTERVAL_MS");
    }

    #[test]
    #[serial]
    fn test_defaults_ignore_partially_invalid_overrides() {
        env::set_var("SERIAL_SCANNER_LOGGING_LEVEL", "debug");
        env::set_var("SERIAL_SCANNER_LOGGING_FORMAT", "xml");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().logging.level, "info");
        assert_eq!(loader.config().logging.format, LogFormat::Pretty);

        env::remove_var("SERIAL_SCANNER_LOGGING_LEVEL");
        env::remove_var("SERIAL_SCANNER_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.toml");
        std::fs::write(&path, "[scanner]\ncurrent_port_name = \"COM3\"\n").unwrap();

        let loaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loaded.config().scanner.current_port_name, "COM3");
        assert_eq!(loaded.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_from(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
