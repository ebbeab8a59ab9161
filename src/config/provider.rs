//! Sources of scanner line settings.
//!
//! A provider hands out the raw `[scanner]` record on every lookup. The
//! fleet manager asks once per discovered port, so a file-backed provider
//! picks up edits made while ports are being opened.

use super::error::{ConfigError, ConfigResult};
use super::loader::ConfigLoader;
use super::schema::ScannerConfig;
use std::path::PathBuf;

/// Supplies the scanner settings record.
#[cfg_attr(test, mockall::automock)]
pub trait ParameterProvider: Send + Sync {
    /// Produce a fresh settings record.
    fn lookup(&self) -> ConfigResult<ScannerConfig>;
}

/// Reads the `[scanner]` section from the configuration file on every lookup.
#[derive(Debug, Clone, Default)]
pub struct FileParameterProvider {
    path: Option<PathBuf>,
}

impl FileParameterProvider {
    /// Use the standard resolution order of [`ConfigLoader::load`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Always read the given file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl ParameterProvider for FileParameterProvider {
    fn lookup(&self) -> ConfigResult<ScannerConfig> {
        let loader = match &self.path {
            Some(path) => ConfigLoader::load_from(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(loader.into_config().scanner)
    }
}

/// Hands out the same record every time.
#[derive(Debug, Clone, Default)]
pub struct StaticParameterProvider {
    settings: ScannerConfig,
}

impl StaticParameterProvider {
    pub fn new(settings: ScannerConfig) -> Self {
        Self { settings }
    }
}

impl ParameterProvider for StaticParameterProvider {
    fn lookup(&self) -> ConfigResult<ScannerConfig> {
        Ok(self.settings.clone())
    }
}

/// A provider that always fails, for hosts without any settings source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettings;

impl ParameterProvider for NoSettings {
    fn lookup(&self) -> ConfigResult<ScannerConfig> {
        Err(ConfigError::Provider("no settings source configured".to_string()))
    }
}
