//! Configuration management for the ARC Assistant.
//!
//! Settings live in a TOML file. A missing file is not an error: the
//! defaults describe a working assistant with the built-in command table.

mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use settings::{Fallbacks, Settings, WeatherSettings, MAX_CAPABILITY_RETRIES};

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "ARC_ASSISTANT_CONFIG";

/// Configuration file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// The configuration file exists but could not be read.
    #[error("Failed to read config file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The configuration file is not valid TOML for [`Settings`].
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The settings are well-formed but not acceptable.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// The validated settings.
    pub settings: Settings,
    /// The file the settings were read from, if one existed.
    source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Uses `$ARC_ASSISTANT_CONFIG` when set, otherwise
    /// `<config dir>/arc-assistant/config.toml`.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;

        info!(path = %path.display(), "Configuration loaded");
        Ok(Self {
            settings,
            source: Some(path.to_path_buf()),
        })
    }

    /// The default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("arc-assistant").join(CONFIG_FILE_NAME))
    }

    /// The file these settings came from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
