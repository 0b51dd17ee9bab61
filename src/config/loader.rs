use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::types::Config;
use crate::mode::PeripheralMode;
use crate::pattern::{Pattern, Tempo, PATTERN_CAPACITY};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `boardctl/config.toml` under `dirs::config_dir()`, falling back
    /// to the current directory.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("boardctl").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML. Validation is left to the caller so
    ///   command-line overrides can be applied first.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validates the configuration with the same rules the endpoints apply.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pattern()?;
        self.tempo()?;
        self.mode()?;

        let lines = [
            self.pins.led_blue,
            self.pins.led_white,
            self.pins.lcm_reset,
            self.pins.lcm_boot,
        ];
        let distinct: HashSet<u32> = lines.iter().copied().collect();
        if distinct.len() != lines.len() {
            return Err(ConfigError::ValidationError {
                message: format!("Output lines must be distinct, got {:?}", lines),
            });
        }

        Ok(())
    }

    pub fn pattern(&self) -> Result<Pattern, ConfigError> {
        Pattern::new(self.pattern.codes.clone()).ok_or_else(|| ConfigError::ValidationError {
            message: format!(
                "Pattern must hold between 1 and {} codes (got {})",
                PATTERN_CAPACITY,
                self.pattern.codes.len()
            ),
        })
    }

    pub fn tempo(&self) -> Result<Tempo, ConfigError> {
        Tempo::new(i64::from(self.pattern.tempo)).map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid tempo: {}", e),
        })
    }

    pub fn mode(&self) -> Result<PeripheralMode, ConfigError> {
        PeripheralMode::from_value(i64::from(self.peripheral.mode)).map_err(|e| {
            ConfigError::ValidationError {
                message: format!("Invalid peripheral mode: {}", e),
            }
        })
    }
}
