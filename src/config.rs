//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! [poll]
//! interval_ms = 50
//! threshold = 0.8
//!
//! [controller]
//! device_path = ""          # empty = auto-detect
//! rescan_interval_ms = 1000
//!
//! [export]
//! enabled = true
//! output_dir = "./mappings"
//!
//! [logging]
//! level = "info"
//! file = ""                 # empty = stderr
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MapperError, Result};
use crate::view::ViewOptions;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub poll: PollConfig,
    pub controller: ControllerConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Polling and detection configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControllerConfig {
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,
}

/// Export configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_export_enabled")]
    pub enabled: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file: String,
}

// Default value functions
fn default_interval_ms() -> u64 { 50 }
fn default_threshold() -> f32 { 0.8 }

fn default_rescan_interval_ms() -> u64 { 1000 }

fn default_export_enabled() -> bool { true }
fn default_output_dir() -> String { "./mappings".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            threshold: default_threshold(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            rescan_interval_ms: default_rescan_interval_ms(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: default_export_enabled(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamepad_mapper::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_mapper::config::Config;
    ///
    /// let config = Config::from_toml("[poll]\ninterval_ms = 20\n")?;
    /// assert_eq!(config.poll.interval_ms, 20);
    /// assert_eq!(config.poll.threshold, 0.8);
    /// # Ok::<(), gamepad_mapper::error::MapperError>(())
    /// ```
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Configured device path, `None` for auto-detection
    #[must_use]
    pub fn device_path(&self) -> Option<PathBuf> {
        let path = self.controller.device_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Time between detection rescans while no device is connected
    #[must_use]
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.controller.rescan_interval_ms)
    }

    /// Poll loop options derived from this configuration
    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            poll_interval: Duration::from_millis(self.poll.interval_ms),
            threshold: self.poll.threshold,
            export_dir: self
                .export
                .enabled
                .then(|| PathBuf::from(&self.export.output_dir)),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_ms == 0 || self.poll.interval_ms > 1000 {
            return Err(invalid("interval_ms must be between 1 and 1000"));
        }

        // The threshold is compared with normalized axis values in -1.0..=1.0
        if !(self.poll.threshold > 0.0 && self.poll.threshold < 1.0) {
            return Err(invalid("threshold must be greater than 0.0 and less than 1.0"));
        }

        if self.controller.rescan_interval_ms == 0 || self.controller.rescan_interval_ms > 60000 {
            return Err(invalid("rescan_interval_ms must be between 1 and 60000"));
        }

        if self.export.enabled && self.export.output_dir.trim().is_empty() {
            return Err(invalid("export output_dir cannot be empty when enabled"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> MapperError {
    MapperError::Config(toml::de::Error::custom(msg))
}
