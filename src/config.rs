//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! ```toml
//! [input]
//! port = "/dev/ttyUSB0"
//! baud_rate = 420000
//!
//! [[outputs]]
//! port = "/dev/ttyAMA0"
//! protocol = "sbus"
//!
//! [[outputs]]
//! port = "/dev/ttyAMA1"
//! protocol = "dji_rs_pro"
//!
//! [failsafe]
//! mode = "no_pulses"
//! timeout_ms = 1000
//!
//! [logging]
//! level = "info"
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, SbusBridgeError};
use crate::serial::CRSF_BAUD_RATES;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputConfig>,

    #[serde(default)]
    pub failsafe: FailsafeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// CRSF input port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_input_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// One output link
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_port")]
    pub port: String,

    #[serde(default)]
    pub protocol: OutputProtocol,
}

/// Wire protocol driven on an output link
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputProtocol {
    /// Standard SBUS
    #[default]
    Sbus,
    /// SBUS on an inverted line (inversion is done in hardware)
    InvertedSbus,
    /// DJI RS gimbal: remapped SBUS plus command packets
    DjiRsPro,
    /// Anything else, encoded as standard SBUS
    #[serde(other)]
    Unsupported,
}

/// What to do when the input link is failsafed
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailsafeMode {
    /// Stop sending frames entirely
    NoPulses,
    /// Keep sending the last received positions, flagged as failsafe
    #[default]
    LastPosition,
    /// Keep sending frames, flagged as failsafe
    SetPosition,
}

/// Failsafe configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FailsafeConfig {
    #[serde(default)]
    pub mode: FailsafeMode,

    #[serde(default = "default_failsafe_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_input_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 420000 }

fn default_output_port() -> String { "/dev/ttyAMA0".to_string() }
fn default_outputs() -> Vec<OutputConfig> { vec![OutputConfig::default()] }

fn default_failsafe_timeout_ms() -> u64 { 1000 }
fn default_frame_interval_ms() -> u64 { 20 }

fn default_log_level() -> String { "info".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            outputs: default_outputs(),
            failsafe: FailsafeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            port: default_input_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            port: default_output_port(),
            protocol: OutputProtocol::default(),
        }
    }
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        Self {
            mode: FailsafeMode::default(),
            timeout_ms: default_failsafe_timeout_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> SbusBridgeError {
    SbusBridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
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
    /// use sbus_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.input.port.is_empty() {
            return Err(invalid("input port cannot be empty"));
        }

        if !CRSF_BAUD_RATES.contains(&self.input.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 115200, 400000, 420000, 921600, 1870000, 3750000",
            ));
        }

        if self.outputs.is_empty() {
            return Err(invalid("at least one output must be configured"));
        }

        let mut ports = HashSet::new();
        for output in &self.outputs {
            if output.port.is_empty() {
                return Err(invalid("output port cannot be empty"));
            }
            if output.port == self.input.port {
                return Err(invalid(format!(
                    "output port {} is already used as the input port",
                    output.port
                )));
            }
            if !ports.insert(output.port.as_str()) {
                return Err(invalid(format!("output port {} is configured twice", output.port)));
            }
        }

        if self.failsafe.timeout_ms == 0 || self.failsafe.timeout_ms > 60000 {
            return Err(invalid("failsafe timeout_ms must be between 1 and 60000"));
        }

        if self.failsafe.frame_interval_ms == 0 || self.failsafe.frame_interval_ms > 1000 {
            return Err(invalid("frame_interval_ms must be between 1 and 1000"));
        }

        if self.failsafe.frame_interval_ms >= self.failsafe.timeout_ms {
            return Err(invalid("frame_interval_ms must be less than failsafe timeout_ms"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        if matches!(&self.logging.directory, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        Ok(())
    }
}
