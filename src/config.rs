//! Configuration for Setu
//!
//! Loads configuration from a TOML file. Every section and field is optional;
//! anything left out takes the value a stock Roomba on a USB serial cable
//! next to a Home Assistant broker needs.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial link to the robot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Serial port path (default: /dev/ttyUSB0)
    #[serde(default = "default_port")]
    pub port: String,

    /// Baud rate (default: 115200)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Per-read timeout in milliseconds (default: 100)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// MQTT broker and topics
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Topic the JSON status is published to
    #[serde(default = "default_status_topic")]
    pub status_topic: String,

    /// Topic command names are received on
    #[serde(default = "default_command_topic")]
    pub command_topic: String,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

/// Poll loop timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Sleep between poll cycles in milliseconds (default: 500)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Wait between a sensor request and reading its reply (default: 50)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Consecutive failed wakes before the robot is reported as lost (default: 5)
    #[serde(default = "default_max_wake_attempts")]
    pub max_wake_attempts: u32,
}

/// Movement log recording
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub enabled: bool,

    /// JSON movement log path (default: movement.json)
    #[serde(default = "default_recorder_path")]
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use setu::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("setu.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
            status_topic: default_status_topic(),
            command_topic: default_command_topic(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            settle_ms: default_settle_ms(),
            max_wake_attempts: default_max_wake_attempts(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_recorder_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

// Default value functions
fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud_rate() -> u32 {
    crate::devices::create2::constants::DEFAULT_BAUD_RATE
}
fn default_read_timeout_ms() -> u64 {
    crate::devices::create2::constants::SERIAL_READ_TIMEOUT_MS
}
fn default_mqtt_host() -> String {
    "homeassistant.local".to_string()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "roomba".to_string()
}
fn default_status_topic() -> String {
    "roomba/status".to_string()
}
fn default_command_topic() -> String {
    "roomba/command".to_string()
}
fn default_keep_alive_secs() -> u64 {
    5
}
fn default_interval_ms() -> u64 {
    500
}
fn default_settle_ms() -> u64 {
    crate::devices::create2::constants::RESPONSE_SETTLE_MS
}
fn default_max_wake_attempts() -> u32 {
    5
}
fn default_recorder_path() -> String {
    "movement.json".to_string()
}
fn default_level() -> String {
    "info".to_string()
}
