//! Device configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::button::ButtonTiming;
use crate::error::{DeviceError, DeviceResult};
use crate::server::ServerSettings;

/// Which node this process emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceVariant {
    /// Panic button with latch, button monitor and routed API.
    #[default]
    Panic,
    /// Humidity sensor answering every request with an ADC sample.
    Humidity,
}

/// Device configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub variant: DeviceVariant,
    /// TCP port of the HTTP API.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Per-connection deadline (ms).
    #[serde(default = "default_conn_timeout_ms")]
    pub conn_timeout_ms: u64,
    /// Request head buffer size (bytes), reused across connections.
    #[serde(default = "default_request_buffer_size")]
    pub request_buffer_size: usize,
    /// Button sampling interval (ms).
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// Hold time before the bootloader is entered (ms).
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    /// Quiet period after a release (ms).
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Pending blink requests before producers wait.
    #[serde(default = "default_blink_queue_capacity")]
    pub blink_queue_capacity: usize,
    /// Delay between LED toggles (ms).
    #[serde(default = "default_blink_toggle_ms")]
    pub blink_toggle_ms: u64,
    /// Initial raw sample of the simulated ADC (humidity variant).
    #[serde(default = "default_adc_initial")]
    pub adc_initial: u16,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_conn_timeout_ms() -> u64 {
    3_000
}

fn default_request_buffer_size() -> usize {
    1024
}

fn default_sample_interval_ms() -> u64 {
    200
}

fn default_long_press_ms() -> u64 {
    3_000
}

fn default_cooldown_ms() -> u64 {
    1_000
}

fn default_blink_queue_capacity() -> usize {
    3
}

fn default_blink_toggle_ms() -> u64 {
    500
}

fn default_adc_initial() -> u16 {
    32_768
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            variant: DeviceVariant::default(),
            listen_port: default_listen_port(),
            conn_timeout_ms: default_conn_timeout_ms(),
            request_buffer_size: default_request_buffer_size(),
            sample_interval_ms: default_sample_interval_ms(),
            long_press_ms: default_long_press_ms(),
            cooldown_ms: default_cooldown_ms(),
            blink_queue_capacity: default_blink_queue_capacity(),
            blink_toggle_ms: default_blink_toggle_ms(),
            adc_initial: default_adc_initial(),
        }
    }
}

impl DeviceConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> DeviceResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DeviceError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> DeviceResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DeviceError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else defaults.
    pub fn load(path: Option<&str>) -> DeviceResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> DeviceResult<()> {
        if self.request_buffer_size < 64 {
            return Err(DeviceError::Config(format!(
                "request_buffer_size must be at least 64 bytes, got {}",
                self.request_buffer_size
            )));
        }
        if self.conn_timeout_ms == 0 {
            return Err(DeviceError::Config(
                "conn_timeout_ms must be positive".to_string(),
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err(DeviceError::Config(
                "sample_interval_ms must be positive".to_string(),
            ));
        }
        if self.blink_queue_capacity == 0 {
            return Err(DeviceError::Config(
                "blink_queue_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.listen_port))
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            conn_timeout: Duration::from_millis(self.conn_timeout_ms),
            request_buffer_size: self.request_buffer_size,
        }
    }

    pub fn button_timing(&self) -> ButtonTiming {
        ButtonTiming {
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            long_press: Duration::from_millis(self.long_press_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }

    pub fn blink_toggle_delay(&self) -> Duration {
        Duration::from_millis(self.blink_toggle_ms)
    }
}
