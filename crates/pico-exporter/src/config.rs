//! Exporter configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExporterError, ExporterResult};

/// Env var naming the device base URL. Overrides the file.
pub const SERVER_URL_ENV: &str = "PICO_SERVER_URL";
/// Env var naming the webhook URL. Overrides the file.
pub const WEBHOOK_URL_ENV: &str = "PICO_WEBHOOK_URL";

/// Exporter configuration, shared by both exporter binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Device base URL, e.g. `http://192.168.1.50`.
    #[serde(default)]
    pub device_url: String,
    /// Port for `/` and `/metrics`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Timeout applied to every outbound request (ms).
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    /// Scrape cache lifetime (ms).
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// Alert poll interval (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Outgoing alert webhook (Discord-style payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Target URL. Empty disables alert dispatch.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default = "default_content")]
    pub content: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Embed colour as a decimal RGB value.
    #[serde(default = "default_color")]
    pub color: u32,
    #[serde(default = "default_actions")]
    pub actions: String,
    #[serde(default = "default_footer")]
    pub footer: String,
    /// Embed author block, sent only when a name is set.
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_icon_url: Option<String>,
    #[serde(default)]
    pub footer_icon_url: Option<String>,
}

/// Gauges exposed by the panic exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Expose `pico_panic` backed by the clear-on-read `/panic` endpoint.
    ///
    /// Each refresh consumes the device event, so scrapes compete with the
    /// alert poller for it. Disable to leave the event to the poller alone.
    #[serde(default = "default_scrape_panic")]
    pub scrape_panic: bool,
}

fn default_listen_port() -> u16 {
    3030
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_cache_ttl_ms() -> u64 {
    2_000
}

fn default_poll_interval_ms() -> u64 {
    15_000
}

fn default_username() -> String {
    "Webhook".to_string()
}

fn default_content() -> String {
    "Panic occurred!".to_string()
}

fn default_title() -> String {
    "PANIC".to_string()
}

fn default_description() -> String {
    "Someone activated the panic button!".to_string()
}

fn default_color() -> u32 {
    15_224_655
}

fn default_actions() -> String {
    "Get in touch. Get back home".to_string()
}

fn default_footer() -> String {
    "No panic!! Can be a false alarm!".to_string()
}

fn default_scrape_panic() -> bool {
    true
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: default_username(),
            avatar_url: String::new(),
            content: default_content(),
            title: default_title(),
            description: default_description(),
            color: default_color(),
            actions: default_actions(),
            footer: default_footer(),
            author_name: None,
            author_icon_url: None,
            footer_icon_url: None,
        }
    }
}

impl WebhookConfig {
    pub fn enabled(&self) -> bool {
        !self.url.is_empty()
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            scrape_panic: default_scrape_panic(),
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            device_url: String::new(),
            listen_port: default_listen_port(),
            http_timeout_ms: default_http_timeout_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            webhook: WebhookConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ExporterConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ExporterResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ExporterError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ExporterResult<Self> {
        toml::from_str(content)
            .map_err(|e| ExporterError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load from `path` (defaults when absent), apply env overrides, validate.
    pub fn load(path: Option<&str>) -> ExporterResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(SERVER_URL_ENV).ok(),
            std::env::var(WEBHOOK_URL_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Non-empty override values replace the file values.
    pub fn apply_overrides(&mut self, server_url: Option<String>, webhook_url: Option<String>) {
        if let Some(url) = server_url.filter(|u| !u.is_empty()) {
            self.device_url = url;
        }
        if let Some(url) = webhook_url.filter(|u| !u.is_empty()) {
            self.webhook.url = url;
        }
    }

    pub fn validate(&self) -> ExporterResult<()> {
        if self.device_url.is_empty() {
            return Err(ExporterError::Config(format!(
                "device_url is empty (set it in the config file or {SERVER_URL_ENV})"
            )));
        }
        if self.http_timeout_ms == 0 {
            return Err(ExporterError::Config(
                "http_timeout_ms must be positive".to_string(),
            ));
        }
        if self.cache_ttl_ms == 0 {
            return Err(ExporterError::Config(
                "cache_ttl_ms must be positive".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ExporterError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.listen_port))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
