//! Configuration schema definitions.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tgbot_core::{DEFAULT_API_BASE, DEFAULT_FILE_BASE, UpdateKind};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgbotConfig {
    /// Bot token issued by @BotFather.
    #[serde(default)]
    pub token: String,

    /// Base URL for method calls; the token is appended.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL for file downloads.
    #[serde(default = "default_file_base")]
    pub file_base: String,

    /// Overall HTTP request timeout in seconds. Must exceed the poll timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub polling: PollingConfig,

    /// Present: the runtime registers a webhook instead of polling.
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TgbotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
            file_base: default_file_base(),
            request_timeout_secs: default_request_timeout_secs(),
            polling: PollingConfig::default(),
            webhook: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TgbotConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_file_base() -> String {
    DEFAULT_FILE_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Long-polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Updates per `getUpdates` call, 1..=100.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u32,

    /// Kinds to receive; empty means the kinds with a registered handler.
    #[serde(default)]
    pub allowed_updates: Vec<UpdateKind>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            timeout_secs: default_poll_timeout_secs(),
            allowed_updates: Vec::new(),
        }
    }
}

fn default_limit() -> u32 {
    100
}

fn default_poll_timeout_secs() -> u32 {
    30
}

/// Webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Local address to listen on.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Local path receiving updates.
    #[serde(default = "default_webhook_path")]
    pub path: String,

    /// Public HTTPS URL registered with `setWebhook`.
    pub url: String,

    /// Generated at startup when absent.
    #[serde(default)]
    pub secret_token: Option<String>,

    /// Public certificate uploaded with `setWebhook`, for self-signed setups.
    #[serde(default)]
    pub certificate: Option<PathBuf>,

    #[serde(default)]
    pub ip_address: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default)]
    pub drop_pending_updates: bool,
}

fn default_listen() -> String {
    "0.0.0.0:8443".to_string()
}

fn default_webhook_path() -> String {
    "/telegram".to_string()
}

fn default_max_connections() -> u32 {
    40
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    /// Extra `EnvFilter` directives, e.g. `tgbot_framework=debug`.
    #[serde(default)]
    pub directives: Vec<String>,
}

/// Global log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    /// Needs the `json-log` feature; falls back to compact without it.
    Json,
}
