//! Configuration loading and validation.
//!
//! Settings come from defaults, a `tgbot.toml` / `tgbot.yaml` file,
//! `TGBOT_*` environment variables and programmatic overrides, in that order.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, load_config, load_config_from_file};
pub use schema::{LogFormat, LogLevel, LoggingConfig, PollingConfig, TgbotConfig, WebhookConfig};
pub use validation::validate_config;
