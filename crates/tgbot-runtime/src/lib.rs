//! tgbot runtime: configuration, logging and orchestration.
//!
//! This crate provides:
//! - Configuration loading with figment (`tgbot.toml`, `TGBOT_*` variables)
//! - Logging initialisation with `tracing-subscriber`
//! - [`BotRuntime`], which runs a handler table in polling or webhook mode
//!   until Ctrl+C
//!
//! ```rust,ignore
//! use tgbot_runtime::BotRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = BotRuntime::new()?;
//!     runtime.handlers().on_message(echo);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Webhook mode needs the `webhook` feature; without a `[webhook]` section
//! the runtime long-polls.

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LogFormat, LogLevel, LoggingConfig, PollingConfig,
    TgbotConfig, WebhookConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{BotRuntime, RuntimeBuilder};

// Re-export tracing for use by bot code
pub use tracing;
pub use tracing_subscriber;
