//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! let config = tgbot_runtime::config::load_config()?;
//! tgbot_runtime::logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use tgbot_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .directive("tgbot_framework=debug")
//!     .init();
//! ```
//!
//! `RUST_LOG`, when set, replaces the configured level; directives are added
//! on top of either.

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// Initializes logging from a [`LoggingConfig`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// A builder for configuring logging.
#[derive(Debug)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: tracing::Level,
    format: LogFormat,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: tracing::Level::INFO,
            format: LogFormat::Compact,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new()
            .with_level(config.level.to_tracing_level())
            .format(config.format);
        builder.directives.extend(config.directives.iter().cloned());
        builder
    }

    /// Sets the global log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive.
    ///
    /// ```rust,ignore
    /// builder.directive("tgbot_core=trace")
    /// ```
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Include file names and line numbers.
    pub fn with_location(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self.with_line_number = enabled;
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let base = self.level.to_string().to_lowercase();
        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base));

        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(err) => eprintln!("ignoring invalid log directive {directive:?}: {err}"),
            }
        }

        filter
    }

    /// Initializes the logging system, ignoring an existing subscriber.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Initializes the logging system, failing if a global subscriber is
    /// already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();

        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
            };
        }

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => tracing_subscriber::registry()
                .with(fmt::layer().json().with_target(self.with_target))
                .with(filter)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(configure_layer!(fmt::layer().pretty()))
                .with(filter)
                .try_init(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => {
                let result = tracing_subscriber::registry()
                    .with(configure_layer!(fmt::layer().compact()))
                    .with(filter)
                    .try_init();
                tracing::warn!("json log format needs the `json-log` feature, using compact");
                result
            }
            LogFormat::Compact => tracing_subscriber::registry()
                .with(configure_layer!(fmt::layer().compact()))
                .with(filter)
                .try_init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_from_config() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            directives: vec!["tgbot_core=trace".into()],
        };
        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, tracing::Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert_eq!(builder.directives, vec!["tgbot_core=trace".to_string()]);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        LoggingBuilder::new().directive("not a directive ===").init();
        assert!(LoggingBuilder::new().try_init().is_err());
        init_from_config(&LoggingConfig::default());
    }
}
