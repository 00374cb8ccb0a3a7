//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables `tgbot.toml`
//! - `yaml-config`: enables `tgbot.yaml` / `tgbot.yml`
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file (`tgbot.toml` / `tgbot.yaml`)
//! 3. Environment variables (`TGBOT_*`)
//! 4. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Variables use the `TGBOT_` prefix with `__` between nested keys:
//!
//! - `TGBOT_TOKEN=123:abc` → `token = "123:abc"`
//! - `TGBOT_POLLING__TIMEOUT_SECS=50` → `polling.timeout_secs = 50`
//! - `TGBOT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use tgbot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().file("./deploy/tgbot.toml").load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use figment::Provider;
use tracing::{debug, info, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::TgbotConfig;
use super::validation::validate_config;

/// Prefix of recognised environment variables.
pub const ENV_PREFIX: &str = "TGBOT_";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load. It must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a whole configuration over everything else.
    pub fn merge(self, config: TgbotConfig) -> Self {
        self.provider(Serialized::defaults(config))
    }

    /// Merges any figment provider over everything else.
    ///
    /// ```rust,ignore
    /// ConfigLoader::new().provider(Serialized::default("token", token));
    /// ```
    pub fn provider(mut self, provider: impl Provider) -> Self {
        self.overrides = self.overrides.merge(provider);
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<TgbotConfig> {
        let config = self.load_unchecked()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Loads the configuration without validating it.
    pub fn load_unchecked(self) -> ConfigResult<TgbotConfig> {
        let config: TgbotConfig = self.build_figment()?.extract()?;
        debug!(
            mode = if config.webhook.is_some() { "webhook" } else { "polling" },
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(TgbotConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else if let Some(path) = self.find_config_file() {
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, &path)?;
        } else {
            debug!("No configuration file found, using defaults");
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// First file with an enabled format in the search paths (the current
    /// directory when none were given).
    fn find_config_file(&self) -> Option<PathBuf> {
        let search_paths = if self.search_paths.is_empty() {
            std::env::current_dir().into_iter().collect()
        } else {
            self.search_paths.clone()
        };

        #[allow(unused_mut)]
        let mut names: Vec<&str> = Vec::new();
        #[cfg(feature = "toml-config")]
        names.push("tgbot.toml");
        #[cfg(feature = "yaml-config")]
        names.extend(["tgbot.yaml", "tgbot.yml"]);

        search_paths
            .iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|path| path.exists())
    }
}

/// Merges one config file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Loads from the current directory and the environment.
pub fn load_config() -> ConfigResult<TgbotConfig> {
    ConfigLoader::new().load()
}

/// Loads from `path` and the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<TgbotConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use figment::providers::{Format, Toml, Yaml};
    use tgbot_core::UpdateKind;

    use super::*;
    use crate::config::{LogFormat, LogLevel};

    fn empty_dir() -> ConfigLoader {
        ConfigLoader::new()
            .without_env()
            .search_path("/nonexistent/tgbot-config")
    }

    #[test]
    fn test_default_config() {
        let config = empty_dir().load_unchecked().unwrap();
        assert_eq!(config.api_base, "https://api.telegram.org/bot");
        assert_eq!(config.polling.limit, 100);
        assert_eq!(config.logging.level.as_str(), "info");
        assert!(config.webhook.is_none());

        // no token
        assert!(matches!(empty_dir().load(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_toml_source() {
        let config = empty_dir()
            .provider(Toml::string(
                r#"
                token = "123:abc"
                request_timeout_secs = 90

                [polling]
                timeout_secs = 50
                allowed_updates = ["message", "callback_query"]

                [webhook]
                url = "https://example.com/telegram"
                secret_token = "s3cret"

                [logging]
                level = "debug"
                format = "json"
                directives = ["tgbot_framework=trace"]
                "#,
            ))
            .load()
            .unwrap();

        assert_eq!(config.polling.timeout_secs, 50);
        assert_eq!(
            config.polling.allowed_updates,
            vec![UpdateKind::Message, UpdateKind::CallbackQuery]
        );
        let webhook = config.webhook.unwrap();
        assert_eq!(webhook.listen, "0.0.0.0:8443");
        assert_eq!(webhook.max_connections, 40);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_yaml_source() {
        let config = empty_dir()
            .provider(Yaml::string("token: \"1:x\"\npolling:\n  limit: 10\n"))
            .load()
            .unwrap();
        assert_eq!(config.polling.limit, 10);
    }

    #[test]
    fn test_overrides_win() {
        let config = empty_dir()
            .provider(Toml::string("token = \"1:file\""))
            .provider(Serialized::default("token", "2:override"))
            .load()
            .unwrap();
        assert_eq!(config.token, "2:override");
    }

    #[test]
    fn test_env_source() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("TGBOT_POLLING__LIMIT", "7");
        }
        let config = ConfigLoader::new()
            .search_path("/nonexistent/tgbot-config")
            .load_unchecked();
        unsafe {
            std::env::remove_var("TGBOT_POLLING__LIMIT");
        }
        assert_eq!(config.unwrap().polling.limit, 7);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new().file("/nonexistent/tgbot.toml").load().unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_value() {
        let err = empty_dir()
            .provider(Toml::string("token = \"1:x\"\n[polling]\nlimit = \"many\""))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Extract(_)));
    }
}
