//! Range and shape checks applied after the sources are merged.

use super::error::{ConfigError, ConfigResult};
use super::schema::{PollingConfig, TgbotConfig, WebhookConfig};

/// Upper bound shared by `limit` and `max_connections`.
const MAX_BATCH: u32 = 100;

/// Longest secret token `setWebhook` accepts.
const MAX_SECRET_LEN: usize = 256;

/// Validates the entire configuration.
pub fn validate_config(config: &TgbotConfig) -> ConfigResult<()> {
    validate_token(&config.token)?;
    validate_base_url("api_base", &config.api_base)?;
    validate_base_url("file_base", &config.file_base)?;

    match &config.webhook {
        Some(webhook) => validate_webhook(webhook)?,
        None => validate_polling(&config.polling, config.request_timeout_secs)?,
    }

    Ok(())
}

fn validate_token(token: &str) -> ConfigResult<()> {
    if token.is_empty() {
        return Err(ConfigError::MissingToken);
    }
    if !token.contains(':') {
        return Err(ConfigError::invalid("token", "expected <bot id>:<secret>"));
    }
    Ok(())
}

fn validate_base_url(field: &'static str, url: &str) -> ConfigResult<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ConfigError::invalid_url(field, url, "expected an http(s) URL"));
    }
    Ok(())
}

fn validate_polling(polling: &PollingConfig, request_timeout_secs: u64) -> ConfigResult<()> {
    if !(1..=MAX_BATCH).contains(&polling.limit) {
        return Err(ConfigError::invalid(
            "polling.limit",
            format!("must be in 1..={MAX_BATCH}, got {}", polling.limit),
        ));
    }
    if request_timeout_secs <= u64::from(polling.timeout_secs) {
        return Err(ConfigError::invalid(
            "request_timeout_secs",
            format!("must exceed polling.timeout_secs ({})", polling.timeout_secs),
        ));
    }
    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> ConfigResult<()> {
    if !webhook.url.starts_with("https://") {
        return Err(ConfigError::invalid_url("webhook.url", &webhook.url, "webhooks require https"));
    }
    if !(1..=MAX_BATCH).contains(&webhook.max_connections) {
        return Err(ConfigError::invalid(
            "webhook.max_connections",
            format!("must be in 1..={MAX_BATCH}, got {}", webhook.max_connections),
        ));
    }
    if !webhook.path.starts_with('/') {
        return Err(ConfigError::invalid("webhook.path", "must start with '/'"));
    }
    if let Some(secret) = &webhook.secret_token {
        validate_secret(secret)?;
    }
    Ok(())
}

fn validate_secret(secret: &str) -> ConfigResult<()> {
    if secret.is_empty() || secret.len() > MAX_SECRET_LEN {
        return Err(ConfigError::invalid(
            "webhook.secret_token",
            format!("must be 1 to {MAX_SECRET_LEN} characters"),
        ));
    }
    let valid = secret
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !valid {
        return Err(ConfigError::invalid(
            "webhook.secret_token",
            "only A-Z, a-z, 0-9, _ and - are allowed",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TgbotConfig {
        TgbotConfig {
            token: "123:abc".into(),
            ..Default::default()
        }
    }

    fn webhook() -> WebhookConfig {
        WebhookConfig {
            listen: "127.0.0.1:8443".into(),
            path: "/telegram".into(),
            url: "https://example.com/telegram".into(),
            secret_token: None,
            certificate: None,
            ip_address: None,
            max_connections: 40,
            drop_pending_updates: false,
        }
    }

    #[test]
    fn test_validate_default_with_token() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_token() {
        let mut config = valid();
        config.token.clear();
        assert!(matches!(validate_config(&config), Err(ConfigError::MissingToken)));
        config.token = "nocolon".into();
        assert_eq!(validate_config(&config).unwrap_err().field(), Some("token"));
    }

    #[test]
    fn test_validate_polling() {
        let mut config = valid();
        config.polling.limit = 0;
        assert!(validate_config(&config).is_err());
        config.polling.limit = 101;
        assert_eq!(validate_config(&config).unwrap_err().field(), Some("polling.limit"));

        let mut config = valid();
        config.request_timeout_secs = 30;
        assert_eq!(
            validate_config(&config).unwrap_err().field(),
            Some("request_timeout_secs")
        );
    }

    #[test]
    fn test_validate_webhook() {
        let mut config = valid();
        config.webhook = Some(webhook());
        assert!(validate_config(&config).is_ok());

        let mut hook = webhook();
        hook.url = "http://example.com".into();
        config.webhook = Some(hook);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { field: "webhook.url", .. })
        ));

        let mut hook = webhook();
        hook.max_connections = 0;
        config.webhook = Some(hook);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_secret() {
        assert!(validate_secret("abc_DEF-123").is_ok());
        assert!(validate_secret("").is_err());
        assert!(validate_secret("has space").is_err());
        assert!(validate_secret(&"a".repeat(257)).is_err());
        assert!(validate_secret(&"a".repeat(256)).is_ok());
    }
}
