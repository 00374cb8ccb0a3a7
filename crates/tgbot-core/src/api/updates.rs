use tgbot_macros::Params;

use crate::api::impl_method;
use crate::file::InputFile;
use crate::types::{Update, UpdateKind, WebhookInfo};

/// Long-poll for updates.
#[derive(Debug, Clone, Default, Params)]
pub struct GetUpdates {
    /// First update id to return; confirms every update below it.
    pub offset: i64,
    /// 1..=100, server default 100.
    pub limit: u32,
    /// Long-poll timeout in seconds; `0` means short polling.
    pub timeout: u32,
    /// `Some(vec![])` asks for every kind except the opt-in ones.
    #[tg(json, force)]
    pub allowed_updates: Option<Vec<UpdateKind>>,
}

/// Registers a webhook.
#[derive(Debug, Params)]
pub struct SetWebhook {
    pub url: String,
    /// Public key certificate for self-signed setups.
    pub certificate: Option<InputFile>,
    pub ip_address: Option<String>,
    pub max_connections: u32,
    #[tg(json, force)]
    pub allowed_updates: Option<Vec<UpdateKind>>,
    pub drop_pending_updates: bool,
    pub secret_token: Option<String>,
}

impl SetWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            certificate: None,
            ip_address: None,
            max_connections: 0,
            allowed_updates: None,
            drop_pending_updates: false,
            secret_token: None,
        }
    }
}

/// Removes the webhook, switching back to `getUpdates`.
#[derive(Debug, Clone, Default, Params)]
pub struct DeleteWebhook {
    pub drop_pending_updates: bool,
}

#[derive(Debug, Clone, Copy, Default, Params)]
pub struct GetWebhookInfo;

impl_method! {
    GetUpdates => "getUpdates": Vec<Update>,
    SetWebhook => "setWebhook": bool,
    DeleteWebhook => "deleteWebhook": bool,
    GetWebhookInfo => "getWebhookInfo": WebhookInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{IntoParams, Payload};

    #[test]
    fn test_get_updates_params() {
        let mut payload = Payload::new();
        GetUpdates {
            offset: 15,
            limit: 100,
            timeout: 30,
            allowed_updates: Some(vec![UpdateKind::Message, UpdateKind::CallbackQuery]),
        }
        .write_params(&mut payload);
        assert_eq!(payload.get("offset"), Some("15"));
        assert_eq!(payload.get("limit"), Some("100"));
        assert_eq!(payload.get("timeout"), Some("30"));
        assert_eq!(payload.get("allowed_updates"), Some(r#"["message","callback_query"]"#));

        let mut payload = Payload::new();
        GetUpdates {
            allowed_updates: Some(Vec::new()),
            ..Default::default()
        }
        .write_params(&mut payload);
        assert_eq!(payload.get("offset"), None);
        assert_eq!(payload.get("allowed_updates"), Some("[]"));
    }

    #[test]
    fn test_set_webhook_with_certificate() {
        let mut request = SetWebhook::new("https://example.com/hook");
        request.certificate = Some(InputFile::bytes("cert.pem", "-----BEGIN"));
        request.secret_token = Some("s3cret".into());
        let mut payload = Payload::new();
        request.write_params(&mut payload);
        assert!(payload.has_uploads());
        assert_eq!(payload.get("url"), Some("https://example.com/hook"));
        assert_eq!(payload.get("secret_token"), Some("s3cret"));
        assert_eq!(payload.get("max_connections"), None);
    }
}
