//! The webhook protocol, independent of any HTTP server.
//!
//! A server hands every request to [`Webhook::handle`] and writes back the
//! [`WebhookResponse`]. When a handler returns a [`Call`](crate::Call), the
//! call is sent as the response body with an extra `method` parameter, which
//! saves a round trip.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use tgbot_core::{Body, Context, Update};

use crate::handler::Handlers;

/// Header carrying the secret configured with `setWebhook`.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Status, content type and body to write back.
pub struct WebhookResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Body,
}

impl WebhookResponse {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Body::Full(Bytes::new()),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: Body::Full(Bytes::from(body)),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for WebhookResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body", &self.body)
            .finish()
    }
}

/// Receives updates pushed by the Bot API.
#[derive(Clone)]
pub struct Webhook {
    handlers: Arc<Handlers>,
    secret: Option<Arc<str>>,
}

impl Webhook {
    pub fn new(handlers: Arc<Handlers>) -> Self {
        Self {
            handlers,
            secret: None,
        }
    }

    /// Requires requests to carry `secret` in [`SECRET_HEADER`].
    pub fn secret(mut self, secret: impl Into<Arc<str>>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn handlers(&self) -> &Arc<Handlers> {
        &self.handlers
    }

    /// Handles one request.
    ///
    /// Handler failures never turn into a server error: they latch on the bot
    /// and the request is acknowledged with an empty 200.
    pub async fn handle(
        &self,
        ctx: &Context,
        method: &str,
        secret_header: Option<&str>,
        body: &[u8],
    ) -> WebhookResponse {
        // method tokens are case-sensitive
        if method != "POST" {
            return WebhookResponse::error(405, "method not allowed");
        }

        if let Some(secret) = &self.secret {
            let presented = secret_header.unwrap_or_default();
            if !constant_time_eq(secret.as_bytes(), presented.as_bytes()) {
                warn!("webhook request with a wrong secret token");
                return WebhookResponse::error(403, "invalid secret token");
            }
        }

        let update: Update = match serde_json::from_slice(body) {
            Ok(update) => update,
            Err(err) => {
                debug!(error = %err, "undecodable webhook body");
                return WebhookResponse::error(400, &err.to_string());
            }
        };
        let update_id = update.id;

        let Some(call) = self.handlers.dispatch(ctx, update).await else {
            return WebhookResponse::empty(200);
        };

        let (name, mut payload) = call.into_parts();
        trace!(update_id, method = %name, "replying with piggyback call");
        payload.put_text("method", name.clone(), true);
        match payload.into_body() {
            Ok(encoded) => WebhookResponse {
                status: 200,
                content_type: Some(encoded.content_type),
                body: encoded.body,
            },
            Err(err) => {
                warn!(update_id, method = %name, error = %err, "failed to encode piggyback call");
                WebhookResponse::empty(200)
            }
        }
    }
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Webhook")
            .field("handlers", &self.handlers)
            .field("secret", &self.secret.is_some())
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .iter()
        .zip(b)
        .fold(0u8, |acc, (x, y)| std::hint::black_box(acc | (x ^ y)));
    diff == 0
}

#[cfg(test)]
mod tests {
    use tgbot_core::api::SendMessage;
    use tgbot_core::testing::MockClient;
    use tgbot_core::types::Message;
    use tgbot_core::FORM_URLENCODED;

    use super::*;
    use crate::handler::Call;

    const MESSAGE: &[u8] =
        br#"{"update_id":1,"message":{"message_id":3,"chat":{"id":5,"type":"private"},"text":"hi"}}"#;

    fn echo_webhook() -> Webhook {
        let mut handlers = Handlers::new();
        handlers.on_message(|_: Context, _: Message| async move {
            let mut payload = tgbot_core::Payload::new();
            payload.set("text", "ok");
            Call::raw("sendMessage", payload)
        });
        Webhook::new(Arc::new(handlers))
    }

    async fn body_text(response: WebhookResponse) -> String {
        let bytes = response.body.into_bytes().await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_piggyback_reply() {
        let client = MockClient::new();
        let response = echo_webhook()
            .handle(&client.bot().context(), "POST", None, MESSAGE)
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some(FORM_URLENCODED));
        assert_eq!(body_text(response).await, "chat_id=5&method=sendMessage&text=ok");
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_typed_call_reply() {
        let client = MockClient::new();
        let mut handlers = Handlers::new();
        handlers.on_message(|_: Context, msg: Message| async move {
            Call::new(SendMessage::new(msg.chat.id, "typed"))
        });
        let response = Webhook::new(Arc::new(handlers))
            .handle(&client.bot().context(), "POST", None, MESSAGE)
            .await;
        let text = body_text(response).await;
        assert!(text.contains("method=sendMessage"));
        assert!(text.contains("text=typed"));
    }

    #[tokio::test]
    async fn test_rejections() {
        let client = MockClient::new();
        let ctx = client.bot().context();
        let webhook = echo_webhook().secret("s3cret");

        let cases = [
            ("GET", Some("s3cret"), 405, r#"{"error":"method not allowed"}"#),
            ("post", Some("s3cret"), 405, r#"{"error":"method not allowed"}"#),
            ("POST", None, 403, r#"{"error":"invalid secret token"}"#),
            ("POST", Some("s3cre"), 403, r#"{"error":"invalid secret token"}"#),
        ];
        for (method, secret, status, body) in cases {
            let response = webhook.handle(&ctx, method, secret, MESSAGE).await;
            assert_eq!(response.status, status, "{method} {secret:?}");
            assert_eq!(response.content_type.as_deref(), Some("application/json"));
            assert_eq!(body_text(response).await, body);
        }

        let bad = webhook.handle(&ctx, "POST", Some("s3cret"), b"{not json").await;
        assert_eq!(bad.status, 400);
        assert_eq!(bad.content_type.as_deref(), Some("application/json"));
        assert!(body_text(bad).await.starts_with(r#"{"error":"#));

        assert_eq!(webhook.handle(&ctx, "POST", Some("s3cret"), MESSAGE).await.status, 200);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_is_acknowledged() {
        let client = MockClient::new();
        let mut handlers = Handlers::new();
        handlers.on_message(|_: Context, _: Message| async move { Err::<(), _>("boom") });
        let bot = client.bot();
        let response = Webhook::new(Arc::new(handlers))
            .handle(&bot.context(), "POST", None, MESSAGE)
            .await;

        assert_eq!(response.status, 200);
        assert_eq!(body_text(response).await, "");
        assert!(bot.is_failed());
    }

    #[tokio::test]
    async fn test_unhandled_update() {
        let client = MockClient::new();
        let response = Webhook::new(Arc::new(Handlers::new()))
            .handle(&client.bot().context(), "POST", None, MESSAGE)
            .await;
        assert_eq!(response.status, 200);
        assert!(response.content_type.is_none());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
