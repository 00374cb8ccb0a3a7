//! Bot runtime: builds the bot from configuration and runs it in polling or
//! webhook mode until shutdown.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tgbot_runtime::BotRuntime;
//!
//! // tgbot.toml in the current directory, TGBOT_* variables on top
//! let mut runtime = BotRuntime::new()?;
//! runtime.handlers().on_message(echo);
//! runtime.run().await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use figment::Provider;
use figment::providers::Serialized;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tgbot_core::api::DeleteWebhook;
use tgbot_core::{Bot, Context, HttpClient, UpdateKind};
use tgbot_framework::{Handlers, LongPoller};

use crate::config::{ConfigLoader, PollingConfig, TgbotConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Runs one bot with a handler table.
pub struct BotRuntime {
    config: TgbotConfig,
    handlers: Handlers,
    client: Option<Arc<dyn HttpClient>>,
}

impl BotRuntime {
    /// Loads configuration from the current directory and the environment.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration and initializes
    /// logging from it.
    pub fn from_config(config: TgbotConfig) -> Self {
        logging::init_from_config(&config.logging);
        info!(
            mode = if config.webhook.is_some() { "webhook" } else { "polling" },
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );
        Self {
            config,
            handlers: Handlers::new(),
            client: None,
        }
    }

    pub fn config(&self) -> &TgbotConfig {
        &self.config
    }

    /// The handler table to register handlers on.
    pub fn handlers(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// Replaces the whole handler table.
    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Uses `client` instead of the default `reqwest` client.
    pub fn with_client(mut self, client: impl HttpClient) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(self) -> RuntimeResult<()> {
        let shutdown = CancellationToken::new();
        let signals = tokio::spawn(wait_for_shutdown(shutdown.clone()));
        let result = self.run_until(shutdown).await;
        signals.abort();
        result
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// Returns early with an error if the bot cannot start, polling hits an
    /// unrecoverable API error, or a handler latches an error.
    pub async fn run_until(self, shutdown: CancellationToken) -> RuntimeResult<()> {
        let Self {
            config,
            handlers,
            client,
        } = self;

        let bot = build_bot(&config, client)?;
        let ctx = bot.context().child();
        let watcher = {
            let ctx = ctx.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                debug!("shutdown requested");
                ctx.cancel();
            })
        };

        let handlers = Arc::new(handlers);
        let result = match &config.webhook {
            Some(webhook) => {
                run_webhook(&ctx, &config, webhook, handlers, shutdown).await
            }
            None => run_polling(&ctx, &config.polling, handlers).await,
        };

        watcher.abort();
        info!("Runtime stopped");
        result
    }
}

fn build_bot(config: &TgbotConfig, client: Option<Arc<dyn HttpClient>>) -> RuntimeResult<Bot> {
    let client = match client {
        Some(client) => client,
        None => default_client(config)?,
    };
    Ok(Bot::builder(config.token.clone(), client)
        .api_base(&config.api_base)
        .file_base(&config.file_base)
        .build())
}

#[cfg(feature = "http-client")]
fn default_client(config: &TgbotConfig) -> RuntimeResult<Arc<dyn HttpClient>> {
    let client = tgbot_transport::ReqwestClient::with_timeout(config.request_timeout())?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "http-client"))]
fn default_client(_config: &TgbotConfig) -> RuntimeResult<Arc<dyn HttpClient>> {
    Err(RuntimeError::Unsupported("HTTP client"))
}

// =============================================================================
// Polling mode
// =============================================================================

async fn run_polling(
    ctx: &Context,
    polling: &PollingConfig,
    handlers: Arc<Handlers>,
) -> RuntimeResult<()> {
    // a registered webhook makes getUpdates fail with 409
    match ctx.execute(DeleteWebhook::default()).await {
        Ok(_) => debug!("webhook cleared"),
        Err(err) if err.is_cancellation() => return Ok(()),
        Err(err) => return Err(err.into()),
    }

    let mut poller = LongPoller::new()
        .limit(polling.limit)
        .timeout(polling.timeout_secs);
    if !polling.allowed_updates.is_empty() {
        poller = poller.allowed_updates(polling.allowed_updates.iter().copied());
    }
    poller.run(ctx, handlers).await?;
    Ok(())
}

// =============================================================================
// Webhook mode
// =============================================================================

#[cfg(feature = "webhook")]
async fn run_webhook(
    ctx: &Context,
    config: &TgbotConfig,
    webhook: &crate::config::WebhookConfig,
    handlers: Arc<Handlers>,
    shutdown: CancellationToken,
) -> RuntimeResult<()> {
    use tgbot_core::api::SetWebhook;
    use tgbot_framework::secret::{DEFAULT_SECRET_BYTES, generate_secret};
    use tgbot_framework::Webhook;
    use tgbot_transport::WebhookServer;

    let secret = match &webhook.secret_token {
        Some(secret) => secret.clone(),
        None => generate_secret(DEFAULT_SECRET_BYTES)
            .map_err(|err| RuntimeError::Secret(err.to_string()))?,
    };

    // listen before registering, so the first delivery finds the port open
    let receiver = Webhook::new(Arc::clone(&handlers)).secret(secret.as_str());
    let server = WebhookServer::bind(&webhook.listen, &webhook.path, receiver, ctx.clone()).await?;

    let mut request = SetWebhook::new(&webhook.url);
    if let Some(path) = &webhook.certificate {
        request.certificate = Some(open_certificate(path).await?);
    }
    request.ip_address = webhook.ip_address.clone();
    request.max_connections = webhook.max_connections;
    request.allowed_updates = Some(allowed_updates(&config.polling.allowed_updates, &handlers));
    request.drop_pending_updates = webhook.drop_pending_updates;
    request.secret_token = Some(secret);

    match ctx.execute(request).await {
        Ok(_) => info!(url = %webhook.url, "webhook registered"),
        Err(err) if err.is_cancellation() => return Ok(()),
        Err(err) => return Err(err.into()),
    }

    server.serve(shutdown).await?;

    match ctx.bot().error() {
        Some(err) => Err(RuntimeError::Handler(err)),
        None => Ok(()),
    }
}

#[cfg(not(feature = "webhook"))]
async fn run_webhook(
    _ctx: &Context,
    _config: &TgbotConfig,
    _webhook: &crate::config::WebhookConfig,
    _handlers: Arc<Handlers>,
    _shutdown: CancellationToken,
) -> RuntimeResult<()> {
    Err(RuntimeError::Unsupported("webhook"))
}

#[cfg(feature = "webhook")]
async fn open_certificate(path: &Path) -> RuntimeResult<tgbot_core::InputFile> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| RuntimeError::Certificate {
            path: path.display().to_string(),
            source,
        })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "certificate.pem".to_string());
    Ok(tgbot_core::InputFile::reader(name, file))
}

/// The configured kinds, or the kinds with a handler when none are set.
#[cfg_attr(not(feature = "webhook"), allow(dead_code))]
fn allowed_updates(configured: &[UpdateKind], handlers: &Handlers) -> Vec<UpdateKind> {
    if configured.is_empty() {
        handlers.allowed_updates()
    } else {
        configured.to_vec()
    }
}

/// Waits for Ctrl+C or SIGTERM, then cancels `shutdown`.
async fn wait_for_shutdown(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to register SIGTERM handler");
                if signal::ctrl_c().await.is_err() {
                    return;
                }
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C, shutting down");
    }

    shutdown.cancel();
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`BotRuntime`] with custom configuration sources.
///
/// ```rust,ignore
/// let runtime = BotRuntime::builder()
///     .config_file("deploy/tgbot.toml")
///     .token(std::env::var("BOT_TOKEN")?)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Overrides the token from every other source.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config_loader = self
            .config_loader
            .provider(Serialized::default("token", token.into()));
        self
    }

    /// Merges any figment provider over the other sources.
    pub fn provider(mut self, provider: impl Provider) -> Self {
        self.config_loader = self.config_loader.provider(provider);
        self
    }

    /// Loads, validates and builds.
    pub fn build(self) -> RuntimeResult<BotRuntime> {
        let config = self.config_loader.load()?;
        Ok(BotRuntime::from_config(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tgbot_core::testing::{MockClient, MockResponse, TEST_TOKEN};
    use tgbot_core::types::Message;
    use tgbot_core::Payload;
    use tgbot_framework::{Call, PollError};

    use super::*;

    fn config() -> TgbotConfig {
        TgbotConfig {
            token: TEST_TOKEN.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_polling_until_fatal_error() {
        let client = MockClient::new();
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        client.respond_with(move |request| {
            let body = match (request.method(), counter.load(Ordering::SeqCst)) {
                ("getUpdates", 0) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    json!({"ok": true, "result": [{"update_id": 4, "message": {"message_id": 1, "chat": {"id": 9, "type": "private"}, "text": "hi"}}]})
                }
                ("getUpdates", _) => json!({"ok": false, "error_code": 409, "description": "Conflict"}),
                _ => json!({"ok": true, "result": true}),
            };
            MockResponse::Raw(body.to_string().into())
        });

        let mut runtime = BotRuntime::from_config(config()).with_client(client.clone());
        runtime.handlers().on_message(|_: Context, msg: Message| async move {
            let mut payload = Payload::new();
            payload.set("text", msg.text.unwrap_or_default());
            Call::raw("sendMessage", payload)
        });

        let err = runtime.run_until(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Poll(PollError::Request(_))));

        let methods: Vec<_> = client.requests().iter().map(|r| r.method().to_string()).collect();
        assert_eq!(methods.first().map(String::as_str), Some("deleteWebhook"));
        let reply = &client.calls("sendMessage")[0];
        assert_eq!(reply.form()["chat_id"], "9");
        assert_eq!(reply.form()["text"], "hi");
    }

    #[tokio::test]
    async fn test_shutdown_stops_polling() {
        let client = MockClient::new();
        client.respond_with(|request| match request.method() {
            "getUpdates" => MockResponse::Hang,
            _ => MockResponse::Raw(r#"{"ok":true,"result":true}"#.into()),
        });
        let runtime = BotRuntime::from_config(config()).with_client(client.clone());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(runtime.run_until(shutdown.clone()));

        while client.calls("getUpdates").is_empty() {
            tokio::task::yield_now().await;
        }
        shutdown.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[test]
    fn test_allowed_updates_fallback() {
        let mut handlers = Handlers::new();
        handlers.on_poll_answer(|_: Context, _: tgbot_core::types::PollAnswer| async {});
        assert_eq!(allowed_updates(&[], &handlers), vec![UpdateKind::PollAnswer]);
        assert_eq!(
            allowed_updates(&[UpdateKind::Message], &handlers),
            vec![UpdateKind::Message]
        );
    }

    #[test]
    fn test_builder_token_override() {
        let runtime = BotRuntime::builder()
            .without_env()
            .search_path("/nonexistent/tgbot-config")
            .token("42:override")
            .build()
            .unwrap();
        assert_eq!(runtime.config().token, "42:override");
        assert!(BotRuntime::builder()
            .without_env()
            .search_path("/nonexistent/tgbot-config")
            .build()
            .is_err());
    }

    #[cfg(not(feature = "webhook"))]
    #[tokio::test]
    async fn test_webhook_needs_feature() {
        let mut config = config();
        config.webhook = Some(crate::config::WebhookConfig {
            listen: "127.0.0.1:0".into(),
            path: "/hook".into(),
            url: "https://example.com/hook".into(),
            secret_token: None,
            certificate: None,
            ip_address: None,
            max_connections: 40,
            drop_pending_updates: false,
        });
        let runtime = BotRuntime::from_config(config).with_client(MockClient::new());
        let err = runtime.run_until(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Unsupported("webhook")));
    }

    #[cfg(feature = "webhook")]
    #[tokio::test]
    async fn test_webhook_registration() {
        let client = MockClient::new();
        let mut config = config();
        config.webhook = Some(crate::config::WebhookConfig {
            listen: "127.0.0.1:0".into(),
            path: "/hook".into(),
            url: "https://example.com/hook".into(),
            secret_token: None,
            certificate: None,
            ip_address: Some("203.0.113.7".into()),
            max_connections: 10,
            drop_pending_updates: true,
        });
        let mut runtime = BotRuntime::from_config(config).with_client(client.clone());
        runtime.handlers().on_message(|_: Context, _: Message| async {});

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(runtime.run_until(shutdown.clone()));
        while client.calls("setWebhook").is_empty() {
            tokio::task::yield_now().await;
        }
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        let form = client.calls("setWebhook")[0].form();
        assert_eq!(form["url"], "https://example.com/hook");
        assert_eq!(form["max_connections"], "10");
        assert_eq!(form["drop_pending_updates"], "true");
        assert_eq!(form["allowed_updates"], r#"["message"]"#);
        assert_eq!(form["secret_token"].len(), 43);
    }
}
