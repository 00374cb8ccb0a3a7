//! Long polling.
//!
//! [`LongPoller`] owns the update offset. Each [`poll`](LongPoller::poll)
//! confirms everything up to the previous batch; [`run`](LongPoller::run)
//! drives polls forever, dispatching every update on its own task:
//!
//! ```rust,ignore
//! let mut poller = LongPoller::new().timeout(30);
//! poller.run(&bot.context(), Arc::new(handlers)).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use tgbot_core::api::GetUpdates;
use tgbot_core::{Context, Error, Result, Update, UpdateKind};

use crate::error::{PollError, PollResult};
use crate::handler::Handlers;

/// Server-side maximum for `limit`.
pub const MAX_LIMIT: u32 = 100;

// ============================================================================
// Backoff
// ============================================================================

/// Exponential delay between failed polls.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            multiplier: 2.0,
            current: initial,
        }
    }

    /// The delay to wait now; the following one grows.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(
            Duration::from_secs_f64(self.current.as_secs_f64() * self.multiplier),
            self.max,
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

// ============================================================================
// LongPoller
// ============================================================================

/// `getUpdates` state: offset, batch limit, timeout and kind filter.
///
/// Polling takes `&mut self`, so one poller has at most one poll in flight.
#[derive(Debug, Clone)]
pub struct LongPoller {
    offset: i64,
    limit: u32,
    timeout: u32,
    allowed_updates: Option<Vec<UpdateKind>>,
    backoff: Backoff,
}

impl Default for LongPoller {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT,
            timeout: 30,
            allowed_updates: None,
            backoff: Backoff::default(),
        }
    }
}

impl LongPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates per poll, clamped to `1..=100`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Long-poll timeout in seconds.
    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout = seconds;
        self
    }

    /// Kinds to receive. Left unset, [`run`](Self::run) asks for the kinds
    /// the handler table handles.
    pub fn allowed_updates(mut self, kinds: impl IntoIterator<Item = UpdateKind>) -> Self {
        self.allowed_updates = Some(kinds.into_iter().collect());
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Starts from `offset` instead of the oldest unconfirmed update.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Offset the next poll will request.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Runs one `getUpdates` call.
    ///
    /// A non-empty batch moves the offset past its last update; an empty one
    /// leaves it alone. Errors, cancellation included, are returned as-is.
    pub async fn poll(&mut self, ctx: &Context) -> Result<Vec<Update>> {
        let request = GetUpdates {
            offset: self.offset,
            limit: self.limit,
            timeout: self.timeout,
            allowed_updates: self.allowed_updates.clone(),
        };
        let updates = ctx.execute(request).await?;
        if let Some(last) = updates.last() {
            self.offset = last.id + 1;
        }
        debug!(count = updates.len(), offset = self.offset, "polled updates");
        Ok(updates)
    }

    /// Polls until `ctx` is cancelled, a handler latches an error, or a
    /// request fails in a way retrying cannot fix.
    ///
    /// Every update is dispatched on its own task; piggyback calls returned
    /// by handlers are sent as ordinary requests. Before returning, waits for
    /// in-flight handlers.
    pub async fn run(&mut self, ctx: &Context, handlers: Arc<Handlers>) -> PollResult {
        if self.allowed_updates.is_none() {
            self.allowed_updates = Some(handlers.allowed_updates());
        }
        info!(
            limit = self.limit,
            timeout = self.timeout,
            allowed_updates = ?self.allowed_updates,
            "long polling started"
        );

        let tracker = TaskTracker::new();
        let result = self.drive(ctx, &handlers, &tracker).await;
        tracker.close();
        tracker.wait().await;

        match &result {
            Ok(()) => info!(offset = self.offset, "long polling stopped"),
            Err(err) => warn!(offset = self.offset, error = %err, "long polling aborted"),
        }
        result
    }

    async fn drive(&mut self, ctx: &Context, handlers: &Arc<Handlers>, tracker: &TaskTracker) -> PollResult {
        loop {
            if let Some(err) = ctx.bot().error() {
                return Err(PollError::Handler(err));
            }

            let err = match self.poll(ctx).await {
                Ok(updates) => {
                    self.backoff.reset();
                    for update in updates {
                        spawn_dispatch(tracker, ctx, handlers, update);
                    }
                    continue;
                }
                Err(err) if err.is_cancellation() => return Ok(()),
                Err(err) if is_fatal(&err) => return Err(err.into()),
                Err(err) => err,
            };

            let delay = err.retry_after().unwrap_or_else(|| self.backoff.next_delay());
            warn!(offset = self.offset, delay = ?delay, error = %err, "poll failed, retrying");
            if ctx.guard(tokio::time::sleep(delay)).await.is_err() {
                return Ok(());
            }
        }
    }
}

fn spawn_dispatch(tracker: &TaskTracker, ctx: &Context, handlers: &Arc<Handlers>, update: Update) {
    let ctx = ctx.clone();
    let handlers = Arc::clone(handlers);
    tracker.spawn(async move {
        let update_id = update.id;
        let Some(call) = handlers.dispatch(&ctx, update).await else {
            return;
        };
        let method = call.method().to_string();
        if let Err(err) = call.execute(&ctx).await {
            warn!(update_id, method = %method, error = %err, "reply call failed");
        }
    });
}

/// Errors polling again will not fix: bad token, or a webhook is set.
fn is_fatal(err: &Error) -> bool {
    err.as_api().is_some_and(|api| matches!(api.code, 401 | 404 | 409))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tgbot_core::testing::{MockClient, MockResponse};
    use tgbot_core::types::Message;

    use super::*;
    use crate::handler::Call;

    fn updates(ids: &[i64]) -> serde_json::Value {
        ids.iter()
            .map(|id| {
                json!({
                    "update_id": id,
                    "message": {"message_id": id, "chat": {"id": 7, "type": "private"}, "text": "ping"}
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_offset_advances_past_last_update() {
        let client = MockClient::new();
        client.respond_ok(updates(&[10, 11, 14]));
        client.respond_ok(json!([]));
        client.respond_ok(json!([]));
        let ctx = client.bot().context();
        let mut poller = LongPoller::new().timeout(0);

        assert_eq!(poller.poll(&ctx).await.unwrap().len(), 3);
        assert_eq!(poller.offset(), 15);
        assert!(poller.poll(&ctx).await.unwrap().is_empty());
        poller.poll(&ctx).await.unwrap();

        let offsets: Vec<_> = client
            .calls("getUpdates")
            .iter()
            .map(|r| r.form().get("offset").cloned())
            .collect();
        assert_eq!(offsets, vec![None, Some("15".into()), Some("15".into())]);
    }

    #[tokio::test]
    async fn test_run_dispatches_and_sends_replies() {
        let client = MockClient::new();
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        client.respond_with(move |request| {
            if request.method() != "getUpdates" {
                return MockResponse::Raw(json!({"ok": true, "result": {"message_id": 99, "chat": {"id": 7, "type": "private"}}}).to_string().into());
            }
            let body = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => json!({"ok": true, "result": updates(&[1, 2])}),
                _ => json!({"ok": false, "error_code": 401, "description": "Unauthorized"}),
            };
            MockResponse::Raw(body.to_string().into())
        });

        let mut handlers = Handlers::new();
        handlers.on_message(|_: Context, msg: Message| async move {
            let mut payload = tgbot_core::Payload::new();
            payload.set("text", format!("pong {}", msg.id));
            Call::raw("sendMessage", payload)
        });

        let bot = client.bot();
        let err = LongPoller::new()
            .run(&bot.context(), Arc::new(handlers))
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Request(ref e) if e.as_api().is_some_and(|a| a.code == 401)));

        let replies = client.calls("sendMessage");
        assert_eq!(replies.len(), 2);
        assert!(replies.iter().all(|r| r.form()["chat_id"] == "7"));
        let first = &client.calls("getUpdates")[0].form();
        assert_eq!(first["allowed_updates"], r#"["message"]"#);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let client = MockClient::new();
        client.respond_with(|_| MockResponse::Hang);
        let ctx = client.bot().context().child();
        let handle = {
            let ctx = ctx.clone();
            tokio::spawn(async move { LongPoller::new().run(&ctx, Arc::new(Handlers::new())).await })
        };
        tokio::task::yield_now().await;
        ctx.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_run_returns_latched_error() {
        let client = MockClient::new();
        let bot = client.bot();
        bot.fail("handler exploded");
        let err = LongPoller::new()
            .run(&bot.context(), Arc::new(Handlers::new()))
            .await
            .unwrap_err();
        assert_eq!(err.handler_error().unwrap().to_string(), "handler exploded");
        assert!(client.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_honoured() {
        let client = MockClient::new();
        client.respond_json(json!({"ok": false, "error_code": 429, "description": "Too Many Requests", "parameters": {"retry_after": 5}}));
        client.respond_error(401, "Unauthorized");
        let ctx = client.bot().context();

        let started = tokio::time::Instant::now();
        let result = LongPoller::new().run(&ctx, Arc::new(Handlers::new())).await;
        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(client.calls("getUpdates").len(), 2);
    }

    #[test]
    fn test_backoff() {
        let mut backoff = Backoff::default();
        let delays: Vec<_> = (0..7).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
