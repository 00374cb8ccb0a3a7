//! Context tree.
//!
//! A [`Context`] is an immutable node carrying everything an outbound call
//! needs besides its own parameters: the bot, a cancellation token, an
//! optional deadline, a display path for logs and a set of inherited base
//! parameters. Deriving a context never mutates its parent.
//!
//! ```text
//! root ("")
//! └── named("poller")           shares the token
//!     └── child()               child token: cancel() stops this subtree only
//!         └── with_param("chat_id", 5)
//!                                every call through it gets chat_id=5
//!                                unless the call sets chat_id itself
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::Method;
use crate::bot::Bot;
use crate::error::{Error, Result};
use crate::http::BodyStream;
use crate::payload::Payload;
use crate::transport;

/// Separator between path segments of named contexts.
pub const PATH_SEPARATOR: &str = "::";

/// Handle threaded through every outbound call.
#[derive(Clone)]
pub struct Context {
    node: Arc<Node>,
}

#[derive(Clone)]
struct Node {
    bot: Bot,
    path: String,
    token: CancellationToken,
    deadline: Option<Instant>,
    base: Arc<BTreeMap<String, String>>,
}

impl Context {
    /// Root context of `bot`.
    pub fn new(bot: Bot) -> Self {
        Self {
            node: Arc::new(Node {
                bot,
                path: String::new(),
                token: CancellationToken::new(),
                deadline: None,
                base: Arc::default(),
            }),
        }
    }

    fn derive(&self, f: impl FnOnce(&mut Node)) -> Self {
        let mut node = (*self.node).clone();
        f(&mut node);
        Self {
            node: Arc::new(node),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn bot(&self) -> &Bot {
        &self.node.bot
    }

    /// Display path, segments joined by `::`.
    pub fn path(&self) -> &str {
        &self.node.path
    }

    /// Inherited base parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.node.base
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.node.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.node.token
    }

    /// Returns `true` if cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.node.token.is_cancelled() || self.node.deadline.is_some_and(|d| d <= Instant::now())
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Appends `name` to the display path. An empty name returns `self`.
    pub fn named(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        self.derive(|node| {
            node.path = if node.path.is_empty() {
                name.to_string()
            } else {
                format!("{}{PATH_SEPARATOR}{name}", node.path)
            };
        })
    }

    /// Adds one inherited parameter.
    pub fn with_param(&self, key: &str, value: impl fmt::Display) -> Self {
        self.with_params([(key.to_string(), value.to_string())])
    }

    /// Adds several inherited parameters; later values replace earlier ones.
    pub fn with_params<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.derive(|node| {
            let base = Arc::make_mut(&mut node.base);
            for (key, value) in params {
                base.insert(key.into(), value.into());
            }
        })
    }

    /// Drops every inherited parameter.
    pub fn reset_params(&self) -> Self {
        self.derive(|node| node.base = Arc::default())
    }

    /// A context with a child cancellation token.
    ///
    /// Cancelling the child leaves the parent running; cancelling the parent
    /// cancels the child.
    pub fn child(&self) -> Self {
        self.derive(|node| node.token = node.token.child_token())
    }

    /// A child context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// A child context that expires at `deadline`, or at the parent's
    /// deadline if that is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        self.derive(|node| {
            node.token = node.token.child_token();
            node.deadline = Some(node.deadline.map_or(deadline, |d| d.min(deadline)));
        })
    }

    /// Cancels this context's token.
    ///
    /// The token is shared with contexts derived through [`named`](Self::named)
    /// and the parameter methods; use [`child`](Self::child) to scope it.
    pub fn cancel(&self) {
        self.node.token.cancel();
    }

    /// Completes when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Error {
        match self.guard(std::future::pending::<()>()).await {
            Err(err) => err,
            Ok(()) => Error::Canceled,
        }
    }

    /// Races `future` against cancellation and the deadline.
    ///
    /// Cancellation wins over a ready future, so a cancelled context never
    /// starts new work.
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output> {
        let deadline = async {
            match self.node.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.node.token.cancelled() => Err(Error::Canceled),
            _ = deadline => Err(Error::DeadlineExceeded),
            output = future => Ok(output),
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Calls `method` with `payload` and decodes the result.
    ///
    /// Base parameters are merged into the payload first; keys set by the
    /// caller win.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, payload: Payload) -> Result<T> {
        transport::call(self, method, payload).await
    }

    /// Executes a typed method.
    pub async fn execute<M: Method>(&self, method: M) -> Result<M::Response> {
        let mut payload = Payload::new();
        method.write_params(&mut payload);
        self.request(M::NAME, payload).await
    }

    /// Downloads a file by its `file_path`.
    ///
    /// The returned stream is owned by the caller.
    pub async fn download(&self, file_path: &str) -> Result<BodyStream> {
        transport::download(self, file_path).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.node.path)
            .field("params", &self.node.base)
            .field("deadline", &self.node.deadline)
            .field("cancelled", &self.node.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;

    fn root() -> Context {
        MockClient::new().bot().context()
    }

    #[test]
    fn test_named_paths() {
        let ctx = root().named("poller").named("").named("update-10");
        assert_eq!(ctx.path(), "poller::update-10");
        assert_eq!(root().named("").path(), "");
    }

    #[test]
    fn test_params_are_copy_on_write() {
        let parent = root().with_param("chat_id", 5);
        let child = parent.with_param("parse_mode", "HTML").with_param("chat_id", 6);
        assert_eq!(parent.params().len(), 1);
        assert_eq!(parent.params()["chat_id"], "5");
        assert_eq!(child.params()["chat_id"], "6");
        assert_eq!(child.params()["parse_mode"], "HTML");
        assert!(child.reset_params().params().is_empty());
        assert_eq!(parent.params().len(), 1);
    }

    #[tokio::test]
    async fn test_child_cancellation_is_scoped() {
        let parent = root();
        let child = parent.child();
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
        assert!(matches!(child.guard(async { 1 }).await, Err(Error::Canceled)));
        assert_eq!(parent.guard(async { 1 }).await.unwrap(), 1);

        let grandchild = parent.child().child();
        parent.cancel();
        assert!(grandchild.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = root().with_timeout(Duration::from_secs(5));
        let result = ctx
            .guard(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));

        let tighter = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(tighter.deadline(), ctx.deadline());
    }
}
