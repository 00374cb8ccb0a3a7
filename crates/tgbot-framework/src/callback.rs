//! Routers for callback queries and poll answers.
//!
//! Callback queries are routed by the message that carries the keyboard, so
//! a conversation can wait for a button press on one specific message:
//!
//! ```rust,ignore
//! let sent = ctx.execute(SendMessage::new(chat, "Sure?").reply_markup(keyboard)).await?;
//! callbacks.register_once(MessageKey::of(&sent), |ctx, query: CallbackQuery| async move {
//!     CallbackAnswer::text("Confirmed")
//! });
//!
//! handlers.on_callback_query(move |ctx, query| {
//!     let callbacks = Arc::clone(&callbacks);
//!     async move { callbacks.handle(&ctx, query).await; }
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use tgbot_core::api::CallbackAnswer;
use tgbot_core::types::{CallbackQuery, Message, PollAnswer};
use tgbot_core::{Context, Error};

use crate::context::QueryContext;
use crate::router::{Route, Router, short_type_name};

/// Identity of a message carrying an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// A message in a chat.
    Chat { chat_id: i64, message_id: i64 },
    /// A message sent in inline mode.
    Inline(String),
}

impl MessageKey {
    pub fn of(message: &Message) -> Self {
        Self::Chat {
            chat_id: message.chat.id,
            message_id: message.id,
        }
    }

    /// The key of the message a callback query came from.
    pub fn from_query(query: &CallbackQuery) -> Option<Self> {
        if let Some(message) = &query.message {
            return Some(Self::of(message));
        }
        query.inline_message_id.clone().map(Self::Inline)
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat { chat_id, message_id } => write!(f, "{chat_id}/{message_id}"),
            Self::Inline(id) => write!(f, "inline/{id}"),
        }
    }
}

// ============================================================================
// Callback router
// ============================================================================

type ErrorHook = Box<dyn FnOnce(Error) + Send>;

/// What a callback route returns: the answer and what to do if sending it
/// fails.
pub struct CallbackReply {
    answer: CallbackAnswer,
    on_error: Option<ErrorHook>,
}

impl CallbackReply {
    pub fn new(answer: CallbackAnswer) -> Self {
        Self {
            answer,
            on_error: None,
        }
    }

    /// Called with the transport error if answering fails.
    pub fn on_error(mut self, hook: impl FnOnce(Error) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }
}

impl From<CallbackAnswer> for CallbackReply {
    fn from(answer: CallbackAnswer) -> Self {
        Self::new(answer)
    }
}

impl fmt::Debug for CallbackReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackReply")
            .field("answer", &self.answer)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Context of a callback route.
pub type CallbackContext = QueryContext<CallbackAnswer>;

/// A [`Router`] for callback queries keyed by [`MessageKey`].
///
/// The route's reply is sent through the query's answer gate.
#[derive(Debug, Default)]
pub struct CallbackRouter {
    inner: Router<CallbackContext, MessageKey, CallbackQuery, CallbackReply>,
}

impl CallbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&self, key: MessageKey, handler: F) -> bool
    where
        F: Fn(CallbackContext, CallbackQuery) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<CallbackReply>,
    {
        self.insert(key, Self::route_of(handler))
    }

    pub fn register_once<F, Fut>(&self, key: MessageKey, handler: F) -> bool
    where
        F: Fn(CallbackContext, CallbackQuery) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<CallbackReply>,
    {
        self.insert(key, Self::route_of(handler).once())
    }

    /// Inserts a fully configured route.
    pub fn insert(
        &self,
        key: MessageKey,
        route: Route<CallbackContext, MessageKey, CallbackQuery, CallbackReply>,
    ) -> bool {
        self.inner.insert(key, route)
    }

    pub fn unregister(&self, key: &MessageKey) -> bool {
        self.inner.unregister(key)
    }

    pub fn contains(&self, key: &MessageKey) -> bool {
        self.inner.contains(key)
    }

    /// Routes `query` and answers it with the route's reply.
    ///
    /// Returns `false` if no route matched; the query is left unanswered.
    pub async fn handle(&self, ctx: &CallbackContext, query: CallbackQuery) -> bool {
        let Some(key) = MessageKey::from_query(&query) else {
            trace!(query_id = %query.id, "callback query without a message");
            return false;
        };
        let Some(reply) = self.inner.route(ctx, &key, query).await else {
            return false;
        };
        if let Err(err) = ctx.answer(reply.answer).await {
            match reply.on_error {
                Some(hook) => hook(err),
                None => warn!(key = %key, error = %err, "failed to answer callback query"),
            }
        }
        true
    }

    fn route_of<F, Fut>(handler: F) -> Route<CallbackContext, MessageKey, CallbackQuery, CallbackReply>
    where
        F: Fn(CallbackContext, CallbackQuery) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<CallbackReply>,
    {
        let handler = Arc::new(handler);
        Route::new(move |ctx: CallbackContext, query: CallbackQuery| {
            let handler = Arc::clone(&handler);
            async move {
                let reply: CallbackReply = handler(ctx, query).await.into();
                reply
            }
        })
        .name(short_type_name::<F>())
    }
}

// ============================================================================
// Poll router
// ============================================================================

/// A [`Router`] for poll answers keyed by poll id.
pub type PollRouter = Router<Context, String, PollAnswer>;

impl PollRouter {
    /// Routes `answer` by its poll id. Returns `false` if nothing matched.
    pub async fn handle(&self, ctx: &Context, answer: PollAnswer) -> bool {
        let key = answer.poll_id.clone();
        self.route(ctx, &key, answer).await.is_some()
    }
}
