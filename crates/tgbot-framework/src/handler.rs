//! The handler table.
//!
//! [`Handlers`] holds at most one callback per update kind. A callback takes
//! the kind's context and payload and returns anything implementing
//! [`IntoReply`]:
//!
//! ```rust,ignore
//! let mut handlers = Handlers::new();
//! handlers.on_message(|ctx: Context, msg: Message| async move {
//!     let text = msg.text.unwrap_or_default();
//!     Call::new(SendMessage::new(msg.chat.id, text))
//! });
//! handlers.on_callback_query(|ctx: QueryContext<CallbackAnswer>, query: CallbackQuery| async move {
//!     ctx.answer(CallbackAnswer::text("ok")).await
//! });
//! ```
//!
//! Handlers for message and chat updates (messages, reactions, member and
//! boost changes, join requests) get a context whose base parameters hold
//! the update's `chat_id`, so replies need not repeat it. Methods that
//! address an inline message by `inline_message_id` must not carry a
//! `chat_id`; call [`Context::reset_params`] first:
//!
//! ```rust,ignore
//! ctx.reset_params()
//!     .execute(EditMessageText::inline(inline_id, "edited"))
//!     .await?;
//! ```
//!
//! A returned [`Call`] is a piggyback: the webhook receiver writes it into
//! the HTTP response, the long-poller executes it as a normal request.
//! Returning `Err` latches the error on the bot and stops further dispatch.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, error, trace};

use tgbot_core::api::{CallbackAnswer, InlineAnswer, PreCheckoutAnswer, ShippingAnswer};
use tgbot_core::types::{
    BusinessConnection, BusinessMessagesDeleted, CallbackQuery, ChatBoostRemoved,
    ChatBoostUpdated, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery,
    Message, MessageReactionCountUpdated, MessageReactionUpdated, PaidMediaPurchased, Poll,
    PollAnswer, PreCheckoutQuery, ShippingQuery,
};
use tgbot_core::{BoxError, Context, IntoParams, Method, Payload, Update, UpdateKind};

use crate::context::{QueryContext, RouteContext};

// ============================================================================
// Call
// ============================================================================

/// A method invocation returned by a handler.
pub struct Call {
    method: String,
    payload: Payload,
}

impl Call {
    pub fn new<M: Method>(method: M) -> Self {
        let mut payload = Payload::new();
        method.write_params(&mut payload);
        Self::raw(M::NAME, payload)
    }

    /// A call by method name, for methods without a typed record.
    pub fn raw(method: impl Into<String>, payload: Payload) -> Self {
        Self {
            method: method.into(),
            payload,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_parts(self) -> (String, Payload) {
        (self.method, self.payload)
    }

    /// Sends the call as an ordinary request.
    pub async fn execute(self, ctx: &Context) -> tgbot_core::Result<serde_json::Value> {
        ctx.request(&self.method, self.payload).await
    }

    fn merge_base(&mut self, ctx: &Context) {
        self.payload.merge_base(ctx.params());
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("payload", &self.payload.snapshot(&self.method).to_string())
            .finish()
    }
}

// ============================================================================
// IntoReply
// ============================================================================

/// What a handler produced: an optional piggyback call, or an error.
pub type Reply = Result<Option<Call>, BoxError>;

/// Converts handler return values into a [`Reply`].
pub trait IntoReply: Send {
    fn into_reply(self) -> Reply;
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Ok(None)
    }
}

impl IntoReply for Call {
    fn into_reply(self) -> Reply {
        Ok(Some(self))
    }
}

impl IntoReply for Option<Call> {
    fn into_reply(self) -> Reply {
        Ok(self)
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError> + Send,
{
    fn into_reply(self) -> Reply {
        self.map_err(Into::into)?.into_reply()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// An update callback.
///
/// Implemented for every `Fn(C, T) -> impl Future<Output: IntoReply>`.
pub trait Handler<C, T>: Send + Sync + 'static {
    fn call(&self, ctx: C, payload: T) -> BoxFuture<'static, Reply>;
}

impl<F, Fut, C, T> Handler<C, T> for F
where
    F: Fn(C, T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    fn call(&self, ctx: C, payload: T) -> BoxFuture<'static, Reply> {
        let future = self(ctx, payload);
        Box::pin(async move { future.await.into_reply() })
    }
}

/// A type-erased [`Handler`].
pub type BoxedHandler<C, T> = Arc<dyn Handler<C, T>>;

// ============================================================================
// UpdatePayload
// ============================================================================

/// A payload carried by an update field, with the context its handler gets.
pub trait UpdatePayload: Send + 'static {
    type Context: RouteContext;

    /// Builds the handler context from the update's context.
    fn handler_context(&self, ctx: Context) -> Self::Context;
}

// Adds the chat's id as a base parameter.
macro_rules! chat_scoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl UpdatePayload for $ty {
                type Context = Context;

                fn handler_context(&self, ctx: Context) -> Context {
                    ctx.with_param("chat_id", self.chat.id)
                }
            }
        )*
    };
}

chat_scoped!(
    Message,
    BusinessMessagesDeleted,
    MessageReactionUpdated,
    MessageReactionCountUpdated,
    ChatMemberUpdated,
    ChatJoinRequest,
    ChatBoostUpdated,
    ChatBoostRemoved,
);

macro_rules! unscoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl UpdatePayload for $ty {
                type Context = Context;

                fn handler_context(&self, ctx: Context) -> Context {
                    ctx
                }
            }
        )*
    };
}

unscoped!(BusinessConnection, ChosenInlineResult, PaidMediaPurchased, Poll, PollAnswer);

macro_rules! query_scoped {
    ($($ty:ty => $answer:ty),* $(,)?) => {
        $(
            impl UpdatePayload for $ty {
                type Context = QueryContext<$answer>;

                fn handler_context(&self, ctx: Context) -> QueryContext<$answer> {
                    QueryContext::new(ctx, self.id.as_str())
                }
            }
        )*
    };
}

query_scoped! {
    CallbackQuery => CallbackAnswer,
    InlineQuery => InlineAnswer,
    ShippingQuery => ShippingAnswer,
    PreCheckoutQuery => PreCheckoutAnswer,
}

// ============================================================================
// Handlers
// ============================================================================

macro_rules! handler_table {
    ($( $field:ident, $setter:ident: $kind:ident => $ty:ty ),* $(,)?) => {
        /// One optional callback per update kind.
        #[derive(Clone, Default)]
        pub struct Handlers {
            $( $field: Option<BoxedHandler<<$ty as UpdatePayload>::Context, $ty>>, )*
        }

        impl Handlers {
            $(
                #[doc = concat!("Sets the `", stringify!($field), "` callback, replacing any previous one.")]
                pub fn $setter<H>(&mut self, handler: H) -> &mut Self
                where
                    H: Handler<<$ty as UpdatePayload>::Context, $ty>,
                {
                    self.$field = Some(Arc::new(handler));
                    self
                }
            )*

            /// Returns `true` if a callback is registered for `kind`.
            pub fn handles(&self, kind: UpdateKind) -> bool {
                match kind {
                    $( UpdateKind::$kind => self.$field.is_some(), )*
                }
            }

            /// Kinds with a registered callback, in field order.
            ///
            /// Passed as `allowed_updates` so the server only delivers what
            /// is handled.
            pub fn allowed_updates(&self) -> Vec<UpdateKind> {
                UpdateKind::ALL
                    .iter()
                    .copied()
                    .filter(|&kind| self.handles(kind))
                    .collect()
            }

            /// Runs the callback for the first populated field that has one.
            ///
            /// Updates nobody handles are dropped, as is everything once the
            /// bot's error latch is set. Returns the handler's piggyback call
            /// with the context's base parameters merged in.
            pub async fn dispatch(&self, ctx: &Context, update: Update) -> Option<Call> {
                if ctx.bot().is_failed() {
                    debug!(update_id = update.id, "bot failed, dropping update");
                    return None;
                }
                let Update { id, $( $field, )* } = update;
                $(
                    if let (Some(handler), Some(payload)) = (&self.$field, $field) {
                        let ctx = payload.handler_context(ctx.named(UpdateKind::$kind.as_str()));
                        debug!(update_id = id, kind = UpdateKind::$kind.as_str(), path = ctx.context().path(), "dispatching");
                        let reply = handler.call(ctx.clone(), payload).await;
                        return finish(ctx.context(), id, UpdateKind::$kind, reply);
                    }
                )*
                trace!(update_id = id, "no handler for update");
                None
            }
        }
    };
}

handler_table! {
    message, on_message: Message => Message,
    edited_message, on_edited_message: EditedMessage => Message,
    channel_post, on_channel_post: ChannelPost => Message,
    edited_channel_post, on_edited_channel_post: EditedChannelPost => Message,
    business_connection, on_business_connection: BusinessConnection => BusinessConnection,
    business_message, on_business_message: BusinessMessage => Message,
    edited_business_message, on_edited_business_message: EditedBusinessMessage => Message,
    deleted_business_messages, on_deleted_business_messages: DeletedBusinessMessages => BusinessMessagesDeleted,
    message_reaction, on_message_reaction: MessageReaction => MessageReactionUpdated,
    message_reaction_count, on_message_reaction_count: MessageReactionCount => MessageReactionCountUpdated,
    inline_query, on_inline_query: InlineQuery => InlineQuery,
    chosen_inline_result, on_chosen_inline_result: ChosenInlineResult => ChosenInlineResult,
    callback_query, on_callback_query: CallbackQuery => CallbackQuery,
    shipping_query, on_shipping_query: ShippingQuery => ShippingQuery,
    pre_checkout_query, on_pre_checkout_query: PreCheckoutQuery => PreCheckoutQuery,
    purchased_paid_media, on_purchased_paid_media: PurchasedPaidMedia => PaidMediaPurchased,
    poll, on_poll: Poll => Poll,
    poll_answer, on_poll_answer: PollAnswer => PollAnswer,
    my_chat_member, on_my_chat_member: MyChatMember => ChatMemberUpdated,
    chat_member, on_chat_member: ChatMember => ChatMemberUpdated,
    chat_join_request, on_chat_join_request: ChatJoinRequest => ChatJoinRequest,
    chat_boost, on_chat_boost: ChatBoost => ChatBoostUpdated,
    removed_chat_boost, on_removed_chat_boost: RemovedChatBoost => ChatBoostRemoved,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("kinds", &self.allowed_updates())
            .finish()
    }
}

fn finish(ctx: &Context, update_id: i64, kind: UpdateKind, reply: Reply) -> Option<Call> {
    match reply {
        Ok(Some(mut call)) => {
            call.merge_base(ctx);
            Some(call)
        }
        Ok(None) => None,
        Err(err) => {
            error!(update_id, kind = kind.as_str(), path = ctx.path(), error = %err, "handler failed");
            ctx.bot().fail(err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tgbot_core::api::SendMessage;
    use tgbot_core::testing::MockClient;

    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    fn text_update(id: i64, chat: i64, text: &str) -> Update {
        update(&format!(
            r#"{{"update_id":{id},"message":{{"message_id":1,"chat":{{"id":{chat},"type":"private"}},"text":"{text}"}}}}"#
        ))
    }

    #[test]
    fn test_allowed_updates_follow_registrations() {
        let mut handlers = Handlers::new();
        assert!(handlers.allowed_updates().is_empty());
        handlers
            .on_poll_answer(|_: Context, _: PollAnswer| async {})
            .on_message(|_: Context, _: Message| async {});
        assert_eq!(
            handlers.allowed_updates(),
            vec![UpdateKind::Message, UpdateKind::PollAnswer]
        );
    }

    #[tokio::test]
    async fn test_message_context_carries_chat_id() {
        let client = MockClient::new();
        let ctx = client.bot().context();
        let mut handlers = Handlers::new();
        handlers.on_message(|ctx: Context, msg: Message| async move {
            assert_eq!(ctx.path(), "message");
            assert_eq!(ctx.params().get("chat_id").map(String::as_str), Some("42"));
            // chat_id comes from the context
            let mut payload = Payload::new();
            payload.set("text", msg.text.unwrap_or_default());
            Call::raw("sendMessage", payload)
        });

        let call = handlers.dispatch(&ctx, text_update(1, 42, "hi")).await.unwrap();
        assert_eq!(call.method(), "sendMessage");
        assert_eq!(call.payload().get("chat_id"), Some("42"));
        assert_eq!(call.payload().get("text"), Some("hi"));
    }

    #[tokio::test]
    async fn test_reset_params_drops_chat_id() {
        let client = MockClient::new();
        let mut handlers = Handlers::new();
        handlers.on_message(|ctx: Context, _: Message| async move {
            let mut payload = Payload::new();
            payload.set("text", "scoped");
            ctx.request::<serde_json::Value>("sendMessage", payload).await?;

            let mut payload = Payload::new();
            payload.set("inline_message_id", "im1");
            payload.set("text", "edited");
            ctx.reset_params()
                .request::<serde_json::Value>("editMessageText", payload)
                .await?;
            Ok::<_, BoxError>(())
        });

        let bot = client.bot();
        assert!(handlers.dispatch(&bot.context(), text_update(1, 42, "hi")).await.is_none());
        assert!(!bot.is_failed());

        let sent = client.calls("sendMessage");
        assert_eq!(sent[0].form().get("chat_id").map(String::as_str), Some("42"));
        let edited = client.calls("editMessageText");
        let form = edited[0].form();
        assert_eq!(form.get("inline_message_id").map(String::as_str), Some("im1"));
        assert!(!form.contains_key("chat_id"));
    }

    #[tokio::test]
    async fn test_unhandled_update_is_dropped() {
        let client = MockClient::new();
        let count = Arc::new(AtomicUsize::new(0));
        let mut handlers = Handlers::new();
        let seen = Arc::clone(&count);
        handlers.on_edited_message(move |_: Context, _: Message| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        let reply = handlers.dispatch(&client.bot().context(), text_update(1, 1, "x")).await;
        assert!(reply.is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_latches_and_stops_dispatch() {
        let client = MockClient::new();
        let bot = client.bot();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut handlers = Handlers::new();
        handlers.on_message(move |_: Context, _: Message| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("database unavailable")
            }
        });

        assert!(handlers.dispatch(&bot.context(), text_update(1, 1, "a")).await.is_none());
        assert_eq!(bot.error().unwrap().to_string(), "database unavailable");
        handlers.dispatch(&bot.context(), text_update(2, 1, "b")).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_callback_query_gets_answer_gate() {
        let client = MockClient::new();
        let mut handlers = Handlers::new();
        handlers.on_callback_query(|ctx: QueryContext<CallbackAnswer>, query: CallbackQuery| async move {
            assert_eq!(ctx.handle().id(), query.id);
            ctx.answer(CallbackAnswer::text("done")).await?;
            ctx.answer(CallbackAnswer::text("twice")).await
        });

        let update = update(
            r#"{"update_id":3,"callback_query":{"id":"cb1","from":{"id":1,"is_bot":false,"first_name":"A"},"chat_instance":"ci","data":"x"}}"#,
        );
        let bot = client.bot();
        assert!(handlers.dispatch(&bot.context(), update).await.is_none());
        let calls = client.calls("answerCallbackQuery");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].form()["callback_query_id"], "cb1");
        assert!(!bot.is_failed());
    }

    #[test]
    fn test_into_reply() {
        assert!(matches!(().into_reply(), Ok(None)));
        let call = Call::new(SendMessage::new(5, "ok"));
        assert!(matches!(Some(call).into_reply(), Ok(Some(_))));
        let failed: Result<Call, &str> = Err("boom");
        assert_eq!(failed.into_reply().unwrap_err().to_string(), "boom");
    }
}
