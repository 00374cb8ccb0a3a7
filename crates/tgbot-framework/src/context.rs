//! Handler contexts and the query-answer gate.
//!
//! Handlers receive the core [`Context`] for most update kinds. Queries that
//! expect an answer (callbacks, inline queries, shipping and pre-checkout
//! queries) get a [`QueryContext`] instead, which pairs the context with a
//! [`QueryHandle`]:
//!
//! ```rust,ignore
//! handlers.on_callback_query(|ctx: QueryContext<CallbackAnswer>, query: CallbackQuery| async move {
//!     ctx.answer(CallbackAnswer::text("Saved")).await?;
//!     // a second answer is a no-op
//!     ctx.answer(CallbackAnswer::text("ignored")).await
//! });
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use tgbot_core::api::{
    AnswerCallbackQuery, AnswerInlineQuery, AnswerPreCheckoutQuery, AnswerShippingQuery,
    AnswerWebAppQuery, CallbackAnswer, InlineAnswer, PreCheckoutAnswer, ShippingAnswer,
    WebAppAnswer,
};
use tgbot_core::{Context, Method, Result};

// ============================================================================
// RouteContext
// ============================================================================

/// A context handlers and routers can be invoked with.
pub trait RouteContext: Clone + Send + Sync + 'static {
    /// The underlying request context.
    fn context(&self) -> &Context;

    /// The same context with `name` appended to its display path.
    fn named(&self, name: &str) -> Self;
}

impl RouteContext for Context {
    fn context(&self) -> &Context {
        self
    }

    fn named(&self, name: &str) -> Self {
        Context::named(self, name)
    }
}

// ============================================================================
// Query answers
// ============================================================================

/// An answer body, paired with the method that delivers it.
pub trait QueryAnswer: Send + 'static {
    /// The `answer*Query` method.
    type Method: Method;

    /// Builds the method record for the query `query_id`.
    fn into_method(self, query_id: String) -> Self::Method;
}

macro_rules! impl_query_answer {
    ($($answer:ty => $method:ident { $id:ident }),* $(,)?) => {
        $(
            impl QueryAnswer for $answer {
                type Method = $method;

                fn into_method(self, query_id: String) -> $method {
                    $method {
                        $id: query_id,
                        answer: self,
                    }
                }
            }
        )*
    };
}

impl_query_answer! {
    CallbackAnswer => AnswerCallbackQuery { callback_query_id },
    InlineAnswer => AnswerInlineQuery { inline_query_id },
    ShippingAnswer => AnswerShippingQuery { shipping_query_id },
    PreCheckoutAnswer => AnswerPreCheckoutQuery { pre_checkout_query_id },
    WebAppAnswer => AnswerWebAppQuery { web_app_query_id },
}

/// A query that can be answered at most once.
///
/// Clones share the latch. A handle built separately for the same query id
/// has its own latch; answering through both is a programmer error.
pub struct QueryHandle<A> {
    id: Arc<str>,
    answered: Arc<AtomicBool>,
    ctx: Context,
    _answer: PhantomData<fn(A)>,
}

impl<A: QueryAnswer> QueryHandle<A> {
    pub fn new(ctx: Context, query_id: impl Into<Arc<str>>) -> Self {
        Self {
            id: query_id.into(),
            answered: Arc::new(AtomicBool::new(false)),
            ctx,
            _answer: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` once an answer has been attempted.
    pub fn is_answered(&self) -> bool {
        self.answered.load(Ordering::Acquire)
    }

    /// Answers the query.
    ///
    /// Only the first call sends anything; later calls return `Ok(())`.
    /// A failed first attempt still trips the latch.
    pub async fn answer(&self, answer: A) -> Result<()> {
        if self
            .answered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(query_id = %self.id, "query already answered");
            return Ok(());
        }
        let method = answer.into_method(self.id.to_string());
        self.ctx.execute(method).await?;
        Ok(())
    }
}

impl<A> Clone for QueryHandle<A> {
    fn clone(&self) -> Self {
        Self {
            id: Arc::clone(&self.id),
            answered: Arc::clone(&self.answered),
            ctx: self.ctx.clone(),
            _answer: PhantomData,
        }
    }
}

impl<A> fmt::Debug for QueryHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandle")
            .field("id", &self.id)
            .field("answered", &self.answered.load(Ordering::Relaxed))
            .finish()
    }
}

// ============================================================================
// QueryContext
// ============================================================================

/// Context for query updates: a [`Context`] plus the query's answer gate.
///
/// Dereferences to [`Context`], so requests can be made on it directly.
pub struct QueryContext<A> {
    ctx: Context,
    handle: QueryHandle<A>,
}

impl<A: QueryAnswer> QueryContext<A> {
    pub fn new(ctx: Context, query_id: impl Into<Arc<str>>) -> Self {
        let handle = QueryHandle::new(ctx.clone(), query_id);
        Self { ctx, handle }
    }

    pub fn handle(&self) -> &QueryHandle<A> {
        &self.handle
    }

    /// Shorthand for [`QueryHandle::answer`].
    pub async fn answer(&self, answer: A) -> Result<()> {
        self.handle.answer(answer).await
    }
}

impl<A> Clone for QueryContext<A> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<A> Deref for QueryContext<A> {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}

impl<A> fmt::Debug for QueryContext<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("ctx", &self.ctx)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<A: QueryAnswer> RouteContext for QueryContext<A> {
    fn context(&self) -> &Context {
        &self.ctx
    }

    fn named(&self, name: &str) -> Self {
        Self {
            ctx: self.ctx.named(name),
            handle: self.handle.clone(),
        }
    }
}
