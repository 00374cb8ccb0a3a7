//! # tgbot framework
//!
//! Update dispatch on top of `tgbot-core`.
//!
//! This layer provides:
//! - [`Handlers`], one optional handler per update kind
//! - [`Router`], keyed dispatch with one-shot and expiring routes, and its
//!   callback-query and poll-answer specialisations
//! - [`QueryHandle`], which answers a query at most once
//! - [`LongPoller`] and [`Webhook`], the two ways updates arrive
//!
//! Nothing here opens sockets: the webhook protocol is framework-neutral and
//! bound to a server by `tgbot-transport`.

pub mod callback;
pub mod context;
pub mod error;
pub mod handler;
pub mod poller;
pub mod router;
pub mod secret;
pub mod webhook;

pub use callback::{CallbackContext, CallbackReply, CallbackRouter, MessageKey, PollRouter};
pub use context::{QueryAnswer, QueryContext, QueryHandle, RouteContext};
pub use error::{PollError, PollResult};
pub use handler::{BoxedHandler, Call, Handler, Handlers, IntoReply, Reply, UpdatePayload};
pub use poller::{Backoff, LongPoller};
pub use router::{ExpireFn, Route, RouteFn, Router};
pub use secret::{generate_secret, generate_secret_with};
pub use webhook::{SECRET_HEADER, Webhook, WebhookResponse};
