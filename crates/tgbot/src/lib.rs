//! # tgbot
//!
//! A Telegram Bot API client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   updates   ┌──────────┐   per kind   ┌───────────────────────┐
//! │ LongPoller / │────────────▶│ Handlers │─────────────▶│ handler / Router      │
//! │ Webhook      │             └──────────┘              │ (+ QueryHandle gate)  │
//! └──────────────┘                                       └───────────┬───────────┘
//!                                                                    │ requests
//!        ┌─────────┐    ┌─────────┐    ┌───────────┐    ┌────────────▼──────────┐
//!        │ Bot API │◀───│ HTTP    │◀───│ transport │◀───│ Context + Payload     │
//!        └─────────┘    │ client  │    │ adapter   │    └───────────────────────┘
//!                       └─────────┘    └───────────┘
//! ```
//!
//! - **core** (`tgbot-core`): payloads, uploads, the context tree, the
//!   transport adapter and the type catalogue
//! - **framework** (`tgbot-framework`): handler table, routers, query
//!   answers, long polling and the webhook protocol
//! - **transport** (`tgbot-transport`): `reqwest` client and `axum` listener
//! - **runtime** (`tgbot-runtime`): configuration, logging and the run loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tgbot::prelude::*;
//!
//! async fn echo(_ctx: Context, msg: Message) -> Option<Call> {
//!     let text = msg.text?;
//!     Some(Call::new(SendMessage::new(msg.chat.id, text)))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = BotRuntime::new()?;
//!     runtime.handlers().on_message(echo);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Request records defined outside `tgbot-core` must point the derive at the
//! re-export: `#[derive(Params)] #[tg(crate = "tgbot::core")]`.
//!
//! ## Features
//!
//! - `toml-config` (default), `yaml-config`: config file formats
//! - `http-client` (default): the `reqwest` client
//! - `webhook`: webhook mode and its `axum` listener
//! - `json-log`: JSON log lines
//! - `testing`: `core::testing::MockClient`

pub use tgbot_core as core;
pub use tgbot_framework as framework;
pub use tgbot_runtime as runtime;
pub use tgbot_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tgbot::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use tgbot_runtime::{BotRuntime, TgbotConfig};

    // Requests
    pub use tgbot_core::api::{
        CallbackAnswer, DeleteMessage, EditMessageText, GetMe, InlineAnswer, SendDocument,
        SendMediaGroup, SendMessage, SendPhoto, SendPoll,
    };
    pub use tgbot_core::{Bot, Context, Error, InputFile, Method, Params, Payload, Result};

    // Updates
    pub use tgbot_core::types::{
        CallbackQuery, ChatId, InlineQuery, Message, ParseMode, PollAnswer, Update, UpdateKind,
    };

    // Dispatch
    pub use tgbot_framework::{
        Call, CallbackContext, CallbackReply, CallbackRouter, Handlers, LongPoller, MessageKey,
        PollRouter, QueryContext, Route, Router, Webhook,
    };
}
