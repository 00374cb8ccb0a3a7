//! # tgbot Core
//!
//! The request pipeline of the tgbot Telegram Bot API client.
//!
//! This crate provides the pieces every bot is built from: the [`Bot`]
//! handle, the hierarchical [`Context`] requests run under, the parameter
//! [`Payload`] with its form and multipart encoders, typed [`api`] methods
//! and the [`types`] catalogue of Bot API objects.
//!
//! ## Request Flow
//!
//! ```text
//! ┌──────────────┐   write_params   ┌─────────┐   into_body   ┌────────────┐
//! │ SendMessage  │─────────────────▶│ Payload │──────────────▶│ HttpClient │
//! │ (Params)     │                  └─────────┘  form / mp    └─────┬──────┘
//! └──────────────┘                                                  │
//!        ▲                     decode envelope                      │
//!        └─────────────── Context::execute ◀────────────────────────┘
//! ```
//!
//! A request inherits the cancellation, deadline and base parameters of the
//! context it runs under. Uploads are streamed as `multipart/form-data`;
//! everything else goes out URL-encoded.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tgbot_core::api::SendMessage;
//! use tgbot_core::{Bot, ParseMode};
//!
//! let bot = Bot::new(token, client);
//! let ctx = bot.context().with_timeout(Duration::from_secs(10));
//! let sent = ctx
//!     .execute(SendMessage::new(chat_id, "<b>hi</b>").parse_mode(ParseMode::Html))
//!     .await?;
//! ```
//!
//! ## Features
//!
//! - `testing`: exposes [`testing::MockClient`], a recording `HttpClient`

extern crate self as tgbot_core;

pub mod api;
pub mod bot;
pub mod context;
pub mod error;
pub mod file;
pub mod http;
mod multipart;
pub mod payload;
mod transport;
pub mod types;
pub mod variant;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::Method;
pub use bot::{Bot, BotBuilder, DEFAULT_API_BASE, DEFAULT_FILE_BASE, SharedError};
pub use context::{Context, PATH_SEPARATOR};
pub use error::{ApiError, ApiFailure, BoxError, Error, HttpError, JsonError, ResponseParameters, Result, Snapshot};
pub use file::{InputFile, Upload};
pub use http::{BodyStream, HttpClient};
pub use payload::{Body, FORM_URLENCODED, InputObject, IntoParams, ParamValue, Payload, RequestBody};
pub use types::{ChatId, ParseMode, Update, UpdateKind};

pub use tgbot_macros::Params;

#[doc(hidden)]
pub use serde as __serde;
#[doc(hidden)]
pub use serde_json as __serde_json;
