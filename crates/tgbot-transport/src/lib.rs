//! # tgbot transport
//!
//! Network implementations for the tgbot client. The core only talks to the
//! [`HttpClient`](tgbot_core::HttpClient) trait; this crate provides the
//! concrete pieces behind feature flags.
//!
//! ## Features
//!
//! - `http-client` (default): [`ReqwestClient`], the outbound Bot API client
//! - `http-server`: [`WebhookServer`], an `axum` listener for webhook mode
//! - `full`: both
//!
//! ```rust,ignore
//! use tgbot_core::Bot;
//! use tgbot_transport::ReqwestClient;
//!
//! let bot = Bot::new(token, ReqwestClient::new()?);
//! ```

pub mod error;

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

pub use error::{TransportError, TransportResult};

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_TIMEOUT, ReqwestClient};

#[cfg(feature = "http-server")]
pub use http::WebhookServer;
