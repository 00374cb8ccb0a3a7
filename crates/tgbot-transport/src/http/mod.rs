//! HTTP transports.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{DEFAULT_TIMEOUT, ReqwestClient};

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::WebhookServer;
