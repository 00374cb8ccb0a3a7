//! Runtime error types.

use thiserror::Error;

use tgbot_core::SharedError;
use tgbot_framework::PollError;
use tgbot_transport::TransportError;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that end a bot run.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A startup call such as `setWebhook` failed.
    #[error(transparent)]
    Request(#[from] tgbot_core::Error),

    #[error(transparent)]
    Poll(#[from] PollError),

    /// A handler failed while serving the webhook.
    #[error("handler failed: {0}")]
    Handler(SharedError),

    /// No random source for the webhook secret.
    #[error("failed to generate webhook secret: {0}")]
    Secret(String),

    /// The certificate named in the webhook settings could not be read.
    #[error("failed to open certificate {path}: {source}")]
    Certificate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The runtime was built without the transport a mode needs.
    #[error("{0} support is not compiled in")]
    Unsupported(&'static str),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
