//! Error types for the dispatch layer.

use thiserror::Error;

use tgbot_core::SharedError;

/// Why a long-poll driver stopped.
#[derive(Debug, Error)]
pub enum PollError {
    /// A request failed in a way retrying cannot fix (bad token, webhook
    /// still registered, ...).
    #[error(transparent)]
    Request(#[from] tgbot_core::Error),

    /// A handler latched an error on the bot.
    #[error("handler failed: {0}")]
    Handler(SharedError),
}

impl PollError {
    /// The latched handler error, if that is what stopped the poller.
    pub fn handler_error(&self) -> Option<&SharedError> {
        match self {
            Self::Handler(err) => Some(err),
            Self::Request(_) => None,
        }
    }
}

/// Result type for long-poll drivers.
pub type PollResult<T = ()> = Result<T, PollError>;
