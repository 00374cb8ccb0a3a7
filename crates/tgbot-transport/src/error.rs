//! Transport error types.

use thiserror::Error;

/// Errors raised while setting up or running a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be built.
    #[cfg(feature = "http-client")]
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
