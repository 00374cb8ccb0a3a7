//! The HTTP collaborator seam.
//!
//! The core never opens sockets itself. Every request goes through an
//! [`HttpClient`] injected into the [`Bot`](crate::Bot); `tgbot-transport`
//! ships a `reqwest` implementation and [`testing::MockClient`] a recording
//! one.
//!
//! [`testing::MockClient`]: crate::testing::MockClient

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::BoxError;
use crate::payload::RequestBody;

/// A streamed response body.
pub type BodyStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Minimal HTTP client used by the transport adapter.
///
/// Implementations must be safe for concurrent use; one client serves every
/// request of a bot.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Sends `body` to `url` and returns the full response body.
    ///
    /// The body is returned whatever the status code: the API reports its
    /// errors inside the JSON envelope.
    async fn post(&self, url: &str, body: RequestBody) -> Result<Bytes, BoxError>;

    /// Fetches `url` and returns the response body as a stream.
    ///
    /// Non-success statuses are errors here, since file downloads carry no
    /// envelope.
    async fn get(&self, url: &str) -> Result<BodyStream, BoxError>;
}
