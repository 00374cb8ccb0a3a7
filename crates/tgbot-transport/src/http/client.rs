//! `reqwest`-backed [`HttpClient`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use tracing::trace;

use tgbot_core::{Body, BodyStream, BoxError, HttpClient, RequestBody};

use crate::error::TransportResult;

/// Default timeout for buffered requests. Long polls must finish inside it,
/// so it sits well above the usual 30 second poll timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client used by the bot to reach the Bot API.
///
/// The request timeout only applies to buffered bodies. Streamed uploads may
/// take as long as the calling context allows; its deadline and
/// cancellation bound them instead.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestClient {
    /// Creates a client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> TransportResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom timeout for buffered requests.
    pub fn with_timeout(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            timeout: Some(timeout),
        })
    }

    /// Wraps an already configured client. No per-request timeout is added.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(&self, url: &str, body: RequestBody) -> Result<Bytes, BoxError> {
        let RequestBody { content_type, body } = body;
        let mut request = self.client.post(url).header(CONTENT_TYPE, content_type);
        request = match body {
            Body::Full(bytes) => {
                let request = request.body(bytes);
                match self.timeout {
                    Some(timeout) => request.timeout(timeout),
                    None => request,
                }
            }
            Body::Stream(stream) => request.body(reqwest::Body::wrap_stream(stream)),
        };
        let response = request.send().await?;
        trace!(status = response.status().as_u16(), "response received");
        Ok(response.bytes().await?)
    }

    async fn get(&self, url: &str) -> Result<BodyStream, BoxError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response
            .bytes_stream()
            .map_err(|err| Box::new(err) as BoxError)
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use futures::stream;

    use super::*;

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/echo",
                post(|headers: HeaderMap, body: Bytes| async move {
                    let content_type = headers[CONTENT_TYPE].to_str().unwrap_or_default().to_string();
                    format!("{content_type}|{}", String::from_utf8_lossy(&body))
                }),
            )
            .route("/file", get(|| async { "file-bytes" }))
            .route(
                "/slow",
                post(|body: Bytes| async move {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    body
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_post_full_and_streamed_bodies() {
        let base = spawn_server().await;
        let client = ReqwestClient::new().unwrap();

        let full = RequestBody {
            content_type: "application/x-www-form-urlencoded".into(),
            body: Body::Full(Bytes::from_static(b"a=1")),
        };
        let echoed = client.post(&format!("{base}/echo"), full).await.unwrap();
        assert_eq!(&echoed[..], b"application/x-www-form-urlencoded|a=1");

        let chunks = vec![Ok(Bytes::from_static(b"part-")), Ok(Bytes::from_static(b"two"))];
        let streamed = RequestBody {
            content_type: "multipart/form-data; boundary=x".into(),
            body: Body::Stream(stream::iter(chunks).boxed()),
        };
        let echoed = client.post(&format!("{base}/echo"), streamed).await.unwrap();
        assert_eq!(&echoed[..], b"multipart/form-data; boundary=x|part-two");
    }

    #[tokio::test]
    async fn test_timeout_spares_streamed_uploads() {
        let base = spawn_server().await;
        let client = ReqwestClient::with_timeout(Duration::from_millis(100)).unwrap();

        let full = RequestBody {
            content_type: "application/x-www-form-urlencoded".into(),
            body: Body::Full(Bytes::from_static(b"a=1")),
        };
        let err = client.post(&format!("{base}/slow"), full).await.unwrap_err();
        let err = err.downcast::<reqwest::Error>().unwrap();
        assert!(err.is_timeout());

        let chunks = vec![Ok(Bytes::from_static(b"big-upload"))];
        let streamed = RequestBody {
            content_type: "multipart/form-data; boundary=x".into(),
            body: Body::Stream(stream::iter(chunks).boxed()),
        };
        let echoed = client.post(&format!("{base}/slow"), streamed).await.unwrap();
        assert_eq!(&echoed[..], b"big-upload");
    }

    #[tokio::test]
    async fn test_get_streams_and_rejects_errors() {
        let base = spawn_server().await;
        let client = ReqwestClient::new().unwrap();

        let chunks: Vec<_> = client
            .get(&format!("{base}/file"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"file-bytes");

        assert!(client.get(&format!("{base}/missing")).await.is_err());
    }
}
