//! Test doubles.
//!
//! [`MockClient`] is an [`HttpClient`] that records every request and
//! answers from a script, so request encoding and response handling can be
//! asserted without a network.
//!
//! ```rust,ignore
//! let client = MockClient::new();
//! client.respond_ok(serde_json::json!(true));
//! let ctx = client.bot().context();
//! ctx.request::<bool>("deleteMessage", payload).await?;
//! assert_eq!(client.last().unwrap().method(), "deleteMessage");
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::bot::Bot;
use crate::error::BoxError;
use crate::http::{BodyStream, HttpClient};
use crate::payload::RequestBody;

/// Token used by [`MockClient::bot`].
pub const TEST_TOKEN: &str = "123:TEST";

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Body bytes returned as-is.
    Raw(Bytes),
    /// A transport failure with this message.
    Fail(String),
    /// Never completes; used to exercise cancellation.
    Hang,
}

/// A request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub content_type: String,
    pub body: Bytes,
}

impl RecordedRequest {
    /// Last path segment of the URL (the method name).
    pub fn method(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or_default()
    }

    /// Decodes a form-urlencoded body.
    pub fn form(&self) -> BTreeMap<String, String> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    /// Returns `true` for multipart bodies.
    pub fn is_multipart(&self) -> bool {
        self.content_type.starts_with("multipart/form-data")
    }
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync>;

#[derive(Default)]
struct MockState {
    script: VecDeque<MockResponse>,
    responder: Option<Responder>,
    requests: Vec<RecordedRequest>,
    files: HashMap<String, Bytes>,
}

/// Recording [`HttpClient`].
///
/// Answers come from the scripted queue first, then from the responder set
/// with [`respond_with`](MockClient::respond_with), and finally default to
/// `{"ok":true,"result":true}`.
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bot using this client and [`TEST_TOKEN`].
    pub fn bot(&self) -> Bot {
        Bot::new(TEST_TOKEN, self.clone())
    }

    /// Queues a scripted answer.
    pub fn push(&self, response: MockResponse) {
        self.state.lock().script.push_back(response);
    }

    /// Queues a raw JSON body.
    pub fn respond_json(&self, body: Value) {
        self.push(MockResponse::Raw(Bytes::from(body.to_string())));
    }

    /// Queues a successful envelope around `result`.
    pub fn respond_ok(&self, result: Value) {
        self.respond_json(json!({"ok": true, "result": result}));
    }

    /// Queues an error envelope.
    pub fn respond_error(&self, code: i64, description: &str) {
        self.respond_json(json!({"ok": false, "error_code": code, "description": description}));
    }

    /// Answers every unscripted request through `responder`.
    pub fn respond_with(
        &self,
        responder: impl Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    ) {
        self.state.lock().responder = Some(Arc::new(responder));
    }

    /// Serves `data` for downloads of `path`.
    pub fn add_file(&self, path: &str, data: impl Into<Bytes>) {
        self.state.lock().files.insert(path.to_string(), data.into());
    }

    /// Every request so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests whose method is `method`.
    pub fn calls(&self, method: &str) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method() == method)
            .cloned()
            .collect()
    }

    /// The most recent request.
    pub fn last(&self) -> Option<RecordedRequest> {
        self.state.lock().requests.last().cloned()
    }

    fn next_response(&self, request: &RecordedRequest) -> MockResponse {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        if let Some(response) = state.script.pop_front() {
            return response;
        }
        let responder = state.responder.clone();
        drop(state);
        match responder {
            Some(responder) => responder(request),
            None => MockResponse::Raw(Bytes::from_static(br#"{"ok":true,"result":true}"#)),
        }
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn post(&self, url: &str, body: RequestBody) -> Result<Bytes, BoxError> {
        let request = RecordedRequest {
            url: url.to_string(),
            content_type: body.content_type,
            body: body.body.into_bytes().await?,
        };

        match self.next_response(&request) {
            MockResponse::Raw(bytes) => Ok(bytes),
            MockResponse::Fail(message) => Err(message.into()),
            MockResponse::Hang => std::future::pending().await,
        }
    }

    async fn get(&self, url: &str) -> Result<BodyStream, BoxError> {
        let path = url.split_once(TEST_TOKEN).map(|(_, rest)| rest.trim_start_matches('/'));
        let data = path.and_then(|path| self.state.lock().files.get(path).cloned());
        match data {
            Some(data) => Ok(futures::stream::iter([Ok::<_, BoxError>(data)]).boxed()),
            None => Err(format!("404 Not Found: {url}").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;

    #[tokio::test]
    async fn test_script_then_responder_then_default() {
        let client = MockClient::new();
        let ctx = client.bot().context();

        assert!(ctx.request::<bool>("getMe", Payload::new()).await.unwrap());

        client.respond_with(|request| {
            MockResponse::Raw(Bytes::from(json!({"ok": true, "result": request.method()}).to_string()))
        });
        client.respond_ok(json!("scripted"));
        let first: String = ctx.request("getMe", Payload::new()).await.unwrap();
        let second: String = ctx.request("getChat", Payload::new()).await.unwrap();
        assert_eq!(first, "scripted");
        assert_eq!(second, "getChat");

        let methods: Vec<_> = client.requests().iter().map(|r| r.method().to_string()).collect();
        assert_eq!(methods, ["getMe", "getMe", "getChat"]);
        assert_eq!(client.calls("getMe").len(), 2);
    }
}
