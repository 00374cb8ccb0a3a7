//! Transport adapter: payload in, decoded result out.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde::de::{DeserializeOwned, Error as _};
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::error::{ApiError, Error, ResponseParameters, Result, Snapshot};
use crate::http::BodyStream;
use crate::payload::Payload;

/// Response envelope shared by every method.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

pub(crate) async fn call<T: DeserializeOwned>(
    ctx: &Context,
    method: &str,
    mut payload: Payload,
) -> Result<T> {
    payload.merge_base(ctx.params());
    let snapshot = payload.snapshot(method);
    debug!(method, path = ctx.path(), "calling method");
    trace!(method, params = %snapshot.params, files = ?snapshot.files, "request payload");

    let body = payload.into_body()?;
    let url = ctx.bot().method_url(method);
    let client = ctx.bot().client().clone();

    let raw = match ctx.guard(client.post(&url, body)).await? {
        Ok(raw) => raw,
        Err(err) => {
            warn!(method, error = %err, "request failed");
            return Err(Error::http(snapshot, err));
        }
    };

    decode(snapshot, raw)
}

/// Decodes a response envelope.
pub(crate) fn decode<T: DeserializeOwned>(snapshot: Snapshot, raw: Bytes) -> Result<T> {
    let envelope: Envelope<T> = match serde_json::from_slice(&raw) {
        Ok(envelope) => envelope,
        Err(err) => return Err(Error::json(snapshot, raw, err)),
    };

    if !envelope.ok {
        let err = ApiError {
            code: envelope.error_code.unwrap_or_default(),
            description: envelope.description.unwrap_or_default(),
            parameters: envelope.parameters,
        };
        debug!(method = %snapshot.method, code = err.code, description = %err.description, "api error");
        return Err(Error::api(snapshot, err));
    }

    match envelope.result {
        Some(result) => Ok(result),
        None => Err(Error::json(
            snapshot,
            raw,
            serde_json::Error::missing_field("result"),
        )),
    }
}

pub(crate) async fn download(ctx: &Context, file_path: &str) -> Result<BodyStream> {
    let snapshot = Snapshot {
        method: file_path.to_string(),
        ..Default::default()
    };
    debug!(path = file_path, "downloading file");

    let url = ctx.bot().file_url(file_path);
    let client = ctx.bot().client().clone();
    match ctx.guard(client.get(&url)).await? {
        Ok(stream) => Ok(stream
            .inspect_err(|err| warn!(error = %err, "download interrupted"))
            .boxed()),
        Err(err) => Err(Error::http(snapshot, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::file::InputFile;
    use crate::testing::{MockClient, MockResponse};
    use crate::types::Message;

    #[tokio::test]
    async fn test_send_text() {
        let client = MockClient::new();
        client.respond_ok(json!({"message_id": 7, "chat": {"id": 100, "type": "private"}, "text": "hi"}));
        let ctx = client.bot().context();

        let payload = Payload::new().with("chat_id", 100i64).with("text", "hi");
        let message: Message = ctx.request("sendMessage", payload).await.unwrap();
        assert_eq!(message.id, 7);

        let request = client.last().unwrap();
        assert_eq!(request.url, "https://api.telegram.org/bot123:TEST/sendMessage");
        assert_eq!(request.method(), "sendMessage");
        assert_eq!(request.content_type, "application/x-www-form-urlencoded");
        let form = request.form();
        assert_eq!(form.len(), 2);
        assert_eq!(form["chat_id"], "100");
        assert_eq!(form["text"], "hi");
    }

    #[tokio::test]
    async fn test_send_photo_upload() {
        let client = MockClient::new();
        client.respond_ok(json!({"message_id": 8, "chat": {"id": 100, "type": "private"}}));
        let ctx = client.bot().context();

        let bytes = vec![0x89, 0x50, 0x4e, 0x47];
        let mut payload = Payload::new().with("chat_id", 100i64);
        payload.set_file("photo", InputFile::bytes("cat.jpg", bytes.clone()));
        let _: Message = ctx.request("sendPhoto", payload).await.unwrap();

        let request = client.last().unwrap();
        assert!(request.content_type.starts_with("multipart/form-data; boundary="));
        let part = b"filename=\"cat.jpg\"\r\nContent-Type: application/octet-stream\r\n\r\n";
        let start = request
            .body
            .windows(part.len())
            .position(|w| w == part)
            .unwrap()
            + part.len();
        assert_eq!(&request.body[start..start + bytes.len()], &bytes[..]);
        assert!(!String::from_utf8_lossy(&request.body).contains("name=\"photo\"\r\n"));
    }

    #[tokio::test]
    async fn test_api_error_mapping() {
        let client = MockClient::new();
        client.respond_json(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests",
            "parameters": {"retry_after": 5}
        }));
        let ctx = client.bot().context();

        let err = ctx
            .request::<Message>("sendMessage", Payload::new().with("chat_id", 1i64))
            .await
            .unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.code, 429);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
        assert!(err == ApiError::new(429, "something else"));
    }

    #[tokio::test]
    async fn test_api_error_message_names_method_and_params() {
        let client = MockClient::new();
        client.respond_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }));
        let ctx = client.bot().context();

        let payload = Payload::new().with("chat_id", 100i64).with("text", "hi");
        let err = ctx.request::<Message>("sendMessage", payload).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sendMessage"), "{message}");
        assert!(message.contains("chat_id=100"), "{message}");
        assert!(message.contains("chat not found"), "{message}");
        assert!(!message.contains("TEST"));
        assert_eq!(err.as_api().map(|api| api.code), Some(400));
    }

    #[tokio::test]
    async fn test_base_params_never_overwrite_caller() {
        let client = MockClient::new();
        client.respond_ok(json!(true));
        let ctx = client
            .bot()
            .context()
            .with_param("chat_id", 5)
            .with_param("parse_mode", "HTML");

        let _: bool = ctx
            .request("sendMessage", Payload::new().with("chat_id", 6i64).with("text", "x"))
            .await
            .unwrap();
        let form = client.last().unwrap().form();
        assert_eq!(form["chat_id"], "6");
        assert_eq!(form["parse_mode"], "HTML");
    }

    #[tokio::test]
    async fn test_decode_and_transport_errors_carry_snapshot() {
        let client = MockClient::new();
        client.push(MockResponse::Raw(Bytes::from_static(b"<html>bad gateway</html>")));
        client.push(MockResponse::Fail("connection reset".into()));
        client.respond_json(json!({"ok": true}));
        let ctx = client.bot().context();

        let err = ctx.request::<bool>("getMe", Payload::new()).await.unwrap_err();
        let Error::Json(json_err) = &err else {
            panic!("expected decode error, got {err:?}");
        };
        assert_eq!(&json_err.raw[..], b"<html>bad gateway</html>");
        assert_eq!(json_err.snapshot.method, "getMe");

        let err = ctx
            .request::<bool>("sendMessage", Payload::new().with("text", "x"))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::Http(e) if e.snapshot.params == "text=x"));
        assert!(!err.to_string().contains("TEST"));

        let err = ctx.request::<bool>("getMe", Payload::new()).await.unwrap_err();
        assert!(err.to_string().contains("missing field `result`"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_distinct_from_transport_failure() {
        let client = MockClient::new();
        client.push(MockResponse::Hang);
        client.push(MockResponse::Hang);
        let ctx = client.bot().context();

        let timed = ctx.with_timeout(Duration::from_secs(1));
        let err = timed.request::<bool>("getUpdates", Payload::new()).await.unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));

        let child = ctx.child();
        let canceller = child.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let err = child.request::<bool>("getUpdates", Payload::new()).await.unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }

    #[tokio::test]
    async fn test_download_streams_file() {
        let client = MockClient::new();
        client.add_file("photos/file_1.jpg", &b"jpegdata"[..]);
        let ctx = client.bot().context();

        let mut stream = ctx.download("photos/file_1.jpg").await.unwrap();
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(data, b"jpegdata");

        let err = ctx.download("missing.jpg").await.err().unwrap();
        assert!(matches!(err, Error::Http(_)));
    }
}
