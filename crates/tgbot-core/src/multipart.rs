//! Streaming `multipart/form-data` encoder.
//!
//! A producer task writes the parts into a bounded channel while the HTTP
//! client consumes the other end, so uploads are never buffered whole. Each
//! upload reader is dropped as soon as it has been copied.

use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::file::InputFile;
use crate::payload::{Body, RequestBody};

/// Chunk size used when copying upload readers.
const CHUNK_SIZE: usize = 16 * 1024;

/// Number of chunks buffered between the producer and the consumer.
const PIPE_CAPACITY: usize = 8;

type Sender = mpsc::Sender<io::Result<Bytes>>;

/// Starts streaming `params` and `files` as a multipart body.
pub(crate) fn encode(params: BTreeMap<String, String>, files: BTreeMap<String, InputFile>) -> RequestBody {
    let boundary = Uuid::new_v4().simple().to_string();
    let content_type = format!("multipart/form-data; boundary={boundary}");

    let (tx, rx) = mpsc::channel(PIPE_CAPACITY);
    tokio::spawn(produce(boundary, params, files, tx));

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    RequestBody {
        content_type,
        body: Body::Stream(stream.boxed()),
    }
}

async fn produce(
    boundary: String,
    params: BTreeMap<String, String>,
    files: BTreeMap<String, InputFile>,
    tx: Sender,
) {
    match write_parts(&boundary, params, files, &tx).await {
        Ok(()) => {}
        Err(PipeError::Closed) => trace!("multipart consumer went away"),
        Err(PipeError::Read(err)) => {
            warn!(error = %err, "upload read failed");
            let _ = tx.send(Err(err)).await;
        }
    }
}

enum PipeError {
    Closed,
    Read(io::Error),
}

async fn send(tx: &Sender, chunk: impl Into<Bytes>) -> Result<(), PipeError> {
    tx.send(Ok(chunk.into())).await.map_err(|_| PipeError::Closed)
}

async fn write_parts(
    boundary: &str,
    params: BTreeMap<String, String>,
    files: BTreeMap<String, InputFile>,
    tx: &Sender,
) -> Result<(), PipeError> {
    for (name, value) in params {
        send(tx, field_part(boundary, &name, &value)).await?;
    }

    for (name, file) in files {
        match file {
            InputFile::Upload(upload) => {
                send(tx, file_header(boundary, &name, &upload.name)).await?;
                let mut chunks = ReaderStream::with_capacity(upload.reader, CHUNK_SIZE);
                while let Some(chunk) = chunks.next().await {
                    send(tx, chunk.map_err(PipeError::Read)?).await?;
                }
                drop(chunks);
                send(tx, "\r\n").await?;
            }
            other => {
                if let Some(text) = other.as_text() {
                    send(tx, field_part(boundary, &name, &text)).await?;
                }
            }
        }
    }

    send(tx, format!("--{boundary}--\r\n")).await
}

fn field_part(boundary: &str, name: &str, value: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{value}\r\n",
        escape(name)
    )
}

fn file_header(boundary: &str, name: &str, filename: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        escape(name),
        escape(filename)
    )
}

/// Escapes a quoted header parameter.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' | '\n' => {}
            ch => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, ReadBuf};

    use super::*;
    use crate::payload::Payload;

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("disk on fire")))
        }
    }

    fn boundary_of(content_type: &str) -> String {
        content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_upload_becomes_file_part() {
        let data = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
        let mut payload = Payload::new().with("chat_id", 100i64);
        payload.set_file("photo", InputFile::bytes("cat.jpg", data.clone()));

        let body = payload.into_body().unwrap();
        assert!(body.content_type.starts_with("multipart/form-data; boundary="));
        let boundary = boundary_of(&body.content_type);
        let bytes = body.body.into_bytes().await.unwrap();

        let header = "Content-Disposition: form-data; name=\"photo\"; filename=\"cat.jpg\"\r\n\
                      Content-Type: application/octet-stream\r\n\r\n";
        let text = String::from_utf8_lossy(&bytes);
        let start = bytes
            .windows(header.len())
            .position(|w| w == header.as_bytes())
            .unwrap()
            + header.len();
        assert_eq!(&bytes[start..start + data.len()], &data[..]);
        assert!(!text.contains("name=\"photo\"\r\n"));
        assert!(text.contains("name=\"chat_id\"\r\n\r\n100\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[tokio::test]
    async fn test_one_part_per_param_and_upload() {
        let mut payload = Payload::new().with("chat_id", 1i64).with("caption", "hi");
        payload.set_file("document", InputFile::bytes("a.txt", "aaa"));
        payload.set_file("thumbnail", InputFile::id("AgAD"));
        let media = payload.attach(InputFile::bytes("b.txt", "bbb"));
        payload.set_json("extra", &media);

        let body = payload.into_body().unwrap();
        let boundary = boundary_of(&body.content_type);
        let bytes = body.body.into_bytes().await.unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert_eq!(text.matches(&format!("--{boundary}\r\n")).count(), 6);
        assert_eq!(text.matches("filename=").count(), 2);
        assert!(text.contains("name=\"thumbnail\"\r\n\r\nAgAD\r\n"));
        assert!(text.contains("name=\"extra\"\r\n\r\n\"attach://attach-0\"\r\n"));
        assert!(text.contains("name=\"attach-0\"; filename=\"b.txt\""));
    }

    #[tokio::test]
    async fn test_read_error_reaches_consumer() {
        let mut payload = Payload::new();
        payload.set_file("document", InputFile::reader("broken.bin", FailingReader));
        let body = payload.into_body().unwrap();
        let err = body.body.into_bytes().await.unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a\"b\\c\r\nd"), "a\\\"b\\\\cd");
    }
}
