//! Upload descriptors.
//!
//! An [`InputFile`] names the content of a file parameter. Only the
//! [`InputFile::Upload`] form carries bytes; the other forms are references
//! the server resolves itself.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use serde::{Serialize, Serializer};
use tokio::io::AsyncRead;

/// A local stream to be sent as a multipart file part.
///
/// The reader is consumed by value, so it can be read at most once. It is
/// dropped (and thereby closed) as soon as its bytes have been copied into the
/// request body.
pub struct Upload {
    /// File name reported in the part's `Content-Disposition`.
    pub name: String,
    /// Content source.
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Content of a file parameter.
#[derive(Debug)]
pub enum InputFile {
    /// A `file_id` of a file already stored on the servers.
    Id(String),
    /// An HTTP URL the server downloads the file from.
    Url(String),
    /// A local stream uploaded with the request.
    Upload(Upload),
    /// A stream already registered in the payload under this label.
    ///
    /// Serialized as `attach://<label>`.
    Attach(String),
}

impl InputFile {
    /// References a stored file by id.
    pub fn id(file_id: impl Into<String>) -> Self {
        Self::Id(file_id.into())
    }

    /// References a remote file by URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Uploads the content of `reader` under `name`.
    pub fn reader(name: impl Into<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Upload(Upload {
            name: name.into(),
            reader: Box::new(reader),
        })
    }

    /// Uploads in-memory bytes under `name`.
    pub fn bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::reader(name, Cursor::new(data.into()))
    }

    /// Opens a local file for upload, named after its last path component.
    pub async fn path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self::reader(name, file))
    }

    /// Returns `true` for the local-stream form.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload(_))
    }

    /// The text sent in place of this file in a form field, if any.
    ///
    /// `None` for [`InputFile::Upload`], which needs a multipart part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(id.clone()),
            Self::Url(url) => Some(url.clone()),
            Self::Attach(label) => Some(format!("attach://{label}")),
            Self::Upload(_) => None,
        }
    }

    /// One-line description used in request snapshots.
    pub fn describe(&self) -> String {
        match self {
            Self::Id(id) => format!("file_id {id}"),
            Self::Url(url) => format!("url {url}"),
            Self::Upload(upload) => upload.name.clone(),
            Self::Attach(label) => format!("attach://{label}"),
        }
    }
}

impl From<Upload> for InputFile {
    fn from(upload: Upload) -> Self {
        Self::Upload(upload)
    }
}

/// Serializes reference forms as their text.
///
/// A raw [`InputFile::Upload`] cannot appear inside JSON; it must first be
/// registered through [`Payload::attach`](crate::Payload::attach), which
/// [`Payload::set_input`](crate::Payload::set_input) does automatically.
impl Serialize for InputFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_text() {
            Some(text) => serializer.serialize_str(&text),
            None => Err(serde::ser::Error::custom(
                "local upload must be attached to the payload before serialization",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_forms_serialize_as_text() {
        assert_eq!(serde_json::to_string(&InputFile::id("AgAD")).unwrap(), "\"AgAD\"");
        assert_eq!(
            serde_json::to_string(&InputFile::url("https://example.com/a.png")).unwrap(),
            "\"https://example.com/a.png\""
        );
        assert_eq!(
            serde_json::to_string(&InputFile::Attach("attach-0".into())).unwrap(),
            "\"attach://attach-0\""
        );
    }

    #[test]
    fn test_raw_upload_refuses_json() {
        let file = InputFile::bytes("cat.jpg", vec![0x89, 0x50]);
        assert!(file.is_upload());
        assert!(file.as_text().is_none());
        assert!(serde_json::to_string(&file).is_err());
        assert_eq!(file.describe(), "cat.jpg");
    }
}
