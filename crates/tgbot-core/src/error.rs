//! Unified error types for the request pipeline.
//!
//! Every call made through a [`Context`](crate::Context) fails with one
//! [`Error`]. The variants mirror where the failure originated:
//!
//! | Variant | Origin |
//! |---------|--------|
//! | [`Error::Canceled`], [`Error::DeadlineExceeded`] | the calling context |
//! | [`Error::Http`] | the HTTP collaborator (DNS, connect, TLS, read, bad URL) |
//! | [`Error::Json`] | the response body was not a valid envelope |
//! | [`Error::Api`] | the envelope carried `ok: false` |
//! | [`Error::Encode`] | a structured parameter could not be serialized |

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error used at collaborator seams (HTTP client, user handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for API calls.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// =============================================================================
// Request snapshot
// =============================================================================

/// Diagnostic view of a request, captured before its body is streamed.
///
/// Rendered as the method name, the URL-encoded parameters and one upload
/// descriptor per line, which makes a failing call readable straight from
/// the logs. The bot token is never part of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Method name (or file path for downloads).
    pub method: String,
    /// URL-encoded textual parameters.
    pub params: String,
    /// One `field: descriptor` line per upload.
    pub files: Vec<String>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method, self.params)?;
        for file in &self.files {
            write!(f, "\n  {file}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Error kinds
// =============================================================================

/// The HTTP collaborator failed before a response body was read.
#[derive(Debug, Error)]
#[error("{snapshot}: {source}")]
pub struct HttpError {
    /// The request that failed.
    pub snapshot: Snapshot,
    /// Underlying transport error.
    pub source: BoxError,
}

/// The response body could not be decoded.
#[derive(Debug, Error)]
#[error("{snapshot}: malformed response: {source}")]
pub struct JsonError {
    /// The request that produced the response.
    pub snapshot: Snapshot,
    /// Raw response bytes.
    pub raw: Bytes,
    /// Decoder error.
    pub source: serde_json::Error,
}

/// Extra information attached to some API errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    /// The group has been migrated to a supergroup with this identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    /// Seconds left to wait before the request can be repeated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// An envelope with `ok: false`.
///
/// Two API errors compare equal when they carry the same `error_code`, so a
/// returned error can be matched against a known one regardless of its
/// description:
///
/// ```rust,ignore
/// if err == ApiError::new(429, "") { /* rate limited */ }
/// ```
#[derive(Debug, Clone, Error)]
#[error("telegram error {code}: {description}")]
pub struct ApiError {
    /// Numeric `error_code`.
    pub code: i64,
    /// Human-readable `description`.
    pub description: String,
    /// Optional `parameters` block.
    pub parameters: Option<ResponseParameters>,
}

impl ApiError {
    /// Creates an API error without parameters.
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            parameters: None,
        }
    }

    /// Returns the server-provided retry hint.
    pub fn retry_after(&self) -> Option<Duration> {
        self.parameters
            .as_ref()
            .and_then(|p| p.retry_after)
            .map(Duration::from_secs)
    }

    /// Returns the supergroup identifier a group chat migrated to.
    pub fn migrate_to_chat_id(&self) -> Option<i64> {
        self.parameters.as_ref().and_then(|p| p.migrate_to_chat_id)
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for ApiError {}

/// An [`ApiError`] together with the request that provoked it.
#[derive(Debug, Error)]
pub struct ApiFailure {
    pub snapshot: Snapshot,
    #[source]
    pub error: ApiError,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.snapshot.method.is_empty() {
            return write!(f, "{}", self.error);
        }
        write!(f, "{}: {}", self.snapshot, self.error)
    }
}

/// Errors that can occur while calling the Bot API.
#[derive(Debug, Error)]
pub enum Error {
    /// The calling context was cancelled.
    #[error("request canceled")]
    Canceled,

    /// The calling context's deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Transport failure.
    #[error(transparent)]
    Http(Box<HttpError>),

    /// Response decoding failure.
    #[error(transparent)]
    Json(Box<JsonError>),

    /// The API rejected the call.
    #[error(transparent)]
    Api(Box<ApiFailure>),

    /// A structured parameter could not be serialized.
    #[error("failed to encode parameter `{key}`: {source}")]
    Encode {
        /// Parameter name.
        key: String,
        /// Serializer error.
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn http(snapshot: Snapshot, source: impl Into<BoxError>) -> Self {
        Self::Http(Box::new(HttpError {
            snapshot,
            source: source.into(),
        }))
    }

    pub(crate) fn json(snapshot: Snapshot, raw: Bytes, source: serde_json::Error) -> Self {
        Self::Json(Box::new(JsonError {
            snapshot,
            raw,
            source,
        }))
    }

    pub(crate) fn api(snapshot: Snapshot, error: ApiError) -> Self {
        Self::Api(Box::new(ApiFailure { snapshot, error }))
    }

    /// Returns `true` for [`Error::Canceled`] and [`Error::DeadlineExceeded`].
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled | Self::DeadlineExceeded)
    }

    /// Returns the API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(failure) => Some(&failure.error),
            _ => None,
        }
    }

    /// Returns the retry hint of a rate-limited call.
    pub fn retry_after(&self) -> Option<Duration> {
        self.as_api().and_then(ApiError::retry_after)
    }
}

impl From<ApiError> for Error {
    fn from(error: ApiError) -> Self {
        Self::api(Snapshot::default(), error)
    }
}

impl PartialEq<ApiError> for Error {
    fn eq(&self, other: &ApiError) -> bool {
        self.as_api() == Some(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_equality_by_code() {
        let a = ApiError::new(429, "Too Many Requests");
        let b = ApiError {
            code: 429,
            description: "slow down".into(),
            parameters: Some(ResponseParameters {
                retry_after: Some(5),
                ..Default::default()
            }),
        };
        assert_eq!(a, b);
        assert_ne!(a, ApiError::new(400, "Too Many Requests"));
        assert_eq!(b.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_error_matches_api_error() {
        let err = Error::from(ApiError::new(403, "Forbidden: bot was blocked by the user"));
        assert!(err == ApiError::new(403, ""));
        assert!(!(Error::Canceled == ApiError::new(403, "")));
        assert!(Error::DeadlineExceeded.is_cancellation());
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = Snapshot {
            method: "sendPhoto".into(),
            params: "chat_id=1".into(),
            files: vec!["photo: cat.jpg".into()],
        };
        assert_eq!(snapshot.to_string(), "sendPhoto(chat_id=1)\n  photo: cat.jpg");

        let err = Error::http(snapshot, "connection refused");
        assert!(err.to_string().contains("sendPhoto(chat_id=1)"));
        assert!(err.to_string().ends_with("connection refused"));
    }

    #[test]
    fn test_api_error_display_names_the_request() {
        let snapshot = Snapshot {
            method: "sendMessage".into(),
            params: "chat_id=100&text=hi".into(),
            files: Vec::new(),
        };
        let err = Error::api(snapshot, ApiError::new(400, "Bad Request: chat not found"));
        assert_eq!(
            err.to_string(),
            "sendMessage(chat_id=100&text=hi): telegram error 400: Bad Request: chat not found"
        );
        assert_eq!(err.as_api().map(|api| api.code), Some(400));

        let bare = Error::from(ApiError::new(403, "Forbidden"));
        assert_eq!(bare.to_string(), "telegram error 403: Forbidden");
    }
}
