//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {0} does not exist")]
    FileNotFound(PathBuf),

    /// No enabled format reads this file extension.
    #[error("no enabled config format reads {0}")]
    UnsupportedFormat(PathBuf),

    /// A source is malformed or a value has the wrong type.
    #[error("malformed configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("no bot token configured; set `token` or TGBOT_TOKEN")]
    MissingToken,

    /// A value parsed but is out of range for the Bot API.
    #[error("invalid `{field}`: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("invalid `{field}` URL {url:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_url(field: &'static str, url: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidUrl {
            field,
            url: url.into(),
            reason,
        }
    }

    /// The offending key, for errors raised by validation.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingToken => Some("token"),
            Self::Invalid { field, .. } | Self::InvalidUrl { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
