//! Bot handle.

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::context::Context;
use crate::error::BoxError;
use crate::http::HttpClient;

/// Default base URL for method calls.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org/bot";

/// Default base URL for file downloads.
pub const DEFAULT_FILE_BASE: &str = "https://api.telegram.org/file/bot";

/// A handler error stored in the bot's error latch.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// A bot: token, endpoints, HTTP client and the error latch.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

struct BotInner {
    token: String,
    api_base: String,
    file_base: String,
    client: Arc<dyn HttpClient>,
    error: OnceLock<SharedError>,
}

impl Bot {
    /// Creates a bot with the default endpoints.
    pub fn new(token: impl Into<String>, client: impl HttpClient) -> Self {
        Self::builder(token, Arc::new(client)).build()
    }

    /// Starts building a bot with custom endpoints.
    pub fn builder(token: impl Into<String>, client: Arc<dyn HttpClient>) -> BotBuilder {
        BotBuilder {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            file_base: DEFAULT_FILE_BASE.to_string(),
            client,
        }
    }

    /// Root context of this bot.
    pub fn context(&self) -> Context {
        Context::new(self.clone())
    }

    /// Numeric bot id, the part of the token before `:`.
    pub fn id(&self) -> Option<i64> {
        self.inner.token.split(':').next()?.parse().ok()
    }

    /// The HTTP client.
    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.inner.client
    }

    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}{}/{}", self.inner.api_base, self.inner.token, method)
    }

    pub(crate) fn file_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.inner.file_base, self.inner.token, path)
    }

    /// Latches a handler error.
    ///
    /// Only the first error is kept and it is never cleared. Returns `true`
    /// if this call set the latch.
    pub fn fail(&self, err: impl Into<BoxError>) -> bool {
        let err: SharedError = Arc::from(err.into());
        self.inner.error.set(err).is_ok()
    }

    /// The latched handler error, if any.
    pub fn error(&self) -> Option<SharedError> {
        self.inner.error.get().cloned()
    }

    /// Returns `true` once a handler error has been latched.
    pub fn is_failed(&self) -> bool {
        self.inner.error.get().is_some()
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.id())
            .field("api_base", &self.inner.api_base)
            .field("failed", &self.is_failed())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bot`].
pub struct BotBuilder {
    token: String,
    api_base: String,
    file_base: String,
    client: Arc<dyn HttpClient>,
}

impl BotBuilder {
    /// Overrides the base URL for method calls (e.g. a local Bot API server).
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Overrides the base URL for file downloads.
    pub fn file_base(mut self, url: impl Into<String>) -> Self {
        self.file_base = url.into();
        self
    }

    pub fn build(self) -> Bot {
        Bot {
            inner: Arc::new(BotInner {
                token: self.token,
                api_base: self.api_base,
                file_base: self.file_base,
                client: self.client,
                error: OnceLock::new(),
            }),
        }
    }
}
