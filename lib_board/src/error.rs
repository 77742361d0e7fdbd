//! Error taxonomy for feeds and storage.
//!
//! Feed errors never escape an adapter's run loop; they end up in
//! [`FeedState::error`](crate::models::FeedState) and their `Display` text is
//! what the board shows in its banner.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Timeouts, refused connections, 5xx responses, dropped streams.
    #[error("Network error: {0}")]
    Transient(String),

    /// The upstream answered, but not with something we can decode.
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Failures that will not go away by retrying (bad credentials, wrong URL).
    #[error("{0}")]
    Permanent(String),
}

impl FeedError {
    /// Whether the adapter should keep trying after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FeedError::Permanent(_))
    }

    /// A 2xx answer whose body is an HTML page (proxy or error page).
    pub fn html_body() -> Self {
        FeedError::Parse("received HTML instead of JSON (upstream error page?)".to_string())
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let snippet: String = body.trim().chars().take(200).collect();
        let detail = if snippet.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {snippet}")
        };

        match status {
            408 | 429 | 500..=599 => FeedError::Transient(detail),
            _ => FeedError::Permanent(detail),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Link template '{0}' has no {{symbol}} placeholder")]
    MissingPlaceholder(String),
}
