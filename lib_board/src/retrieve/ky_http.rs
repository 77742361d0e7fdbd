//! # HTTP Retrieval Utilities
//!
//! `ApiClient` wraps `reqwest` with `reqwest-middleware` so transient failures
//! (timeouts, connection resets, 408/429/5xx) are retried inside one request
//! before the caller sees them. The delay grows linearly and is capped.
//!
//! Everything that comes out of this module is already classified as a
//! [`FeedError`]; callers never see a raw `reqwest` error.

use std::time::{Duration, SystemTime};

use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryDecision, RetryPolicy, RetryTransientMiddleware};

use crate::configs::RetryConfig;
use crate::error::{ConfigError, FeedError};

/// Linear retry schedule: retry `n` (1-based) waits
/// `min(base * n, base * max_multiplier)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    base_delay: Duration,
    max_multiplier: u32,
    max_retries: u32,
}

impl LinearBackoff {
    pub fn new(base_delay: Duration, max_multiplier: u32, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_multiplier: max_multiplier.max(1),
            max_retries,
        }
    }

    /// Delay before the retry that follows `n_past_retries` earlier retries.
    pub fn delay_for(&self, n_past_retries: u32) -> Duration {
        let n = n_past_retries.saturating_add(1).min(self.max_multiplier);
        self.base_delay.saturating_mul(n)
    }
}

impl From<&RetryConfig> for LinearBackoff {
    fn from(cfg: &RetryConfig) -> Self {
        Self::new(cfg.base_delay, cfg.max_multiplier, cfg.max_retries)
    }
}

impl RetryPolicy for LinearBackoff {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            return RetryDecision::DoNotRetry;
        }
        RetryDecision::Retry {
            execute_after: SystemTime::now() + self.delay_for(n_past_retries),
        }
    }
}

/// Retrying GET client for the REST snapshot endpoint.
#[derive(Clone)]
pub struct ApiClient {
    inner: ClientWithMiddleware,
}

impl ApiClient {
    /// Builds the client. Each individual attempt is bounded by `timeout`.
    pub fn new(timeout: Duration, user_agent: &str, retry: &RetryConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FeedError::Permanent(format!("HTTP client setup failed: {e}")))?;

        let inner = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(LinearBackoff::from(retry)))
            .build();

        Ok(Self { inner })
    }

    /// GETs `url` and returns the body of a 2xx response.
    ///
    /// Retries have already been spent by the time an error comes back.
    pub async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        let url = parse_url(url)?;
        let response = self.inner.get(url).send().await.map_err(classify_middleware)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::from_status(status.as_u16(), &body));
        }

        response.text().await.map_err(classify_reqwest)
    }
}

/// Client for long-lived event streams: bounded connect, no overall timeout,
/// no retry middleware (the push adapter owns its reconnect schedule).
pub fn stream_client(connect_timeout: Duration, user_agent: &str) -> Result<reqwest::Client, FeedError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| FeedError::Permanent(format!("HTTP client setup failed: {e}")))
}

const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Opens an event stream. Only a 2xx `text/event-stream` response counts as
/// open; anything else is turned into an error before the caller sees it.
pub async fn open_event_stream(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, FeedError> {
    let url = parse_url(url)?;
    let mut response = client
        .get(url)
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(classify_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FeedError::from_status(status.as_u16(), &body));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if is_event_stream(&content_type) {
        return Ok(response);
    }

    // The body may never end; one chunk is enough to tell an HTML page apart.
    let head = response.chunk().await.ok().flatten().unwrap_or_default();
    Err(wrong_content_type(&content_type, &head))
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(EVENT_STREAM_MIME))
}

fn wrong_content_type(content_type: &str, head: &[u8]) -> FeedError {
    if String::from_utf8_lossy(head).trim_start().starts_with('<') {
        return FeedError::html_body();
    }
    let shown = if content_type.is_empty() { "no content type" } else { content_type };
    FeedError::Parse(format!("expected {EVENT_STREAM_MIME}, got {shown}"))
}

fn parse_url(url: &str) -> Result<Url, FeedError> {
    Url::parse(url).map_err(|source| {
        FeedError::Permanent(
            ConfigError::InvalidUrl {
                url: url.to_string(),
                source,
            }
            .to_string(),
        )
    })
}

/// Transport-level failures are always worth another try.
pub(crate) fn classify_reqwest(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Transient("request timed out".to_string())
    } else if err.is_connect() {
        FeedError::Transient(format!("connection failed: {err}"))
    } else {
        FeedError::Transient(err.to_string())
    }
}

fn classify_middleware(err: reqwest_middleware::Error) -> FeedError {
    match err {
        reqwest_middleware::Error::Reqwest(e) => classify_reqwest(e),
        reqwest_middleware::Error::Middleware(e) => FeedError::Transient(e.to_string()),
    }
}
