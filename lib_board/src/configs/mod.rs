//! # Pipeline Configuration
//!
//! Plain structs with `Default` impls. The runner binary layers its
//! file / env / CLI configuration on top of these and hands the result to
//! the adapters and the board view.

use std::path::PathBuf;
use std::time::Duration;

/// Built-in defaults, in one place.
pub mod defaults {
    use std::time::Duration;

    pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const RETRY_MAX_MULTIPLIER: u32 = 5;
    pub const RETRY_MAX_RETRIES: u32 = 3;

    pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    pub const PAGE_SIZE: usize = 20;
    pub const PAGE_SIBLINGS: usize = 2;
    pub const ITEM_HEIGHT_PX: f64 = 72.0;
    pub const VIEWPORT_HEIGHT_PX: f64 = 800.0;
    pub const OVERSCAN: usize = 5;
    pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
    pub const LAYOUT_BREAKPOINT_PX: f64 = 768.0;

    pub const USER_AGENT: &str = "tickerboard/0.1";
    pub const STORAGE_DIR: &str = "tickerboard";
    pub const STORAGE_FILE: &str = "storage.json";
    pub const FAVORITES_KEY: &str = "favorites";
}

/// Linear backoff for one poll cycle: retry `n` waits
/// `min(base_delay * n, base_delay * max_multiplier)`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub base_delay: Duration,
    pub max_multiplier: u32,
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: defaults::RETRY_BASE_DELAY,
            max_multiplier: defaults::RETRY_MAX_MULTIPLIER,
            max_retries: defaults::RETRY_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub url: String,
    pub interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl PollConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: defaults::POLL_INTERVAL,
            request_timeout: defaults::REQUEST_TIMEOUT,
            retry: RetryConfig::default(),
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    /// No bytes for this long means the stream is stale. `None` disables the watchdog.
    pub idle_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl PushConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: defaults::RECONNECT_DELAY,
            idle_timeout: Some(defaults::IDLE_TIMEOUT),
            connect_timeout: defaults::CONNECT_TIMEOUT,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub page_size: usize,
    pub page_siblings: usize,
    pub item_height: f64,
    pub viewport_height: f64,
    pub overscan: usize,
    pub search_debounce: Duration,
    pub layout_breakpoint: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            page_siblings: defaults::PAGE_SIBLINGS,
            item_height: defaults::ITEM_HEIGHT_PX,
            viewport_height: defaults::VIEWPORT_HEIGHT_PX,
            overscan: defaults::OVERSCAN,
            search_debounce: defaults::SEARCH_DEBOUNCE,
            layout_breakpoint: defaults::LAYOUT_BREAKPOINT_PX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    /// `<data dir>/tickerboard/storage.json`, or the working directory when
    /// the platform has no data directory.
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join(defaults::STORAGE_DIR).join(defaults::STORAGE_FILE),
        }
    }
}
