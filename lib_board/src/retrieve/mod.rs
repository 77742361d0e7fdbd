//! # Data Retrieval Module
//!
//! The HTTP side of the feeds, kept apart from decoding so the ingestors only
//! deal with bodies and [`FeedError`](crate::error::FeedError)s.
//!
//! - **`ky_http`**: `ApiClient`, a `reqwest` client behind `reqwest-middleware`
//!   with a linear retry policy, plus the plain streaming client used by the
//!   event-stream adapter.

/// HTTP client with retry middleware and error classification.
pub mod ky_http;

pub use ky_http::{ApiClient, LinearBackoff};
