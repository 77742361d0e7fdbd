//! # Data Ingestors Module
//!
//! The two data sources behind the board. Each adapter runs as its own tokio
//! task, owns its `FeedState` exclusively and publishes it through a `watch`
//! channel; consumers only ever read.
//!
//! - **`poll`**: interval-driven REST fetch with retrying HTTP client.
//! - **`push`**: long-lived event-stream connection with reconnect FSM.
//! - **`payload`**: body decoders shared by both.
//! - **`sse`**: incremental event-stream framing.
//!
//! Neither adapter returns an error or panics out of its loop; failures end
//! up in `FeedState::error`.

mod handle;
pub mod payload;
pub mod poll;
pub mod push;
pub mod sse;

// --- Public API Re-exports ---
pub use handle::FeedHandle;
pub use poll::PollAdapter;
pub use push::PushAdapter;
