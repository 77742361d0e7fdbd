//! # lib_board
//!
//! The snapshot pipeline behind the ticker board:
//!
//! ```text
//! ingestors (poll, push) -> core::selector -> core::filter -> core::windowing
//! ```
//!
//! The `feeds` feature (on by default) adds the network side: the retrying
//! HTTP client in `retrieve` and the two adapters in `ingestors`. Everything
//! else is pure and synchronous.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod configs;
pub mod core;
pub mod error;
pub mod markets;
pub mod models;
pub mod storage;

#[cfg(feature = "feeds")]
pub mod ingestors;
#[cfg(feature = "feeds")]
pub mod retrieve;

// --- Public API Re-exports ---
pub use crate::core::board::{BoardFrame, BoardView, Layout};
pub use crate::core::selector::{select_snapshot, Selection, SourceKind};
pub use error::{FeedError, StorageError};
pub use models::{FeedState, FilterState, PriceBucket, PriceRecord, SortDirection, SortKey, SortSpec, StreamPhase};
pub use storage::favorites::{FavoritesSet, FavoritesStore};
