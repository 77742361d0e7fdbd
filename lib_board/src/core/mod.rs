//! # Core Pipeline
//!
//! Pure, synchronous stages between the adapters and the renderer:
//!
//! - **`selector`**: push-vs-poll source choice.
//! - **`filter`**: search, favorites, sector, price range, then sort.
//! - **`windowing`**: de-duplication, pagination and virtual scrolling.
//! - **`debounce`**: settles the search term before it reaches the filter.
//! - **`board`**: runs the stages for one frame and owns the UI state.

pub mod board;
pub mod debounce;
pub mod filter;
pub mod selector;
pub mod windowing;

pub use board::{BoardFrame, BoardView, Layout, PageView};
pub use debounce::Debounced;
pub use filter::{apply_filters, sort_records};
pub use selector::{select_snapshot, Selection, SourceKind};
pub use windowing::{dedup_by_symbol, PageToken, Paginator, VirtualSlice, VirtualWindow};
