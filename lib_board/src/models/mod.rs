//! # Board Data Model
//!
//! - **`price_record`**: one ticker snapshot row.
//! - **`filter_state`**: the user's search / sort / filter selections.
//! - **`feed_state`**: what a data-source adapter publishes.

mod feed_state;
mod filter_state;
mod price_record;

pub use feed_state::{FeedState, StreamPhase};
pub use filter_state::{FilterState, PriceBucket, SortDirection, SortKey, SortSpec};
pub use price_record::PriceRecord;
