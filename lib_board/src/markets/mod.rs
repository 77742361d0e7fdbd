//! # Market Lookup Helpers
//!
//! Static, exchange-independent helpers that enrich or classify records:
//!
//! - **`sectors`**: raw sector tag to canonical sector names.
//! - **`listings`**: cross-listing flags from per-exchange symbol sets.
//! - **`links`**: outbound trading-page URLs.

pub mod links;
pub mod listings;
pub mod sectors;

pub use links::ExchangeLink;
pub use listings::ListingIndex;
pub use sectors::SectorMap;
