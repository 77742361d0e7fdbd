use std::collections::{BTreeMap, HashSet};

use crate::models::PriceRecord;

/// Static symbol sets per secondary exchange.
///
/// The sets themselves are lookup data supplied by the caller; this only
/// stamps membership onto records.
#[derive(Debug, Clone, Default)]
pub struct ListingIndex {
    exchanges: BTreeMap<String, HashSet<String>>,
}

impl ListingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exchange<I, S>(mut self, exchange: &str, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .collect();
        self.exchanges.insert(exchange.to_string(), set);
        self
    }

    pub fn exchanges_for(&self, symbol: &str) -> impl Iterator<Item = &str> {
        let key = symbol.to_uppercase();
        self.exchanges
            .iter()
            .filter(move |(_, symbols)| symbols.contains(&key))
            .map(|(name, _)| name.as_str())
    }

    /// Returns the same records with `cross_listings` filled in.
    pub fn annotate(&self, records: Vec<PriceRecord>) -> Vec<PriceRecord> {
        if self.exchanges.is_empty() {
            return records;
        }
        records
            .into_iter()
            .map(|mut rec| {
                rec.cross_listings = self.exchanges_for(&rec.symbol).map(str::to_string).collect();
                rec
            })
            .collect()
    }
}
