//! Sector consolidation.
//!
//! Upstream sector tags are free-form; the board filters on a small set of
//! canonical names. One raw tag may fan out to several canonical sectors.

use std::collections::HashMap;

/// Built-in consolidation table: raw tag (compared case-insensitively) to
/// canonical sector names.
const DEFAULT_CONSOLIDATION: &[(&str, &[&str])] = &[
    ("layer 1", &["Layer 1"]),
    ("layer1", &["Layer 1"]),
    ("smart contract platform", &["Layer 1", "Infrastructure"]),
    ("layer 2", &["Layer 2", "Infrastructure"]),
    ("scaling", &["Layer 2"]),
    ("defi", &["DeFi"]),
    ("decentralized exchange", &["DeFi", "Exchange"]),
    ("dex", &["DeFi", "Exchange"]),
    ("lending", &["DeFi"]),
    ("exchange token", &["Exchange"]),
    ("stablecoin", &["Stablecoin"]),
    ("meme", &["Meme"]),
    ("gaming", &["Gaming & Metaverse"]),
    ("metaverse", &["Gaming & Metaverse"]),
    ("nft", &["Gaming & Metaverse", "NFT"]),
    ("oracle", &["Infrastructure"]),
    ("storage", &["Infrastructure"]),
    ("privacy", &["Privacy"]),
    ("payments", &["Payments"]),
    ("ai", &["AI"]),
    ("artificial intelligence", &["AI"]),
];

#[derive(Debug, Clone)]
pub struct SectorMap {
    table: HashMap<String, Vec<String>>,
}

impl Default for SectorMap {
    fn default() -> Self {
        let table = DEFAULT_CONSOLIDATION
            .iter()
            .map(|(raw, canon)| (raw.to_string(), canon.iter().map(|c| c.to_string()).collect()))
            .collect();
        Self { table }
    }
}

impl SectorMap {
    /// A map with no entries: every tag is its own canonical name.
    pub fn empty() -> Self {
        Self { table: HashMap::new() }
    }

    /// Adds or replaces the consolidation for one raw tag.
    pub fn with_entry(mut self, raw: &str, canonical: &[&str]) -> Self {
        self.table.insert(
            normalize(raw),
            canonical.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Canonical names for a raw tag. Unknown tags map to themselves.
    pub fn canonical<'a>(&'a self, raw: &'a str) -> Vec<&'a str> {
        match self.table.get(&normalize(raw)) {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => vec![raw.trim()],
        }
    }

    pub fn matches(&self, raw: Option<&str>, selected: &str) -> bool {
        match raw {
            Some(tag) => self.canonical(tag).iter().any(|name| *name == selected),
            None => false,
        }
    }

    /// Every canonical sector known to the table, sorted, for building a selector.
    pub fn canonical_sectors(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.values().flatten().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
