//! Favorites: the only board state that outlives a session.
//!
//! Stored under a single key as a JSON array of symbols. The store is an
//! owned object handed to whoever needs it; there is no global.

use std::collections::BTreeSet;

use crate::configs::defaults;
use crate::error::StorageError;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesSet(BTreeSet<String>);

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns `true` if the symbol is a favorite afterwards.
    fn toggle(&mut self, symbol: &str) -> bool {
        if self.0.remove(symbol) {
            false
        } else {
            self.0.insert(symbol.to_string());
            true
        }
    }
}

impl<S: Into<String>> FromIterator<S> for FavoritesSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

pub struct FavoritesStore<S: KeyValueStore> {
    backend: S,
    key: String,
    set: FavoritesSet,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Reads the persisted set once. A missing entry is an empty set; an
    /// unreadable entry is logged and treated as empty so a corrupt value
    /// never blocks the board.
    pub fn open(backend: S) -> Result<Self, StorageError> {
        Self::open_with_key(backend, defaults::FAVORITES_KEY)
    }

    pub fn open_with_key(backend: S, key: &str) -> Result<Self, StorageError> {
        let set = match backend.get(key)? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(symbols) => symbols.into_iter().collect(),
                Err(e) => {
                    log::warn!("Ignoring unreadable favorites entry '{}': {}", key, e);
                    FavoritesSet::new()
                }
            },
            None => FavoritesSet::new(),
        };

        log::debug!("Loaded {} favorites", set.len());
        Ok(Self {
            backend,
            key: key.to_string(),
            set,
        })
    }

    pub fn get(&self) -> &FavoritesSet {
        &self.set
    }

    pub fn is_favorite(&self, symbol: &str) -> bool {
        self.set.contains(symbol)
    }

    /// Flips one symbol and rewrites the whole entry.
    pub fn toggle(&mut self, symbol: &str) -> Result<bool, StorageError> {
        let now_favorite = self.set.toggle(symbol);
        let symbols: Vec<&str> = self.set.iter().collect();
        self.backend.set(&self.key, &serde_json::to_string(&symbols)?)?;
        log::info!(
            "{} {} favorites ({} total)",
            if now_favorite { "Added" } else { "Removed" },
            symbol,
            self.set.len()
        );
        Ok(now_favorite)
    }
}
