use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Volume,
    Price,
    ChangeRate,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "volume" => Ok(SortKey::Volume),
            "price" => Ok(SortKey::Price),
            "change" | "changerate" | "change_rate" => Ok(SortKey::ChangeRate),
            "name" => Ok(SortKey::Name),
            _ => Err(format!("unknown sort key '{s}'")),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(format!("unknown sort direction '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Clicking the active column flips direction; another column starts descending.
    pub fn toggled(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Descending)
        }
    }
}

/// Price-range filter. Thresholds are cumulative: `Under10k` keeps every
/// record priced below 10,000, including those below 1,000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PriceBucket {
    #[default]
    All,
    Under1k,
    Under10k,
    Under100k,
    AtLeast100k,
}

impl PriceBucket {
    pub const ALL: [PriceBucket; 5] = [
        PriceBucket::All,
        PriceBucket::Under1k,
        PriceBucket::Under10k,
        PriceBucket::Under100k,
        PriceBucket::AtLeast100k,
    ];

    pub fn contains(self, price: f64) -> bool {
        match self {
            PriceBucket::All => true,
            PriceBucket::Under1k => price < 1_000.0,
            PriceBucket::Under10k => price < 10_000.0,
            PriceBucket::Under100k => price < 100_000.0,
            PriceBucket::AtLeast100k => price >= 100_000.0,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            PriceBucket::All => "all",
            PriceBucket::Under1k => "under1000",
            PriceBucket::Under10k => "under10000",
            PriceBucket::Under100k => "under100000",
            PriceBucket::AtLeast100k => "over100000",
        }
    }
}

impl fmt::Display for PriceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PriceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceBucket::ALL
            .into_iter()
            .find(|b| b.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown price range '{s}'"))
    }
}

/// Ephemeral board filters. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterState {
    pub search: String,
    pub sort: SortSpec,
    pub favorites_only: bool,
    /// Canonical sector name; `None` shows every sector.
    pub sector: Option<String>,
    pub price_range: PriceBucket,
}

impl FilterState {
    pub fn is_default(&self) -> bool {
        *self == FilterState::default()
    }
}
