use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One exchange ticker snapshot.
///
/// This is also the wire shape of the event stream's primary payload
/// (a JSON array of camelCase objects). `isPositive` is accepted on input for
/// compatibility but always recomputed from `changeAmount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub symbol: String,
    #[serde(default)]
    pub korean_name: String,
    #[serde(default)]
    pub english_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub current_price: f64,
    #[serde(default)]
    pub change_rate: f64,
    #[serde(default)]
    pub change_amount: f64,
    #[serde(default)]
    pub high_price: f64,
    #[serde(default)]
    pub low_price: f64,
    #[serde(default)]
    pub volume: f64,
    /// Secondary exchanges that also list this symbol. Filled from a static
    /// index, never derived from market data.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cross_listings: BTreeSet<String>,
}

impl PriceRecord {
    /// Zero counts as positive.
    pub fn is_positive(&self) -> bool {
        self.change_amount >= 0.0
    }

    /// Preferred label: korean name, then english name, then the symbol.
    pub fn display_name(&self) -> &str {
        if !self.korean_name.is_empty() {
            &self.korean_name
        } else if !self.english_name.is_empty() {
            &self.english_name
        } else {
            &self.symbol
        }
    }

    /// Records that may be rendered. Everything else is dropped at ingestion.
    pub fn is_renderable(&self) -> bool {
        !self.symbol.is_empty() && self.current_price.is_finite() && self.current_price > 0.0
    }

    pub fn is_listed_on(&self, exchange: &str) -> bool {
        self.cross_listings.contains(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_change(change_amount: f64) -> PriceRecord {
        PriceRecord {
            symbol: "BTC".into(),
            current_price: 1.0,
            change_amount,
            ..Default::default()
        }
    }

    #[test]
    fn positive_negative_split() {
        let flags: Vec<bool> = [5.0, -2.0, 0.0]
            .into_iter()
            .map(|c| with_change(c).is_positive())
            .collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn display_name_fallbacks() {
        let mut rec = with_change(0.0);
        assert_eq!(rec.display_name(), "BTC");
        rec.english_name = "Bitcoin".into();
        assert_eq!(rec.display_name(), "Bitcoin");
        rec.korean_name = "비트코인".into();
        assert_eq!(rec.display_name(), "비트코인");
    }

    #[test]
    fn renderable_requires_positive_price() {
        let mut rec = with_change(0.0);
        assert!(rec.is_renderable());
        rec.current_price = 0.0;
        assert!(!rec.is_renderable());
        rec.current_price = f64::NAN;
        assert!(!rec.is_renderable());
    }

    #[test]
    fn deserializes_camel_case_and_ignores_is_positive() {
        let rec: PriceRecord = serde_json::from_str(
            r#"{"symbol":"ETH","koreanName":"이더리움","currentPrice":4000,"changeRate":-1.5,
               "changeAmount":-60,"highPrice":4100,"lowPrice":3900,"volume":12.5,"isPositive":true}"#,
        )
        .unwrap();
        assert_eq!(rec.symbol, "ETH");
        assert_eq!(rec.korean_name, "이더리움");
        assert!(!rec.is_positive());
        assert_eq!(rec.sector, None);
    }
}
