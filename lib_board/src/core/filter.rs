//! # Filter / Sort Stage
//!
//! `apply_filters` is a pure function of its inputs: the same snapshot and
//! `FilterState` always give the same output. It re-runs in full whenever the
//! snapshot or any filter field changes; the debounced search term is what
//! keeps that cheap while the user is typing.

use std::cmp::Ordering;

use crate::markets::SectorMap;
use crate::models::{FilterState, PriceRecord, SortDirection, SortKey, SortSpec};
use crate::storage::favorites::FavoritesSet;

pub fn apply_filters(
    records: &[PriceRecord],
    filters: &FilterState,
    favorites: &FavoritesSet,
    sectors: &SectorMap,
) -> Vec<PriceRecord> {
    let needle = filters.search.trim().to_lowercase();

    let mut out: Vec<PriceRecord> = records
        .iter()
        .filter(|r| needle.is_empty() || matches_search(r, &needle))
        .filter(|r| !filters.favorites_only || favorites.contains(&r.symbol))
        .filter(|r| match &filters.sector {
            Some(selected) => sectors.matches(r.sector.as_deref(), selected),
            None => true,
        })
        .filter(|r| filters.price_range.contains(r.current_price))
        .cloned()
        .collect();

    sort_records(&mut out, filters.sort);
    out
}

/// `needle` must already be trimmed and lowercased.
fn matches_search(record: &PriceRecord, needle: &str) -> bool {
    [&record.korean_name, &record.english_name, &record.symbol]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

pub fn sort_records(records: &mut [PriceRecord], spec: SortSpec) {
    records.sort_by(|a, b| {
        let ord = compare(a, b, spec.key);
        match spec.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

fn compare(a: &PriceRecord, b: &PriceRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Volume => a.volume.total_cmp(&b.volume),
        SortKey::Price => a.current_price.total_cmp(&b.current_price),
        SortKey::ChangeRate => a.change_rate.total_cmp(&b.change_rate),
        SortKey::Name => compare_names(a, b),
    }
}

/// Case-folded display names, ties broken by symbol.
fn compare_names(a: &PriceRecord, b: &PriceRecord) -> Ordering {
    a.display_name()
        .to_lowercase()
        .cmp(&b.display_name().to_lowercase())
        .then_with(|| a.display_name().cmp(b.display_name()))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBucket;

    fn rec(symbol: &str, price: f64) -> PriceRecord {
        PriceRecord {
            symbol: symbol.into(),
            english_name: format!("{symbol} coin"),
            current_price: price,
            volume: price * 2.0,
            change_rate: 100.0 / price,
            ..Default::default()
        }
    }

    fn run(records: &[PriceRecord], filters: &FilterState) -> Vec<PriceRecord> {
        apply_filters(records, filters, &FavoritesSet::new(), &SectorMap::default())
    }

    #[test]
    fn price_bucket_under_10k() {
        let records = vec![rec("A", 500.0), rec("B", 5_000.0), rec("C", 50_000.0), rec("D", 500_000.0)];
        let filters = FilterState {
            price_range: PriceBucket::Under10k,
            sort: SortSpec::new(SortKey::Price, SortDirection::Ascending),
            ..Default::default()
        };
        let prices: Vec<f64> = run(&records, &filters).iter().map(|r| r.current_price).collect();
        assert_eq!(prices, vec![500.0, 5_000.0]);
    }

    #[test]
    fn price_descending_is_ordered() {
        let records = vec![rec("A", 3.0), rec("B", 300.0), rec("C", 30.0), rec("D", 0.3), rec("E", 30.0)];
        let filters = FilterState {
            sort: SortSpec::new(SortKey::Price, SortDirection::Descending),
            ..Default::default()
        };
        let out = run(&records, &filters);
        assert_eq!(out.len(), records.len());
        assert!(out.windows(2).all(|w| w[0].current_price >= w[1].current_price));
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = vec![rec("BTC", 90_000.0), rec("ETH", 4_000.0), rec("XRP", 0.5)];
        let favorites: FavoritesSet = ["ETH", "XRP"].into_iter().collect();
        let filters = FilterState {
            search: "  e ".into(),
            favorites_only: true,
            sort: SortSpec::new(SortKey::Name, SortDirection::Ascending),
            ..Default::default()
        };
        let sectors = SectorMap::default();

        let first = apply_filters(&records, &filters, &favorites, &sectors);
        let second = apply_filters(&records, &filters, &favorites, &sectors);
        assert_eq!(first, second);
        let again = apply_filters(&first, &filters, &favorites, &sectors);
        assert_eq!(first, again);
    }

    #[test]
    fn search_is_case_insensitive_over_names_and_symbol() {
        let mut btc = rec("BTC", 1.0);
        btc.korean_name = "비트코인".into();
        let records = vec![btc, rec("ETH", 1.0)];

        let by_symbol = FilterState { search: "btc".into(), ..Default::default() };
        assert_eq!(run(&records, &by_symbol)[0].symbol, "BTC");

        let by_korean = FilterState { search: "비트".into(), ..Default::default() };
        assert_eq!(run(&records, &by_korean).len(), 1);

        let by_english = FilterState { search: "ETH COIN".into(), ..Default::default() };
        assert_eq!(run(&records, &by_english)[0].symbol, "ETH");
    }

    #[test]
    fn favorites_only_intersects() {
        let records = vec![rec("BTC", 1.0), rec("ETH", 1.0)];
        let favorites: FavoritesSet = ["ETH"].into_iter().collect();
        let filters = FilterState { favorites_only: true, ..Default::default() };
        let out = apply_filters(&records, &filters, &favorites, &SectorMap::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "ETH");
    }

    #[test]
    fn sector_filter_uses_consolidation() {
        let mut eth = rec("ETH", 1.0);
        eth.sector = Some("Smart Contract Platform".into());
        let mut uni = rec("UNI", 1.0);
        uni.sector = Some("DEX".into());
        let plain = rec("ZZZ", 1.0);
        let records = vec![eth, uni, plain];

        let infra = FilterState { sector: Some("Infrastructure".into()), ..Default::default() };
        let out = run(&records, &infra);
        assert_eq!(out.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(), vec!["ETH"]);

        let exchange = FilterState { sector: Some("Exchange".into()), ..Default::default() };
        assert_eq!(run(&records, &exchange)[0].symbol, "UNI");
    }

    #[test]
    fn name_sort_is_case_folded() {
        let mut a = rec("A", 1.0);
        a.english_name = "bitcoin".into();
        let mut b = rec("B", 1.0);
        b.english_name = "Aave".into();
        let mut c = rec("C", 1.0);
        c.english_name = "Cardano".into();

        let mut records = vec![a, b, c];
        sort_records(&mut records, SortSpec::new(SortKey::Name, SortDirection::Ascending));
        let names: Vec<&str> = records.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["Aave", "bitcoin", "Cardano"]);
    }

    #[test]
    fn volume_and_change_rate_sorts() {
        let records = vec![rec("A", 10.0), rec("B", 1.0), rec("C", 100.0)];

        let by_volume = FilterState::default();
        let syms: Vec<String> = run(&records, &by_volume).into_iter().map(|r| r.symbol).collect();
        assert_eq!(syms, vec!["C", "A", "B"]);

        let by_change = FilterState {
            sort: SortSpec::new(SortKey::ChangeRate, SortDirection::Ascending),
            ..Default::default()
        };
        let syms: Vec<String> = run(&records, &by_change).into_iter().map(|r| r.symbol).collect();
        assert_eq!(syms, vec!["C", "A", "B"]);
    }
}
