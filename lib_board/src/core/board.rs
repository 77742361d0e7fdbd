//! # Board View
//!
//! Glue for one refresh of the board: pick a source, filter and sort it,
//! then window it. Owns the ephemeral UI state (filters, debounced search,
//! page position, scroll offset); reads the adapters' states and the
//! favorites set it is handed.

use std::time::Instant;

use crate::configs::BoardConfig;
use crate::core::debounce::Debounced;
use crate::core::filter::apply_filters;
use crate::core::selector::{select_snapshot, SourceKind};
use crate::core::windowing::{dedup_by_symbol, list_fingerprint, PageToken, Paginator, VirtualSlice, VirtualWindow};
use crate::markets::SectorMap;
use crate::models::{FeedState, FilterState, PriceBucket, PriceRecord, SortKey, SortSpec};
use crate::storage::favorites::FavoritesSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed-size pages.
    Paged,
    /// Scroll-derived window.
    Virtual,
}

impl Layout {
    /// Narrow viewports scroll; wide ones page.
    pub fn for_width(width_px: f64, breakpoint_px: f64) -> Self {
        if width_px < breakpoint_px {
            Layout::Virtual
        } else {
            Layout::Paged
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub current_page: usize,
    pub total_pages: usize,
    pub tokens: Vec<PageToken>,
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone)]
pub struct BoardFrame {
    pub source: SourceKind,
    pub rows: Vec<PriceRecord>,
    /// Distinct symbols in the selected snapshot.
    pub total_records: usize,
    /// Distinct symbols left after filtering.
    pub filtered_records: usize,
    pub pages: Option<PageView>,
    pub window: Option<VirtualSlice>,
    pub banner: Option<String>,
    /// Neutral "no data yet" state; distinct from an error.
    pub empty: bool,
}

pub struct BoardView {
    config: BoardConfig,
    sectors: SectorMap,
    filters: FilterState,
    search: Debounced<String>,
    layout: Layout,
    paginator: Paginator,
    window: VirtualWindow,
    scroll_offset: f64,
    seen_data: bool,
}

impl BoardView {
    pub fn new(config: BoardConfig, sectors: SectorMap) -> Self {
        Self {
            search: Debounced::new(String::new(), config.search_debounce),
            paginator: Paginator::new(config.page_size),
            window: VirtualWindow::new(config.item_height, config.viewport_height, config.overscan),
            layout: Layout::Paged,
            filters: FilterState::default(),
            scroll_offset: 0.0,
            seen_data: false,
            sectors,
            config,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn set_viewport_width(&mut self, width_px: f64) {
        self.layout = Layout::for_width(width_px, self.config.layout_breakpoint);
    }

    pub fn set_viewport_height(&mut self, height_px: f64) {
        self.window.viewport_height = height_px;
    }

    /// Raw keystrokes; the term joins the filter once it has been stable
    /// for the debounce delay.
    pub fn set_search(&mut self, text: &str, now: Instant) {
        self.search.set(text.to_string(), now);
    }

    /// Explicit submit: applies the term on the next refresh, no debounce.
    pub fn submit_search(&mut self, text: &str) {
        self.search.flush(text.to_string());
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.filters.sort = sort;
    }

    /// Column-header click.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.filters.sort = self.filters.sort.toggled(key);
    }

    pub fn set_favorites_only(&mut self, on: bool) {
        self.filters.favorites_only = on;
    }

    pub fn set_sector(&mut self, sector: Option<String>) {
        self.filters.sector = sector;
    }

    pub fn set_price_range(&mut self, bucket: PriceBucket) {
        self.filters.price_range = bucket;
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.paginator.go_to(page);
    }

    pub fn next_page(&mut self) {
        self.paginator.next();
    }

    pub fn prev_page(&mut self) {
        self.paginator.prev();
    }

    pub fn scroll_to(&mut self, offset_px: f64) {
        self.scroll_offset = offset_px;
    }

    /// Explicit user reset: default filters, back to the top of the list.
    pub fn reset_filters(&mut self) {
        self.clear_filters();
        self.paginator.go_to(1);
        self.scroll_offset = 0.0;
    }

    fn clear_filters(&mut self) {
        self.filters = FilterState::default();
        self.search.flush(String::new());
    }

    /// Runs selector, filter/sort and windowing for the current inputs.
    pub fn refresh(
        &mut self,
        push: &FeedState,
        poll: &FeedState,
        favorites: &FavoritesSet,
        now: Instant,
    ) -> BoardFrame {
        let selection = select_snapshot(push, poll);

        // The first non-empty snapshot rebuilds the filters from scratch.
        if !self.seen_data && !selection.records.is_empty() {
            log::debug!("First snapshot from {:?}; resetting filters", selection.source);
            self.seen_data = true;
            self.clear_filters();
        }

        if self.search.poll(now) {
            log::debug!("Search settled on '{}'", self.search.settled());
        }
        self.filters.search = self.search.settled().clone();

        let unique = dedup_by_symbol(selection.records);
        let filtered = apply_filters(&unique, &self.filters, favorites, &self.sectors);

        let (rows, pages, window) = match self.layout {
            Layout::Paged => {
                let identity = self.list_identity(&filtered);
                self.paginator.sync(filtered.len(), identity);
                let rows = filtered[self.paginator.range()].to_vec();
                let pages = PageView {
                    current_page: self.paginator.current_page(),
                    total_pages: self.paginator.total_pages(),
                    tokens: self.paginator.page_tokens(self.config.page_siblings),
                };
                (rows, Some(pages), None)
            }
            Layout::Virtual => {
                let slice = self.window.slice(self.scroll_offset, filtered.len());
                let rows = filtered[slice.range.clone()].to_vec();
                (rows, None, Some(slice))
            }
        };

        BoardFrame {
            source: selection.source,
            total_records: unique.len(),
            filtered_records: filtered.len(),
            rows,
            pages,
            window,
            banner: selection.error.map(|e| e.to_string()),
            empty: unique.is_empty(),
        }
    }

    /// Filter inputs plus symbol membership: a change here sends the user
    /// back to page 1. Price ticks and live re-sorts only clamp.
    fn list_identity(&self, filtered: &[PriceRecord]) -> u64 {
        use std::hash::{Hash, Hasher};

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        list_fingerprint(filtered).hash(&mut hasher);
        self.filters.search.hash(&mut hasher);
        self.filters.sort.hash(&mut hasher);
        self.filters.favorites_only.hash(&mut hasher);
        self.filters.sector.hash(&mut hasher);
        self.filters.price_range.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use std::time::Duration;

    fn feed(n: usize) -> FeedState {
        let mut state = FeedState::default();
        state.apply_snapshot(
            (0..n)
                .map(|i| PriceRecord {
                    symbol: format!("S{i:03}"),
                    current_price: 1.0 + i as f64,
                    volume: (n - i) as f64,
                    ..Default::default()
                })
                .collect(),
        );
        state
    }

    fn board() -> BoardView {
        BoardView::new(BoardConfig::default(), SectorMap::default())
    }

    #[test]
    fn paged_frame_shows_first_page() {
        let mut view = board();
        let frame = view.refresh(&FeedState::default(), &feed(45), &FavoritesSet::new(), Instant::now());

        assert_eq!(frame.source, SourceKind::Poll);
        assert_eq!(frame.rows.len(), 20);
        assert_eq!(frame.rows[0].symbol, "S000");
        let pages = frame.pages.unwrap();
        assert_eq!((pages.current_page, pages.total_pages), (1, 3));
        assert!(!frame.empty);
    }

    #[test]
    fn price_tick_keeps_page_but_filter_change_resets() {
        let mut view = board();
        let favorites = FavoritesSet::new();
        let now = Instant::now();

        view.refresh(&FeedState::default(), &feed(45), &favorites, now);
        view.go_to_page(3);
        let frame = view.refresh(&FeedState::default(), &feed(45), &favorites, now);
        assert_eq!(frame.pages.unwrap().current_page, 3);
        assert_eq!(frame.rows.len(), 5);

        view.set_price_range(PriceBucket::Under1k);
        let frame = view.refresh(&FeedState::default(), &feed(45), &favorites, now);
        assert_eq!(frame.pages.unwrap().current_page, 1);
    }

    #[test]
    fn live_reorder_keeps_page() {
        let mut view = board();
        let favorites = FavoritesSet::new();
        let now = Instant::now();

        view.refresh(&FeedState::default(), &feed(45), &favorites, now);
        view.go_to_page(3);

        // Same symbols, volumes flipped: the default volume sort reverses them.
        let mut reordered = feed(45);
        let flipped: Vec<PriceRecord> = reordered
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| PriceRecord {
                volume: (i + 1) as f64,
                ..r.clone()
            })
            .collect();
        reordered.apply_snapshot(flipped);

        let frame = view.refresh(&FeedState::default(), &reordered, &favorites, now);
        assert_eq!(frame.pages.unwrap().current_page, 3);
        assert_eq!(frame.rows[0].symbol, "S004");
    }

    #[test]
    fn duplicates_are_counted_once() {
        let mut poll = feed(3);
        let mut records = (*poll.records).clone();
        records.push(records[0].clone());
        poll.apply_snapshot(records);

        let frame = board().refresh(&FeedState::default(), &poll, &FavoritesSet::new(), Instant::now());
        assert_eq!(frame.total_records, 3);
        assert_eq!(frame.filtered_records, 3);
    }

    #[test]
    fn virtual_layout_windows_rows() {
        let mut view = board();
        view.set_viewport_width(375.0);
        assert_eq!(view.layout(), Layout::Virtual);
        view.set_viewport_height(720.0);
        view.scroll_to(72.0 * 50.0);

        let frame = view.refresh(&feed(500), &FeedState::default(), &FavoritesSet::new(), Instant::now());
        let slice = frame.window.unwrap();
        assert_eq!(slice.range, 45..65);
        assert_eq!(frame.rows.len(), 20);
        assert_eq!(frame.rows[0].symbol, "S045");
        assert_eq!(frame.source, SourceKind::Push);
        assert!(frame.pages.is_none());
    }

    #[test]
    fn search_waits_for_debounce() {
        let mut view = board();
        let favorites = FavoritesSet::new();
        let poll = feed(30);
        let t0 = Instant::now();

        view.refresh(&FeedState::default(), &poll, &favorites, t0);
        view.set_search("s01", t0);

        let frame = view.refresh(&FeedState::default(), &poll, &favorites, t0 + Duration::from_millis(100));
        assert_eq!(frame.filtered_records, 30);

        let frame = view.refresh(&FeedState::default(), &poll, &favorites, t0 + Duration::from_millis(400));
        assert_eq!(frame.filtered_records, 10);

        view.submit_search("s00");
        let frame = view.refresh(&FeedState::default(), &poll, &favorites, t0 + Duration::from_millis(401));
        assert_eq!(frame.filtered_records, 10);
        assert_eq!(view.filters().search, "s00");
    }

    #[test]
    fn first_data_rebuilds_filters() {
        let mut view = board();
        view.set_favorites_only(true);
        view.set_price_range(PriceBucket::AtLeast100k);

        let frame = view.refresh(&FeedState::default(), &FeedState::default(), &FavoritesSet::new(), Instant::now());
        assert!(frame.empty);
        assert!(view.filters().favorites_only);

        let frame = view.refresh(&FeedState::default(), &feed(5), &FavoritesSet::new(), Instant::now());
        assert!(view.filters().is_default());
        assert_eq!(frame.filtered_records, 5);

        // Later snapshots leave user filters alone.
        view.set_price_range(PriceBucket::Under1k);
        view.refresh(&FeedState::default(), &feed(6), &FavoritesSet::new(), Instant::now());
        assert_eq!(view.filters().price_range, PriceBucket::Under1k);

        view.reset_filters();
        assert!(view.filters().is_default());
    }

    #[test]
    fn banner_carries_error_without_blanking() {
        let mut poll = feed(4);
        poll.apply_error(FeedError::Parse("received HTML instead of JSON".into()));

        let frame = board().refresh(&FeedState::default(), &poll, &FavoritesSet::new(), Instant::now());
        assert_eq!(frame.rows.len(), 4);
        assert_eq!(frame.banner.as_deref(), Some("Parsing error: received HTML instead of JSON"));
    }
}
