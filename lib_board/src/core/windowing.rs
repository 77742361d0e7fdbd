//! # Windowing Stage
//!
//! Two interchangeable ways to show a slice of the filtered list:
//!
//! - **`Paginator`**: fixed-size pages with an ellipsis-compressed page bar.
//! - **`VirtualWindow`**: a scroll-derived index range with overscan, for
//!   rendering only the rows near the viewport.
//!
//! Both count the list only after `dedup_by_symbol`, because upstream feeds
//! have been seen repeating an id within one snapshot.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use crate::models::PriceRecord;

/// Keeps the first record for each symbol, preserving order.
pub fn dedup_by_symbol(records: &[PriceRecord]) -> Vec<PriceRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|r| seen.insert(r.symbol.as_str()))
        .cloned()
        .collect()
}

/// Identity of a list for "did the list change" checks: which symbols are
/// in it, regardless of order. Price updates and re-sorts keep the same
/// fingerprint.
pub fn list_fingerprint(records: &[PriceRecord]) -> u64 {
    let mut symbols: Vec<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
    symbols.sort_unstable();

    let mut hasher = DefaultHasher::new();
    symbols.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(usize),
    Ellipsis,
}

#[derive(Debug, Clone)]
pub struct Paginator {
    page_size: usize,
    current_page: usize,
    total_items: usize,
    fingerprint: Option<u64>,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_items: 0,
            fingerprint: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// `ceil(n / page_size)`; zero for an empty list.
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    /// Updates the item count. A different list identity resets to page 1;
    /// the current page is always clamped into `[1, max(1, total_pages)]`.
    pub fn sync(&mut self, total_items: usize, fingerprint: u64) {
        self.total_items = total_items;
        if self.fingerprint != Some(fingerprint) {
            self.fingerprint = Some(fingerprint);
            self.current_page = 1;
        }
        self.current_page = self.current_page.clamp(1, self.last_page());
    }

    pub fn go_to(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.last_page());
    }

    pub fn next(&mut self) {
        self.go_to(self.current_page.saturating_add(1));
    }

    pub fn prev(&mut self) {
        self.go_to(self.current_page.saturating_sub(1));
    }

    /// Index range of the current page within a list of `total_items`.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    /// The page bar: first and last page always, the current page with
    /// `siblings` neighbours each side, and one ellipsis per collapsed gap.
    /// A gap of exactly one page shows that page instead of an ellipsis.
    pub fn page_tokens(&self, siblings: usize) -> Vec<PageToken> {
        let total = self.total_pages();
        if total == 0 {
            return Vec::new();
        }

        let lo = self.current_page.saturating_sub(siblings).max(1);
        let hi = (self.current_page + siblings).min(total);

        let mut pages: Vec<usize> = Vec::with_capacity(hi - lo + 3);
        pages.push(1);
        pages.extend(lo..=hi);
        pages.push(total);
        pages.sort_unstable();
        pages.dedup();

        let mut tokens = Vec::with_capacity(pages.len() + 2);
        let mut prev: Option<usize> = None;
        for page in pages {
            if let Some(p) = prev {
                match page - p {
                    1 => {}
                    2 => tokens.push(PageToken::Page(p + 1)),
                    _ => tokens.push(PageToken::Ellipsis),
                }
            }
            tokens.push(PageToken::Page(page));
            prev = Some(page);
        }
        tokens
    }
}

/// Scroll-position windowing over fixed-height rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualWindow {
    pub item_height: f64,
    pub viewport_height: f64,
    pub overscan: usize,
}

/// What the renderer needs for one virtualized frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSlice {
    pub range: Range<usize>,
    /// Transform offset for the first rendered row.
    pub offset_px: f64,
    /// Height of the full-list spacer that keeps the scrollbar honest.
    pub total_height_px: f64,
}

impl VirtualWindow {
    pub fn new(item_height: f64, viewport_height: f64, overscan: usize) -> Self {
        Self {
            item_height,
            viewport_height,
            overscan,
        }
    }

    /// `[floor(offset/h) - overscan, ceil((offset+viewport)/h) + overscan)`
    /// clamped to `[0, n]`.
    pub fn visible_range(&self, scroll_offset: f64, n: usize) -> Range<usize> {
        if n == 0 || !(self.item_height > 0.0) {
            return 0..0;
        }
        let offset = if scroll_offset.is_finite() { scroll_offset.max(0.0) } else { 0.0 };
        let viewport = self.viewport_height.max(0.0);

        let first = (offset / self.item_height).floor() as usize;
        let last = ((offset + viewport) / self.item_height).ceil() as usize;

        let start = first.saturating_sub(self.overscan).min(n);
        let end = last.saturating_add(self.overscan).min(n);
        start..end.max(start)
    }

    pub fn slice(&self, scroll_offset: f64, n: usize) -> VirtualSlice {
        let range = self.visible_range(scroll_offset, n);
        VirtualSlice {
            offset_px: range.start as f64 * self.item_height,
            total_height_px: n as f64 * self.item_height,
            range,
        }
    }
}
