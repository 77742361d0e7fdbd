//! # Source Selector
//!
//! Chooses which adapter's snapshot the board renders. The push feed wins
//! whenever it has data; otherwise the poll feed is used. Pure and stateless,
//! re-evaluated on every refresh.

use crate::error::FeedError;
use crate::models::{FeedState, PriceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Event-stream feed.
    Push,
    /// REST polling fallback.
    Poll,
}

#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub source: SourceKind,
    pub records: &'a [PriceRecord],
    /// Banner for this selection: the selected source's error, or the push
    /// error while the poll fallback is carrying the board.
    pub error: Option<&'a FeedError>,
}

pub fn select_snapshot<'a>(push: &'a FeedState, poll: &'a FeedState) -> Selection<'a> {
    if push.has_data() {
        Selection {
            source: SourceKind::Push,
            records: push.records.as_slice(),
            error: push.error.as_ref(),
        }
    } else {
        Selection {
            source: SourceKind::Poll,
            records: poll.records.as_slice(),
            error: poll.error.as_ref().or(push.error.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(symbols: &[&str]) -> FeedState {
        let mut state = FeedState::default();
        state.apply_snapshot(
            symbols
                .iter()
                .map(|s| PriceRecord {
                    symbol: s.to_string(),
                    current_price: 1.0,
                    ..Default::default()
                })
                .collect(),
        );
        state
    }

    #[test]
    fn push_wins_when_non_empty() {
        let push = state(&["BTC"]);
        for poll in [state(&[]), state(&["ETH", "XRP"])] {
            let sel = select_snapshot(&push, &poll);
            assert_eq!(sel.source, SourceKind::Push);
            assert_eq!(sel.records, push.records.as_slice());
        }
    }

    #[test]
    fn falls_back_to_poll_and_keeps_push_error_visible() {
        let mut push = FeedState::default();
        push.apply_error(FeedError::Transient("stream closed".into()));
        let poll = state(&["ETH"]);

        let sel = select_snapshot(&push, &poll);
        assert_eq!(sel.source, SourceKind::Poll);
        assert_eq!(sel.records.len(), 1);
        assert_eq!(sel.error, Some(&FeedError::Transient("stream closed".into())));
    }

    #[test]
    fn both_empty_selects_empty_poll() {
        let push = FeedState::default();
        let poll = FeedState::default();
        let sel = select_snapshot(&push, &poll);
        assert_eq!(sel.source, SourceKind::Poll);
        assert!(sel.records.is_empty());
        assert!(sel.error.is_none());
    }
}
