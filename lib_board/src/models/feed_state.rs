use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::FeedError;
use crate::models::PriceRecord;

/// Lifecycle of a data-source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    /// Created, not started.
    #[default]
    Idle,
    /// Request in flight.
    Connecting,
    /// Receiving data.
    Open,
    /// Waiting out the delay before the next attempt.
    Reconnecting,
    /// Cancelled, or stopped on a permanent error.
    Closed,
}

/// What an adapter publishes after every change.
///
/// `records` is replaced as a whole on each snapshot; the `Arc` lets readers
/// hold on to an old snapshot while the adapter publishes a new one.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub records: Arc<Vec<PriceRecord>>,
    pub connected: bool,
    pub error: Option<FeedError>,
    pub last_updated: Option<DateTime<Utc>>,
    pub phase: StreamPhase,
}

impl FeedState {
    pub fn has_data(&self) -> bool {
        !self.records.is_empty()
    }

    /// Installs a fresh snapshot and marks the source healthy.
    pub fn apply_snapshot(&mut self, records: Vec<PriceRecord>) {
        self.records = Arc::new(records);
        self.connected = true;
        self.error = None;
        self.last_updated = Some(Utc::now());
    }

    /// Records a failure. The last good snapshot stays in place.
    pub fn apply_error(&mut self, error: FeedError) {
        self.connected = false;
        self.error = Some(error);
    }
}
