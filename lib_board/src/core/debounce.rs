use std::time::{Duration, Instant};

/// A value that only "settles" after it has stopped changing for `delay`.
///
/// The clock is passed in so the board can drive it from its own refresh
/// loop and tests can drive it deterministically.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
        }
    }

    /// Records a new raw value at `now`. Setting the settled value again
    /// cancels any pending change.
    pub fn set(&mut self, value: T, now: Instant) {
        if value == self.settled {
            self.pending = None;
        } else {
            self.pending = Some((value, now));
        }
    }

    /// Promotes the pending value once it is old enough. Returns `true` when
    /// the settled value changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending.take() {
            Some((value, since)) if now.saturating_duration_since(since) >= self.delay => {
                self.settled = value;
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Bypasses the delay (explicit submit or reset).
    pub fn flush(&mut self, value: T) {
        self.pending = None;
        self.settled = value;
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
