use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{FeedState, StreamPhase};

/// Owner of a running adapter task.
///
/// Dropping the handle cancels the task; `shutdown` also waits for it.
pub struct FeedHandle {
    state: watch::Receiver<FeedState>,
    cancel: CancellationToken,
    wake: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub(crate) fn new(
        state: watch::Receiver<FeedState>,
        cancel: CancellationToken,
        wake: Arc<Notify>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            state,
            cancel,
            wake,
            task: Some(task),
        }
    }

    /// A receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Snapshot of the latest published state.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Asks the adapter to act now: the push feed drops its stream and
    /// reconnects without waiting, the poll feed polls immediately.
    pub fn reconnect(&self) {
        self.wake.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancels the adapter and waits for its task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Feed task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Final state every adapter publishes on its way out.
pub(crate) fn publish_closed(tx: &watch::Sender<FeedState>) {
    tx.send_modify(|s| {
        s.connected = false;
        s.phase = StreamPhase::Closed;
    });
}

pub(crate) fn publish_phase(tx: &watch::Sender<FeedState>, phase: StreamPhase) {
    tx.send_modify(|s| s.phase = phase);
}
