//! # REST Polling Ingestor
//!
//! Fetches the full ticker list on a fixed interval. Transient failures are
//! retried inside one cycle by the client's middleware; what survives the
//! retries is published as the feed error while the last good snapshot stays
//! on screen. A permanent failure stops the loop for good.

use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::configs::PollConfig;
use crate::error::FeedError;
use crate::ingestors::handle::{publish_closed, publish_phase, FeedHandle};
use crate::ingestors::payload::decode_rest_payload;
use crate::models::{FeedState, PriceRecord, StreamPhase};
use crate::retrieve::ApiClient;

pub struct PollAdapter {
    config: PollConfig,
}

impl PollAdapter {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Starts polling on the current tokio runtime.
    pub fn spawn(self) -> FeedHandle {
        let (tx, rx) = watch::channel(FeedState::default());
        let cancel = CancellationToken::new();
        let wake = Arc::new(Notify::new());

        let task = tokio::spawn(self.run(tx, cancel.clone(), Arc::clone(&wake)));
        FeedHandle::new(rx, cancel, wake, task)
    }

    async fn run(self, tx: watch::Sender<FeedState>, cancel: CancellationToken, wake: Arc<Notify>) {
        let client = match ApiClient::new(self.config.request_timeout, &self.config.user_agent, &self.config.retry) {
            Ok(client) => client,
            Err(e) => {
                log::error!("Poll feed disabled: {}", e);
                tx.send_modify(|s| s.apply_error(e));
                publish_closed(&tx);
                return;
            }
        };

        log::info!("Polling {} every {:?}", self.config.url, self.config.interval);

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = wake.notified() => {
                    log::debug!("Poll requested out of schedule");
                    ticker.reset();
                }
            }

            publish_phase(&tx, StreamPhase::Connecting);

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.poll_once(&client) => outcome,
            };

            match outcome {
                Ok(records) => {
                    log::debug!("Poll returned {} records", records.len());
                    tx.send_modify(|s| {
                        s.apply_snapshot(records);
                        s.phase = StreamPhase::Open;
                    });
                }
                Err(e) if !e.is_retryable() => {
                    log::error!("Poll feed stopped on permanent error: {}", e);
                    tx.send_modify(|s| s.apply_error(e));
                    break;
                }
                Err(e) => {
                    log::warn!("Poll failed, keeping last snapshot: {}", e);
                    tx.send_modify(|s| {
                        s.apply_error(e);
                        s.phase = StreamPhase::Reconnecting;
                    });
                }
            }
        }

        publish_closed(&tx);
        log::info!("Poll feed for {} closed", self.config.url);
    }

    async fn poll_once(&self, client: &ApiClient) -> Result<Vec<PriceRecord>, FeedError> {
        let body = client.get_text(&self.config.url).await?;
        decode_rest_payload(&body)
    }
}
