//! # Event-Stream Ingestor
//!
//! Holds one `text/event-stream` connection open and publishes a snapshot per
//! `data` payload. The connection lifecycle is an explicit state machine:
//!
//! ```text
//! Idle -> Connecting -> Open -> Reconnecting -> Connecting -> ...
//!             \           \
//!              `-----------`--> Closed   (cancelled, or permanent error)
//! ```
//!
//! Any transport error, server-side close or idle timeout goes through
//! `Reconnecting`: the error is published, one fixed delay is waited out,
//! and exactly one new attempt is made.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

use crate::configs::PushConfig;
use crate::error::FeedError;
use crate::ingestors::handle::{publish_closed, publish_phase, FeedHandle};
use crate::ingestors::payload::decode_stream_payload;
use crate::ingestors::sse::{SseDecoder, SseEvent};
use crate::models::{FeedState, StreamPhase};
use crate::retrieve::ky_http::{classify_reqwest, open_event_stream, stream_client};

/// Why a read loop returned.
enum StreamEnd {
    Cancelled,
    /// Caller asked for a fresh connection; skip the delay.
    Restart,
    Lost(FeedError),
}

pub struct PushAdapter {
    config: PushConfig,
}

impl PushAdapter {
    pub fn new(config: PushConfig) -> Self {
        Self { config }
    }

    /// Starts the connection loop on the current tokio runtime.
    pub fn spawn(self) -> FeedHandle {
        let (tx, rx) = watch::channel(FeedState::default());
        let cancel = CancellationToken::new();
        let wake = Arc::new(Notify::new());

        let task = tokio::spawn(self.run(tx, cancel.clone(), Arc::clone(&wake)));
        FeedHandle::new(rx, cancel, wake, task)
    }

    async fn run(self, tx: watch::Sender<FeedState>, cancel: CancellationToken, wake: Arc<Notify>) {
        let client = match stream_client(self.config.connect_timeout, &self.config.user_agent) {
            Ok(client) => client,
            Err(e) => {
                log::error!("Push feed disabled: {}", e);
                tx.send_modify(|s| s.apply_error(e));
                publish_closed(&tx);
                return;
            }
        };

        loop {
            publish_phase(&tx, StreamPhase::Connecting);
            log::info!("Connecting to event stream: {}", self.config.url);

            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                attempt = open_event_stream(&client, &self.config.url) => attempt,
            };

            let lost = match attempt {
                Err(e) if !e.is_retryable() => {
                    log::error!("Event stream rejected permanently: {}", e);
                    tx.send_modify(|s| s.apply_error(e));
                    break;
                }
                Err(e) => e,
                Ok(response) => {
                    log::info!("Event stream open.");
                    tx.send_modify(|s| {
                        s.connected = true;
                        s.error = None;
                        s.phase = StreamPhase::Open;
                    });

                    match self.read_stream(response, &tx, &cancel, &wake).await {
                        StreamEnd::Cancelled => break,
                        StreamEnd::Restart => {
                            log::info!("Reconnect requested; reopening event stream.");
                            tx.send_modify(|s| s.connected = false);
                            continue;
                        }
                        StreamEnd::Lost(e) => e,
                    }
                }
            };

            log::warn!("Event stream lost: {}. Reconnecting in {:?}...", lost, self.config.reconnect_delay);
            tx.send_modify(|s| {
                s.apply_error(lost);
                s.phase = StreamPhase::Reconnecting;
            });

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = wake.notified() => {}
            }
        }

        publish_closed(&tx);
        log::info!("Event stream for {} closed", self.config.url);
    }

    async fn read_stream(
        &self,
        response: reqwest::Response,
        tx: &watch::Sender<FeedState>,
        cancel: &CancellationToken,
        wake: &Notify,
    ) -> StreamEnd {
        let mut bytes = std::pin::pin!(response.bytes_stream());
        let mut decoder = SseDecoder::new();

        loop {
            // Re-armed on every chunk, so it only fires after a silent stretch.
            let watchdog = idle_watchdog(self.config.idle_timeout);

            tokio::select! {
                _ = cancel.cancelled() => return StreamEnd::Cancelled,
                _ = wake.notified() => return StreamEnd::Restart,
                silence = watchdog => {
                    return StreamEnd::Lost(FeedError::Transient(format!(
                        "no data for {}s, treating stream as stale",
                        silence.as_secs()
                    )));
                }
                chunk = bytes.next() => match chunk {
                    Some(Ok(chunk)) => match decoder.push(&chunk) {
                        Ok(events) => events.into_iter().for_each(|event| handle_event(event, tx)),
                        Err(e) => return StreamEnd::Lost(e),
                    },
                    Some(Err(e)) => return StreamEnd::Lost(classify_reqwest(e)),
                    None => {
                        return StreamEnd::Lost(FeedError::Transient("stream closed by remote host".to_string()));
                    }
                }
            }
        }
    }
}

/// Resolves after `timeout` of silence, or never when the watchdog is off.
async fn idle_watchdog(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(timeout) => {
            tokio::time::sleep(timeout).await;
            timeout
        }
        None => std::future::pending().await,
    }
}

/// Only default `message` events carry snapshots; named events such as
/// heartbeats are logged and skipped.
fn is_message(event: &SseEvent) -> bool {
    event.event.as_deref().map_or(true, |name| name == "message")
}

fn handle_event(event: SseEvent, tx: &watch::Sender<FeedState>) {
    if !is_message(&event) {
        log::debug!("Skipping '{}' event", event.event.as_deref().unwrap_or_default());
        return;
    }

    match decode_stream_payload(&event.data) {
        Ok(records) => {
            log::debug!("Stream event {:?} carried {} records", event.id, records.len());
            tx.send_modify(|s| {
                s.apply_snapshot(records);
                s.phase = StreamPhase::Open;
            });
        }
        Err(e) => {
            // The stream itself is fine; keep it open and keep the last snapshot.
            log::warn!("Dropping undecodable stream payload: {}", e);
            tx.send_modify(|s| s.error = Some(e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: Option<&str>, data: &str) -> SseEvent {
        SseEvent {
            event: name.map(str::to_string),
            data: data.to_string(),
            id: None,
        }
    }

    #[test]
    fn named_events_leave_state_alone() {
        let (tx, rx) = watch::channel(FeedState::default());

        handle_event(event(None, r#"[{"symbol":"BTC","currentPrice":1.0}]"#), &tx);
        handle_event(event(Some("heartbeat"), "ping"), &tx);

        let state = rx.borrow();
        assert_eq!(state.records.len(), 1);
        assert!(state.error.is_none());
    }

    #[test]
    fn explicit_message_events_are_decoded() {
        let (tx, rx) = watch::channel(FeedState::default());
        handle_event(event(Some("message"), r#"[{"symbol":"ETH","currentPrice":2.0}]"#), &tx);
        assert_eq!(rx.borrow().records[0].symbol, "ETH");
    }
}
