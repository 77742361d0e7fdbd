//! Incremental `text/event-stream` framing.
//!
//! Bytes go in as they arrive off the socket; complete events come out.
//! Chunk boundaries may fall anywhere, including inside a UTF-8 sequence,
//! so lines are only decoded once their terminator has been seen.

use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `event:` field; `None` means the default `message` type.
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

/// Upper bound on buffered bytes: an unterminated line plus the `data` lines
/// of an event not yet dispatched.
pub const MAX_PENDING_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no newline.
    scanned: usize,
    event: Option<String>,
    data: Vec<String>,
    data_bytes: usize,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every event it completed.
    ///
    /// Fails once more than [`MAX_PENDING_BYTES`] pile up without completing
    /// an event; the decoder is reset and the stream should be dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, FeedError> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut line_start = 0;
        for i in self.scanned..self.buf.len() {
            if self.buf[i] != b'\n' {
                continue;
            }
            let mut end = i;
            if end > line_start && self.buf[end - 1] == b'\r' {
                end -= 1;
            }
            let line = String::from_utf8_lossy(&self.buf[line_start..end]).into_owned();
            line_start = i + 1;
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        self.buf.drain(..line_start);
        self.scanned = self.buf.len();

        let pending = self.buf.len() + self.data_bytes;
        if pending > MAX_PENDING_BYTES {
            *self = Self::default();
            return Err(FeedError::Parse(format!(
                "event exceeds {MAX_PENDING_BYTES} bytes without a terminator"
            )));
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data_bytes += value.len();
                self.data.push(value.to_string());
            }
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // `retry` and unknown fields are ignored; the adapter owns its schedule.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        self.data_bytes = 0;
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            data,
            id: self.id.clone(),
        })
    }
}
