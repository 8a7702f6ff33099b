#![forbid(unsafe_code)]

//! `text/event-stream` frame encoding.

use std::fmt::Write as _;

/// One server-sent event frame.
///
/// Serialized as
/// `event: <name>\ndata: <payload>\nid: <id>\nretry: <ms>\n\n`.
/// Multi-line payloads emit one `data:` line per payload line, per the
/// event-stream format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    /// Event name.
    pub event: String,
    /// Payload.
    pub data: String,
    /// Monotonic message id.
    pub id: u64,
    /// Client retry interval in milliseconds.
    pub retry_ms: u64,
}

impl SseMessage {
    /// Create a message.
    #[must_use]
    pub fn new(event: impl Into<String>, data: impl Into<String>, id: u64, retry_ms: u64) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id,
            retry_ms,
        }
    }

    /// Encode the wire frame, including the terminating blank line.
    #[must_use]
    pub fn to_frame(&self) -> String {
        let mut frame = String::with_capacity(self.event.len() + self.data.len() + 48);
        let _ = writeln!(frame, "event: {}", self.event);
        for line in self.data.split('\n') {
            let _ = writeln!(frame, "data: {line}");
        }
        let _ = writeln!(frame, "id: {}", self.id);
        let _ = writeln!(frame, "retry: {}", self.retry_ms);
        frame.push('\n');
        frame
    }
}
