#![forbid(unsafe_code)]

//! Change debouncing for the reload channel.
//!
//! A build touching many files produces a burst of change notifications;
//! delivering one reload per file would make clients rebuild mid-write.
//! The debouncer coalesces a burst into exactly one `reload` message,
//! emitted once the stream has been quiet for the debounce window
//! (trailing edge, latest wins).
//!
//! All time-dependent entry points have `*_at(now)` variants so tests are
//! deterministic.

use std::time::{Duration, Instant};

use crate::sse::SseMessage;

/// Configuration for the reload debouncer.
#[derive(Debug, Clone)]
pub struct ReloadConfig {
    /// Quiet period required before a pending burst is delivered.
    pub debounce: Duration,
    /// Client retry interval stamped on every frame.
    pub retry_ms: u64,
    /// Event name stamped on every frame.
    pub event_name: String,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            retry_ms: 1000,
            event_name: "reload".to_owned(),
        }
    }
}

/// Coalesces change notifications into one reload message per burst.
#[derive(Debug)]
pub struct ReloadDebouncer {
    config: ReloadConfig,
    pending_changes: u32,
    deadline: Option<Instant>,
    next_id: u64,
}

impl ReloadDebouncer {
    /// Create a debouncer with the given configuration.
    #[must_use]
    pub fn new(config: ReloadConfig) -> Self {
        Self {
            config,
            pending_changes: 0,
            deadline: None,
            next_id: 0,
        }
    }

    /// Note one detected change now.
    pub fn note_change(&mut self) {
        self.note_change_at(Instant::now());
    }

    /// Note one detected change at a specific time (for testing).
    pub fn note_change_at(&mut self, now: Instant) {
        self.pending_changes += 1;
        self.deadline = Some(now + self.config.debounce);
    }

    /// Poll for a due message now.
    pub fn poll(&mut self) -> Option<SseMessage> {
        self.poll_at(Instant::now())
    }

    /// Poll at a specific time (for testing).
    ///
    /// Returns a message exactly once per settled burst: when changes are
    /// pending and the debounce window has elapsed since the last one.
    pub fn poll_at(&mut self, now: Instant) -> Option<SseMessage> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        let coalesced = self.pending_changes;
        self.pending_changes = 0;
        self.deadline = None;

        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!(
            target: "arbor.devserver",
            coalesced,
            id,
            "delivering reload message"
        );
        Some(SseMessage::new(
            self.config.event_name.clone(),
            coalesced.to_string(),
            id,
            self.config.retry_ms,
        ))
    }

    /// Whether a burst is waiting on its quiet period.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Number of changes coalesced into the pending burst.
    #[must_use]
    pub const fn pending_changes(&self) -> u32 {
        self.pending_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> ReloadDebouncer {
        ReloadDebouncer::new(ReloadConfig::default())
    }

    #[test]
    fn three_changes_in_window_yield_one_message() {
        let mut d = debouncer();
        let start = Instant::now();

        d.note_change_at(start);
        d.note_change_at(start + Duration::from_millis(10));
        d.note_change_at(start + Duration::from_millis(20));

        // Still inside the quiet period of the last change.
        assert!(d.poll_at(start + Duration::from_millis(119)).is_none());

        let message = d.poll_at(start + Duration::from_millis(120)).unwrap();
        assert_eq!(message.event, "reload");
        assert_eq!(message.data, "3");
        assert_eq!(message.id, 0);

        // The burst is spent.
        assert!(d.poll_at(start + Duration::from_millis(500)).is_none());
        assert!(!d.has_pending());
    }

    #[test]
    fn each_change_extends_the_quiet_period() {
        let mut d = debouncer();
        let start = Instant::now();

        d.note_change_at(start);
        // Would have been due at +100ms, but another change lands first.
        d.note_change_at(start + Duration::from_millis(90));
        assert!(d.poll_at(start + Duration::from_millis(100)).is_none());
        assert!(d.poll_at(start + Duration::from_millis(190)).is_some());
    }

    #[test]
    fn separate_bursts_get_increasing_ids() {
        let mut d = debouncer();
        let start = Instant::now();

        d.note_change_at(start);
        let first = d.poll_at(start + Duration::from_millis(100)).unwrap();

        d.note_change_at(start + Duration::from_millis(300));
        let second = d.poll_at(start + Duration::from_millis(400)).unwrap();

        assert_eq!(first.id, 0);
        assert_eq!(second.id, 1);
        assert_eq!(second.data, "1");
    }

    #[test]
    fn poll_without_changes_is_none() {
        let mut d = debouncer();
        assert!(d.poll_at(Instant::now()).is_none());
    }

    #[test]
    fn frame_carries_configured_retry() {
        let mut d = ReloadDebouncer::new(ReloadConfig {
            debounce: Duration::from_millis(10),
            retry_ms: 250,
            event_name: "reload".into(),
        });
        let start = Instant::now();
        d.note_change_at(start);
        let message = d.poll_at(start + Duration::from_millis(10)).unwrap();
        assert_eq!(message.retry_ms, 250);
        assert!(message.to_frame().contains("retry: 250\n"));
    }
}
