#![forbid(unsafe_code)]

//! Devserver: the out-of-band reload notification channel.
//!
//! File-change notifications arrive from an external watcher, are
//! coalesced within a debounce window, and leave as `text/event-stream`
//! frames. The channel is fully decoupled from the event bridge; its only
//! effect on the synchronization core is that consumers discard and
//! rebuild their tree when a `reload` message arrives (the in-flight
//! dispatch finishes first — there is no partial cancellation).

pub mod reload;
pub mod sse;

pub use reload::{ReloadConfig, ReloadDebouncer};
pub use sse::SseMessage;
