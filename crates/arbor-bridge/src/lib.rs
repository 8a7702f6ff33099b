#![forbid(unsafe_code)]

//! Bridge: native occurrences in, synthetic events out.
//!
//! The bridge subscribes to native events through the adapter seam,
//! resolves targets against the tree's registry, builds synthetic events,
//! and dispatches them synchronously to registered handlers. Dispatch
//! runs to completion — including every mutation-triggered watcher
//! callback — before control returns to the native caller, so the
//! mutation recorder observes a complete, ordered view of one event's
//! side effects before the next can be processed.

pub mod bridge;
pub mod error;
mod extract;

pub use bridge::{DispatchOutcome, EventBridge, Subscription};
pub use error::{BridgeError, HandlerError};
