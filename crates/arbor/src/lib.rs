#![forbid(unsafe_code)]

//! Arbor public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from internal crates and offers a lightweight
//! prelude for day-to-day usage.

// --- Core re-exports -------------------------------------------------------

pub use arbor_core::{
    AdapterError, Element, ElementId, ElementRegistry, EventDetail, EventKind, HeadlessAdapter,
    KeyboardDetail, ListenerToken, Modifiers, MouseDetail, NativeAdapter, NativeHandle,
    NativeOccurrence, NativeTargetRef, Phase, RawKeyboard, RawMouse, Route, RouteError,
    RouteTable, Router, RunMode, SlotCategory, SyntheticEvent, Value, ValueKind,
};

// --- Sync re-exports -------------------------------------------------------

pub use arbor_sync::{
    HistoryError, MutationRecord, MutationRecorder, ReplayError, STATE_BLOCK_ID, StaticPage,
    Tree, TreeError, decode_blob, embed_block, encode_records, extract_block, generate_routes,
    hydrate, replay, snapshot,
};

// --- Bridge re-exports -----------------------------------------------------

pub use arbor_bridge::{BridgeError, DispatchOutcome, EventBridge, HandlerError, Subscription};

// --- Devserver re-exports --------------------------------------------------

#[cfg(feature = "devserver")]
pub use arbor_devserver::{ReloadConfig, ReloadDebouncer, SseMessage};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    //! Common imports for Arbor applications.

    pub use crate::{
        DispatchOutcome, ElementId, EventBridge, HandlerError, HeadlessAdapter, NativeAdapter,
        NativeOccurrence, NativeTargetRef, RunMode, SlotCategory, SyntheticEvent, Tree, Value,
        hydrate, snapshot,
    };

    pub use crate::{bridge, core, sync};
}

pub use arbor_bridge as bridge;
pub use arbor_core as core;
#[cfg(feature = "devserver")]
pub use arbor_devserver as devserver;
pub use arbor_sync as sync;
