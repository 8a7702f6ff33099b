#![forbid(unsafe_code)]

//! Core: element tree model, per-tree registry, native adapter seam, and
//! the synthetic event taxonomy.

pub mod adapter;
pub mod element;
pub mod error;
pub mod event;
pub mod id;
pub mod mode;
pub mod registry;
pub mod router;
pub mod value;

pub use adapter::{HeadlessAdapter, ListenerToken, NativeAdapter, NativeHandle};
pub use element::{Element, SlotCategory};
pub use error::{AdapterError, RouteError};
pub use event::{
    EventDetail, EventKind, KeyboardDetail, Modifiers, MouseDetail, NativeOccurrence,
    NativeTargetRef, Phase, RawKeyboard, RawMouse, SyntheticEvent,
};
pub use id::ElementId;
pub use mode::RunMode;
pub use registry::ElementRegistry;
pub use router::{Route, RouteTable, Router};
pub use value::{Value, ValueKind};
