#![forbid(unsafe_code)]

//! Core error types.

use std::fmt;

use crate::adapter::{ListenerToken, NativeHandle};
use crate::id::ElementId;

/// Errors produced by a native adapter.
///
/// These are never retried by the synchronization core; they propagate to
/// whoever supplied the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The native surface is not accessible.
    Unavailable(String),
    /// A handle was not recognized by the backend.
    UnknownHandle(NativeHandle),
    /// A listener token was not recognized by the backend.
    UnknownListener(ListenerToken),
    /// No native node exists for this element id.
    UnknownElement(ElementId),
    /// Backend-specific failure.
    Backend(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "native surface unavailable: {msg}"),
            Self::UnknownHandle(handle) => write!(f, "unknown native handle {handle}"),
            Self::UnknownListener(token) => {
                write!(f, "unknown listener token {}", token.raw())
            }
            Self::UnknownElement(id) => write!(f, "no native node for element {id}"),
            Self::Backend(msg) => write!(f, "native backend error: {msg}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Errors produced by the route seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No registered route matches the path.
    NoMatch(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch(path) => write!(f, "no route matches `{path}`"),
        }
    }
}

impl std::error::Error for RouteError {}
