#![forbid(unsafe_code)]

//! Bridge error types.

use std::fmt;

use arbor_core::{AdapterError, ElementId};

/// Errors produced by bridge registration and release.
#[derive(Debug)]
pub enum BridgeError {
    /// The listening element is not live in the tree.
    UnknownElement(ElementId),
    /// A single-use unsubscription capability was invoked twice. This is a
    /// caller bug and fails loudly rather than being silently ignored.
    DoubleUnsubscribe,
    /// A native adapter operation failed; propagated unretried.
    Adapter(AdapterError),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement(id) => write!(f, "cannot listen on unknown element {id}"),
            Self::DoubleUnsubscribe => {
                write!(f, "unsubscribe capability was already spent")
            }
            Self::Adapter(err) => write!(f, "adapter error: {err}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Adapter(err) => Some(err),
            Self::UnknownElement(_) | Self::DoubleUnsubscribe => None,
        }
    }
}

impl From<AdapterError> for BridgeError {
    fn from(err: AdapterError) -> Self {
        Self::Adapter(err)
    }
}

/// A failure raised inside an event handler.
///
/// Handler failures never propagate past the bridge: the dispatch that
/// raised one is abandoned, the visible tree is replaced with a fallback
/// notice, and the host process continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler failed: {}", self.message)
    }
}

impl std::error::Error for HandlerError {}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert!(
            BridgeError::DoubleUnsubscribe
                .to_string()
                .contains("already spent")
        );
        assert_eq!(
            HandlerError::from("boom").to_string(),
            "handler failed: boom"
        );
    }
}
