#![forbid(unsafe_code)]

//! Sync error types.

use std::fmt;

use arbor_core::{AdapterError, ElementId};

/// Errors produced by tree mutation entry points.
#[derive(Debug)]
pub enum TreeError {
    /// The element id is not live in this tree.
    UnknownElement(ElementId),
    /// The window element cannot be removed.
    RemoveWindow,
    /// A native adapter operation failed; propagated unretried.
    Adapter(AdapterError),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement(id) => write!(f, "unknown element {id}"),
            Self::RemoveWindow => write!(f, "the window element cannot be removed"),
            Self::Adapter(err) => write!(f, "adapter error: {err}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Adapter(err) => Some(err),
            Self::UnknownElement(_) | Self::RemoveWindow => None,
        }
    }
}

impl From<AdapterError> for TreeError {
    fn from(err: AdapterError) -> Self {
        Self::Adapter(err)
    }
}

/// Errors produced while encoding or decoding a state history blob.
///
/// Decoding never coerces: an unrecognized value tag or category name is a
/// hard failure, handled by callers exactly like a replay mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The blob is not valid base64/JSON or violates the envelope shape.
    Malformed(String),
    /// The envelope's format version is not supported.
    UnsupportedVersion(u32),
    /// A value tag outside the closed set.
    UnknownTag(String),
    /// A slot category name outside the closed set.
    UnknownCategory(String),
    /// A number with no finite wire representation.
    NonFiniteNumber { seq: u64 },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed state blob: {msg}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported state blob format version {version}")
            }
            Self::UnknownTag(tag) => write!(f, "unknown value tag `{tag}`"),
            Self::UnknownCategory(name) => write!(f, "unknown slot category `{name}`"),
            Self::NonFiniteNumber { seq } => {
                write!(f, "record {seq} carries a non-finite number")
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Errors produced by replay. Replay is atomic: any error means zero
/// records were applied, and the caller must discard the log and force a
/// full rebuild of the affected tree.
#[derive(Debug)]
pub enum ReplayError {
    /// A record references an element id absent from the current tree.
    UnknownElement {
        /// Sequence number of the offending record.
        seq: u64,
        /// The unresolvable id.
        id: ElementId,
    },
    /// The blob could not be decoded.
    History(HistoryError),
    /// A tree operation failed mid-apply; the caller must rebuild.
    Tree(TreeError),
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement { seq, id } => {
                write!(f, "replay record {seq} targets unknown element {id}")
            }
            Self::History(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "replay aborted: {err}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::History(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::UnknownElement { .. } => None,
        }
    }
}

impl From<HistoryError> for ReplayError {
    fn from(err: HistoryError) -> Self {
        Self::History(err)
    }
}

impl From<TreeError> for ReplayError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}
