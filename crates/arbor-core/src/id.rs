#![forbid(unsafe_code)]

//! Element identifiers.

use std::fmt;

/// Identifier of an element within one tree instance.
///
/// Ids are allocated by the owning [`ElementRegistry`](crate::ElementRegistry)
/// from a monotonic counter, so identical construction sequences in
/// different environments yield identical ids — the property hydration
/// replay depends on. An id is only meaningful relative to its owning
/// registry; it is never resolved against another tree instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// The window/global singleton element, seeded into every registry.
    pub const WINDOW: Self = Self(0);

    /// Construct an id from its raw numeric form. Used when decoding a
    /// state history blob; everywhere else ids come from the registry.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric form, as written into state history blobs.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved window id.
    #[must_use]
    pub const fn is_window(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
