#![forbid(unsafe_code)]

//! Elements and their watched property slots.

use std::collections::HashMap;

use crate::adapter::NativeHandle;
use crate::id::ElementId;
use crate::value::Value;

/// Category of a watched property slot.
///
/// Together with a key string this addresses one mutable slot on an
/// element. The set is closed; the wire names below appear in encoded
/// state history blobs and unknown names are rejected at decode time,
/// like unknown value tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotCategory {
    /// Native attributes, mirrored to the rendering surface.
    Attribute,
    /// Framework-level properties with no native mirror.
    Property,
    /// Inline style entries.
    Style,
    /// Navigation history state.
    History,
}

impl SlotCategory {
    /// The stable wire name for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attribute => "attr",
            Self::Property => "prop",
            Self::Style => "style",
            Self::History => "history",
        }
    }

    /// Resolve a wire name back to a category. Returns `None` outside the
    /// closed set.
    #[must_use]
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "attr" => Some(Self::Attribute),
            "prop" => Some(Self::Property),
            "style" => Some(Self::Style),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

/// One node of the element tree.
///
/// Parent exclusively owns children and the tree is acyclic; both are
/// enforced by the tree's mutation entry points, not re-checked here.
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    kind: String,
    handle: NativeHandle,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    slots: HashMap<(SlotCategory, String), Value>,
}

impl Element {
    /// Create an element. Called by the registry during tree construction.
    #[must_use]
    pub fn new(
        id: ElementId,
        kind: impl Into<String>,
        handle: NativeHandle,
        parent: Option<ElementId>,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            handle,
            parent,
            children: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// This element's id.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// The element kind tag (e.g. `div`, `button`, `window`).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The opaque native handle backing this element.
    #[must_use]
    pub const fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// The owning parent, `None` for the window element.
    #[must_use]
    pub const fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Child ids in document order.
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Read a slot value.
    #[must_use]
    pub fn slot(&self, category: SlotCategory, key: &str) -> Option<&Value> {
        self.slots.get(&(category, key.to_owned()))
    }

    /// Write a slot value, returning the previous one. This is the raw
    /// storage write; recording and watcher invocation happen in the
    /// tree's interceptor.
    pub fn write_slot(&mut self, category: SlotCategory, key: &str, value: Value) -> Option<Value> {
        self.slots.insert((category, key.to_owned()), value)
    }

    /// Iterate all populated slots.
    pub fn slots(&self) -> impl Iterator<Item = (&(SlotCategory, String), &Value)> {
        self.slots.iter()
    }

    /// Number of populated slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Append a child id. Called by the owning tree; parent exclusively
    /// owns children.
    pub fn push_child(&mut self, child: ElementId) {
        self.children.push(child);
    }

    /// Detach a child id. Called by the owning tree.
    pub fn remove_child(&mut self, child: ElementId) {
        self.children.retain(|c| *c != child);
    }
}
