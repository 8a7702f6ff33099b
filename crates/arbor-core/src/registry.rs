#![forbid(unsafe_code)]

//! Per-tree element registry.
//!
//! One registry is owned by exactly one tree instance and dies with it —
//! never a process-wide singleton, so concurrent trees (one per
//! server-rendered request) cannot collide. Id allocation is a plain
//! monotonic counter: identical construction sequences yield identical
//! ids, which is the precondition for hydration replay.

use std::collections::HashMap;

use crate::adapter::NativeHandle;
use crate::element::Element;
use crate::id::ElementId;

/// Id → element lookup scoped to one tree instance.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    elements: HashMap<ElementId, Element>,
    next_id: u64,
}

impl ElementRegistry {
    /// Create an empty registry. The window element is seeded by the tree
    /// once the adapter has produced its handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            // Id 0 is reserved for the window element.
            next_id: 1,
        }
    }

    /// Seed the reserved window element. Must be called exactly once,
    /// before any other insertion.
    pub fn seed_window(&mut self, handle: NativeHandle) {
        debug_assert!(self.elements.is_empty(), "window must be seeded first");
        self.elements.insert(
            ElementId::WINDOW,
            Element::new(ElementId::WINDOW, "window", handle, None),
        );
    }

    /// Allocate the next deterministic id. Ids are never reused within a
    /// registry, including after element removal.
    pub fn allocate(&mut self) -> ElementId {
        let id = ElementId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an element under its own id.
    pub fn insert(&mut self, element: Element) {
        self.elements.insert(element.id(), element);
    }

    /// Remove an element, returning it.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        self.elements.remove(&id)
    }

    /// Look up an element by id.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Whether an element is live in this registry.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// The window element.
    ///
    /// # Panics
    ///
    /// Panics if the window has not been seeded; trees seed it during
    /// construction, so this is unreachable through the public API.
    #[must_use]
    pub fn window(&self) -> &Element {
        self.elements
            .get(&ElementId::WINDOW)
            .expect("registry window element is seeded at tree construction")
    }

    /// Number of live elements, including the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the registry holds no elements at all (window not seeded).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate live elements in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Ids of all live elements, sorted. Useful for observable-state
    /// comparison in tests and diagnostics.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<_> = self.elements.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
