#![forbid(unsafe_code)]

//! The element tree and its single mutation interceptor.
//!
//! Every mutation entry point funnels through [`Tree::set_slot`]: the
//! write is applied, mirrored to the native surface where the category
//! calls for it, recorded while capture is armed, and only then are
//! watcher callbacks run. Watchers receive `&mut Tree` and may mutate
//! further; those nested writes re-enter the same interceptor, so the
//! log's order is the true causal application order.
//!
//! A tree is single-threaded and owned by exactly one execution context
//! (one browser page, one server request, one static-generation pass).
//! Isolation between concurrent trees is structural, not lock-based.

use std::collections::HashMap;
use std::rc::Rc;

use arbor_core::{
    Element, ElementId, ElementRegistry, NativeAdapter, NativeHandle, RunMode, SlotCategory, Value,
};

use crate::error::TreeError;
use crate::recorder::{MutationRecord, MutationRecorder};

/// Callback invoked after a watched slot changes.
pub type WatcherFn = dyn Fn(&mut Tree, &Value);

type WatchKey = (ElementId, SlotCategory, String);

/// An element tree bound to a native rendering surface.
pub struct Tree {
    registry: ElementRegistry,
    adapter: Box<dyn NativeAdapter>,
    recorder: MutationRecorder,
    watchers: HashMap<WatchKey, Vec<Rc<WatcherFn>>>,
    mode: RunMode,
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("mode", &self.mode)
            .field("elements", &self.registry.len())
            .field("watchers", &self.watchers.len())
            .field("recorded", &self.recorder.len())
            .finish()
    }
}

impl Tree {
    /// Create a tree over the given adapter, seeding the window element.
    ///
    /// # Errors
    ///
    /// Propagates the adapter failure if the window handle cannot be
    /// created.
    pub fn new(mut adapter: Box<dyn NativeAdapter>, mode: RunMode) -> Result<Self, TreeError> {
        let mut registry = ElementRegistry::new();
        let handle = adapter.create_handle("window", ElementId::WINDOW)?;
        registry.seed_window(handle);
        Ok(Self {
            registry,
            adapter,
            recorder: MutationRecorder::new(),
            watchers: HashMap::new(),
            mode,
        })
    }

    /// The execution mode this tree runs under.
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// The window element's id.
    #[must_use]
    pub const fn window(&self) -> ElementId {
        ElementId::WINDOW
    }

    /// The element registry.
    #[must_use]
    pub const fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// The native adapter, for bridge registration and release.
    pub fn adapter_mut(&mut self) -> &mut dyn NativeAdapter {
        self.adapter.as_mut()
    }

    /// Borrow the adapter immutably.
    #[must_use]
    pub fn adapter(&self) -> &dyn NativeAdapter {
        self.adapter.as_ref()
    }

    // --- Construction seam -------------------------------------------------

    /// Create an element of `kind` under `parent`.
    ///
    /// Ids come from the registry's deterministic counter: identical
    /// construction sequences yield identical ids in every environment.
    ///
    /// # Errors
    ///
    /// Fails if the parent is unknown or the adapter refuses the handle.
    pub fn create_element(&mut self, kind: &str, parent: ElementId) -> Result<ElementId, TreeError> {
        if !self.registry.contains(parent) {
            return Err(TreeError::UnknownElement(parent));
        }
        let id = self.registry.allocate();
        let handle = self.adapter.create_handle(kind, id)?;
        self.registry.insert(Element::new(id, kind, handle, Some(parent)));
        if let Some(parent_el) = self.registry.get_mut(parent) {
            parent_el.push_child(id);
        }
        Ok(id)
    }

    /// Detach an element and its whole subtree, dropping watchers for the
    /// removed ids. Native listener subscriptions held by the bridge are
    /// released by the bridge's sweep.
    ///
    /// # Errors
    ///
    /// Fails for the window element or an unknown id.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), TreeError> {
        if id.is_window() {
            return Err(TreeError::RemoveWindow);
        }
        if !self.registry.contains(id) {
            return Err(TreeError::UnknownElement(id));
        }

        let mut doomed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(el) = self.registry.get(current) {
                stack.extend_from_slice(el.children());
            }
            doomed.push(current);
        }

        let parent = self.registry.get(id).and_then(Element::parent);
        if let Some(parent) = parent
            && let Some(parent_el) = self.registry.get_mut(parent)
        {
            parent_el.remove_child(id);
        }

        for dead in doomed {
            self.registry.remove(dead);
            self.watchers.retain(|(watched, _, _), _| *watched != dead);
        }
        Ok(())
    }

    /// Whether an element is live in this tree.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.registry.contains(id)
    }

    /// The native handle backing an element.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id.
    pub fn handle_of(&self, id: ElementId) -> Result<NativeHandle, TreeError> {
        self.registry
            .get(id)
            .map(Element::handle)
            .ok_or(TreeError::UnknownElement(id))
    }

    // --- Mutation interceptor ----------------------------------------------

    /// Write a slot value. This is the single transactional interceptor:
    /// apply, mirror, record, then run watchers (which may re-enter).
    ///
    /// # Errors
    ///
    /// Fails for an unknown element; adapter failures while mirroring an
    /// attribute propagate unretried.
    pub fn set_slot(
        &mut self,
        id: ElementId,
        category: SlotCategory,
        key: &str,
        value: Value,
    ) -> Result<(), TreeError> {
        let handle = {
            let el = self
                .registry
                .get_mut(id)
                .ok_or(TreeError::UnknownElement(id))?;
            el.write_slot(category, key, value.clone());
            el.handle()
        };

        if category == SlotCategory::Attribute
            && let Some(text) = value.to_attribute_string()
        {
            self.adapter.set_attribute(handle, key, &text)?;
        }

        self.recorder.append(id, category, key, value.clone());

        let watchers = self
            .watchers
            .get(&(id, category, key.to_owned()))
            .cloned()
            .unwrap_or_default();
        for watcher in watchers {
            watcher(self, &value);
        }
        Ok(())
    }

    /// Read a slot value.
    #[must_use]
    pub fn slot(&self, id: ElementId, category: SlotCategory, key: &str) -> Option<&Value> {
        self.registry.get(id).and_then(|el| el.slot(category, key))
    }

    /// Register a watcher on a slot. Watchers run synchronously inside the
    /// interceptor, after the write is applied and recorded.
    ///
    /// # Errors
    ///
    /// Fails for an unknown element.
    pub fn watch(
        &mut self,
        id: ElementId,
        category: SlotCategory,
        key: &str,
        watcher: impl Fn(&mut Tree, &Value) + 'static,
    ) -> Result<(), TreeError> {
        if !self.registry.contains(id) {
            return Err(TreeError::UnknownElement(id));
        }
        self.watchers
            .entry((id, category, key.to_owned()))
            .or_default()
            .push(Rc::new(watcher));
        Ok(())
    }

    // --- Capture -----------------------------------------------------------

    /// Arm mutation capture.
    pub fn capture(&mut self) {
        self.recorder.capture();
    }

    /// Disarm mutation capture without touching the log.
    pub fn disarm(&mut self) {
        self.recorder.disarm();
    }

    /// Whether capture is armed.
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.recorder.is_armed()
    }

    /// Discard the captured log and reset the sequence counter.
    pub fn clear_history(&mut self) {
        self.recorder.clear();
    }

    /// The captured mutation records, in causal order.
    #[must_use]
    pub fn records(&self) -> &[MutationRecord] {
        self.recorder.records()
    }

    /// The recorder, for inspection.
    #[must_use]
    pub const fn recorder(&self) -> &MutationRecorder {
        &self.recorder
    }

    /// Replace the recorder configuration (e.g. a custom high-water mark).
    /// Only meaningful before capture starts.
    pub fn set_recorder(&mut self, recorder: MutationRecorder) {
        self.recorder = recorder;
    }

    // --- Replay and fallback support ---------------------------------------

    /// Apply a replayed record: raw write plus native mirroring, without
    /// recording and without firing watchers. Watcher side effects present
    /// at capture time exist in the log as later records; re-firing them
    /// here would double them.
    pub(crate) fn apply_replayed(&mut self, record: &MutationRecord) -> Result<(), TreeError> {
        let handle = {
            let el = self
                .registry
                .get_mut(record.target)
                .ok_or(TreeError::UnknownElement(record.target))?;
            el.write_slot(record.category, &record.key, record.value.clone());
            el.handle()
        };
        if record.category == SlotCategory::Attribute
            && let Some(text) = record.value.to_attribute_string()
        {
            self.adapter.set_attribute(handle, &record.key, &text)?;
        }
        Ok(())
    }

    /// Replace the entire visible content with a minimal fallback notice.
    ///
    /// Used by the bridge when a handler fails: capture is disarmed (the
    /// tree no longer mirrors the captured history), all window children
    /// are detached, and a single `notice` element carries the message.
    /// The caller is expected to force a full rebuild afterwards.
    ///
    /// # Errors
    ///
    /// Propagates adapter failure while building the notice element.
    pub fn replace_with_fallback(&mut self, notice: &str) -> Result<ElementId, TreeError> {
        self.recorder.disarm();

        let children: Vec<ElementId> = self.registry.window().children().to_vec();
        for child in children {
            self.remove_element(child)?;
        }

        let id = self.create_element("notice", ElementId::WINDOW)?;
        if let Some(el) = self.registry.get_mut(id) {
            el.write_slot(SlotCategory::Property, "text", Value::from(notice));
        }
        Ok(id)
    }

    /// Observable state of this tree: every live element id with its kind
    /// and sorted slot values. Two trees are observably equal exactly when
    /// these listings are equal.
    #[must_use]
    pub fn observable_state(&self) -> Vec<(ElementId, String, Vec<(String, String, String)>)> {
        let mut out = Vec::with_capacity(self.registry.len());
        for id in self.registry.sorted_ids() {
            let el = match self.registry.get(id) {
                Some(el) => el,
                None => continue,
            };
            let mut slots: Vec<(String, String, String)> = el
                .slots()
                .map(|((cat, key), value)| {
                    (cat.as_str().to_owned(), key.clone(), format!("{value:?}"))
                })
                .collect();
            slots.sort();
            out.push((id, el.kind().to_owned(), slots));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::HeadlessAdapter;
    use std::cell::RefCell;

    fn tree() -> Tree {
        Tree::new(Box::new(HeadlessAdapter::new()), RunMode::Browser).unwrap()
    }

    #[test]
    fn construction_is_deterministic() {
        let build = |tree: &mut Tree| {
            let root = tree.create_element("div", ElementId::WINDOW).unwrap();
            let a = tree.create_element("button", root).unwrap();
            let b = tree.create_element("input", root).unwrap();
            (root, a, b)
        };
        let mut one = tree();
        let mut two = tree();
        assert_eq!(build(&mut one), build(&mut two));
    }

    /// Adapter wrapper that records every `set_attribute` call, so tests
    /// can observe native mirroring through the seam.
    struct ProbeAdapter {
        inner: HeadlessAdapter,
        attribute_writes: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl NativeAdapter for ProbeAdapter {
        fn name(&self) -> &str {
            "probe"
        }

        fn create_handle(
            &mut self,
            kind: &str,
            id: ElementId,
        ) -> Result<NativeHandle, arbor_core::AdapterError> {
            self.inner.create_handle(kind, id)
        }

        fn set_attribute(
            &mut self,
            handle: NativeHandle,
            name: &str,
            value: &str,
        ) -> Result<(), arbor_core::AdapterError> {
            self.attribute_writes
                .borrow_mut()
                .push((name.to_owned(), value.to_owned()));
            self.inner.set_attribute(handle, name, value)
        }

        fn add_listener(
            &mut self,
            handle: NativeHandle,
            event: &str,
            capture: bool,
        ) -> Result<arbor_core::ListenerToken, arbor_core::AdapterError> {
            self.inner.add_listener(handle, event, capture)
        }

        fn remove_listener(
            &mut self,
            token: arbor_core::ListenerToken,
        ) -> Result<(), arbor_core::AdapterError> {
            self.inner.remove_listener(token)
        }

        fn lookup_by_id(&self, id: ElementId) -> Option<NativeHandle> {
            self.inner.lookup_by_id(id)
        }
    }

    #[test]
    fn set_slot_stores_and_mirrors_attributes() {
        let writes = Rc::new(RefCell::new(Vec::new()));
        let adapter = ProbeAdapter {
            inner: HeadlessAdapter::new(),
            attribute_writes: Rc::clone(&writes),
        };
        let mut t = Tree::new(Box::new(adapter), RunMode::Browser).unwrap();
        let id = t.create_element("a", ElementId::WINDOW).unwrap();
        t.set_slot(id, SlotCategory::Attribute, "href", Value::from("/home"))
            .unwrap();

        assert_eq!(
            t.slot(id, SlotCategory::Attribute, "href").and_then(Value::as_str),
            Some("/home")
        );
        assert_eq!(
            writes.borrow().as_slice(),
            &[("href".to_owned(), "/home".to_owned())]
        );
    }

    #[test]
    fn properties_are_not_mirrored() {
        let mut t = tree();
        let id = t.create_element("input", ElementId::WINDOW).unwrap();
        t.set_slot(id, SlotCategory::Property, "value", Value::from("x"))
            .unwrap();
        assert_eq!(
            t.slot(id, SlotCategory::Property, "value").and_then(Value::as_str),
            Some("x")
        );
    }

    #[test]
    fn set_slot_on_unknown_element_fails() {
        let mut t = tree();
        let err = t
            .set_slot(
                ElementId::from_raw(99),
                SlotCategory::Property,
                "x",
                Value::from(1.0),
            )
            .unwrap_err();
        assert!(matches!(err, TreeError::UnknownElement(_)));
    }

    #[test]
    fn capture_records_in_causal_order() {
        let mut t = tree();
        let id = t.create_element("div", ElementId::WINDOW).unwrap();
        t.capture();
        t.set_slot(id, SlotCategory::Property, "a", Value::from(1.0)).unwrap();
        t.set_slot(id, SlotCategory::Property, "b", Value::from(2.0)).unwrap();

        let keys: Vec<_> = t.records().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(t.records()[0].seq, 0);
        assert_eq!(t.records()[1].seq, 1);
    }

    #[test]
    fn nested_watcher_mutations_record_in_causal_order() {
        let mut t = tree();
        let id = t.create_element("div", ElementId::WINDOW).unwrap();
        t.watch(id, SlotCategory::Property, "count", move |tree, value| {
            let doubled = value.as_num().unwrap_or(0.0) * 2.0;
            tree.set_slot(id, SlotCategory::Property, "doubled", Value::from(doubled))
                .expect("nested write succeeds");
        })
        .unwrap();

        t.capture();
        t.set_slot(id, SlotCategory::Property, "count", Value::from(3.0)).unwrap();

        let keys: Vec<_> = t.records().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["count", "doubled"]);
        assert_eq!(
            t.slot(id, SlotCategory::Property, "doubled").and_then(Value::as_num),
            Some(6.0)
        );
    }

    #[test]
    fn watcher_fires_after_write_is_visible() {
        let mut t = tree();
        let id = t.create_element("div", ElementId::WINDOW).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let seen_in = Rc::clone(&seen);
        t.watch(id, SlotCategory::Property, "x", move |tree, _| {
            *seen_in.borrow_mut() = tree
                .slot(id, SlotCategory::Property, "x")
                .and_then(Value::as_num);
        })
        .unwrap();

        t.set_slot(id, SlotCategory::Property, "x", Value::from(7.0)).unwrap();
        assert_eq!(*seen.borrow(), Some(7.0));
    }

    #[test]
    fn remove_element_detaches_subtree_and_watchers() {
        let mut t = tree();
        let root = t.create_element("div", ElementId::WINDOW).unwrap();
        let child = t.create_element("span", root).unwrap();
        t.watch(child, SlotCategory::Property, "x", |_, _| {}).unwrap();

        t.remove_element(root).unwrap();
        assert!(!t.contains(root));
        assert!(!t.contains(child));
        assert!(t.watchers.is_empty());
        assert!(t.registry().window().children().is_empty());
    }

    #[test]
    fn window_cannot_be_removed() {
        let mut t = tree();
        assert!(matches!(
            t.remove_element(ElementId::WINDOW),
            Err(TreeError::RemoveWindow)
        ));
    }

    #[test]
    fn fallback_replaces_content_and_disarms() {
        let mut t = tree();
        let root = t.create_element("div", ElementId::WINDOW).unwrap();
        t.capture();
        t.set_slot(root, SlotCategory::Property, "x", Value::from(1.0)).unwrap();

        let notice = t.replace_with_fallback("something went wrong").unwrap();
        assert!(!t.is_capturing());
        assert!(!t.contains(root));
        assert_eq!(t.registry().window().children(), &[notice]);
        assert_eq!(
            t.slot(notice, SlotCategory::Property, "text").and_then(Value::as_str),
            Some("something went wrong")
        );
        // The fallback write itself is not in the log.
        assert_eq!(t.records().len(), 1);
    }

    #[test]
    fn observable_state_equality() {
        let build = |t: &mut Tree| {
            let root = t.create_element("div", ElementId::WINDOW).unwrap();
            t.set_slot(root, SlotCategory::Attribute, "class", Value::from("main"))
                .unwrap();
        };
        let mut a = tree();
        let mut b = tree();
        build(&mut a);
        build(&mut b);
        assert_eq!(a.observable_state(), b.observable_state());

        b.set_slot(
            ElementId::from_raw(1),
            SlotCategory::Property,
            "extra",
            Value::from(true),
        )
        .unwrap();
        assert_ne!(a.observable_state(), b.observable_state());
    }
}
