#![forbid(unsafe_code)]

//! The native rendering surface seam.
//!
//! All native manipulation goes through [`NativeAdapter`]; the core never
//! assumes a concrete rendering API. A browser backend implements this
//! trait over real platform handles, while [`HeadlessAdapter`] backs
//! server rendering, static generation, and tests with plain in-memory
//! bookkeeping.
//!
//! Adapter failures are not retried by this layer; they propagate to
//! whoever supplied the adapter.

use std::collections::HashMap;
use std::fmt;

use crate::error::AdapterError;
use crate::id::ElementId;

/// Opaque handle to a native element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Construct from a raw backend value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Token identifying one native listener subscription, returned by
/// [`NativeAdapter::add_listener`] and consumed by
/// [`NativeAdapter::remove_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

impl ListenerToken {
    /// Construct from a raw backend value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Capability to create/query native handles and attach/detach native
/// listeners.
pub trait NativeAdapter {
    /// Human-readable backend name for diagnostics.
    fn name(&self) -> &str;

    /// Create a native handle for a new element of the given kind.
    fn create_handle(&mut self, kind: &str, id: ElementId) -> Result<NativeHandle, AdapterError>;

    /// Set a native attribute on a handle.
    fn set_attribute(
        &mut self,
        handle: NativeHandle,
        name: &str,
        value: &str,
    ) -> Result<(), AdapterError>;

    /// Attach a native listener. One call produces one native
    /// subscription; idempotence per (event, capture, element) triple is
    /// the bridge's responsibility.
    fn add_listener(
        &mut self,
        handle: NativeHandle,
        event: &str,
        capture: bool,
    ) -> Result<ListenerToken, AdapterError>;

    /// Detach a native listener previously attached by `add_listener`.
    fn remove_listener(&mut self, token: ListenerToken) -> Result<(), AdapterError>;

    /// Resolve an element id to its native handle, if the native side
    /// still knows it.
    fn lookup_by_id(&self, id: ElementId) -> Option<NativeHandle>;
}

#[derive(Debug, Clone)]
struct HandleRecord {
    kind: String,
    attributes: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct ListenerRecord {
    handle: NativeHandle,
    event: String,
    capture: bool,
}

/// In-memory adapter backing server rendering, static generation, and
/// tests.
///
/// Handles and listener tokens are allocated from monotonic counters, so
/// construction is as deterministic as the element ids layered above it.
#[derive(Debug, Default)]
pub struct HeadlessAdapter {
    handles: HashMap<NativeHandle, HandleRecord>,
    by_id: HashMap<ElementId, NativeHandle>,
    listeners: HashMap<ListenerToken, ListenerRecord>,
    next_handle: u64,
    next_token: u64,
}

impl HeadlessAdapter {
    /// Create an empty headless adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back an attribute previously set on a handle.
    #[must_use]
    pub fn attribute(&self, handle: NativeHandle, name: &str) -> Option<&str> {
        self.handles
            .get(&handle)
            .and_then(|rec| rec.attributes.get(name))
            .map(String::as_str)
    }

    /// The element kind a handle was created for.
    #[must_use]
    pub fn kind_of(&self, handle: NativeHandle) -> Option<&str> {
        self.handles.get(&handle).map(|rec| rec.kind.as_str())
    }

    /// Number of live native subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of live native subscriptions on one handle.
    #[must_use]
    pub fn listeners_on(&self, handle: NativeHandle) -> usize {
        self.listeners
            .values()
            .filter(|rec| rec.handle == handle)
            .count()
    }

    /// Whether a subscription for (handle, event, capture) is live.
    #[must_use]
    pub fn has_listener(&self, handle: NativeHandle, event: &str, capture: bool) -> bool {
        self.listeners
            .values()
            .any(|rec| rec.handle == handle && rec.event == event && rec.capture == capture)
    }

    /// Number of handles created over the adapter's lifetime.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }
}

impl NativeAdapter for HeadlessAdapter {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_handle(&mut self, kind: &str, id: ElementId) -> Result<NativeHandle, AdapterError> {
        let handle = NativeHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(
            handle,
            HandleRecord {
                kind: kind.to_owned(),
                attributes: HashMap::new(),
            },
        );
        self.by_id.insert(id, handle);
        Ok(handle)
    }

    fn set_attribute(
        &mut self,
        handle: NativeHandle,
        name: &str,
        value: &str,
    ) -> Result<(), AdapterError> {
        let rec = self
            .handles
            .get_mut(&handle)
            .ok_or(AdapterError::UnknownHandle(handle))?;
        rec.attributes.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn add_listener(
        &mut self,
        handle: NativeHandle,
        event: &str,
        capture: bool,
    ) -> Result<ListenerToken, AdapterError> {
        if !self.handles.contains_key(&handle) {
            return Err(AdapterError::UnknownHandle(handle));
        }
        let token = ListenerToken::from_raw(self.next_token);
        self.next_token += 1;
        self.listeners.insert(
            token,
            ListenerRecord {
                handle,
                event: event.to_owned(),
                capture,
            },
        );
        Ok(token)
    }

    fn remove_listener(&mut self, token: ListenerToken) -> Result<(), AdapterError> {
        self.listeners
            .remove(&token)
            .map(|_| ())
            .ok_or(AdapterError::UnknownListener(token))
    }

    fn lookup_by_id(&self, id: ElementId) -> Option<NativeHandle> {
        self.by_id
            .get(&id)
            .copied()
            .filter(|handle| self.handles.contains_key(handle))
    }
}
