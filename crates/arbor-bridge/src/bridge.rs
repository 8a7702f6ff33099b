#![forbid(unsafe_code)]

//! Listener registration and synchronous dispatch.
//!
//! # Invariants
//!
//! - Exactly one native subscription exists per distinct
//!   (event name, capture, element) triple; re-registration is idempotent
//!   and stacks handlers on the existing subscription.
//! - Dispatch is synchronous and runs to completion before returning to
//!   the native caller; there is no reentrant dispatch into the same tree
//!   (handlers receive the tree, not the bridge).
//! - A handler failure is caught here: the dispatch is abandoned, the
//!   visible content is replaced with a fallback notice, and the bridge
//!   stays fully operational for subsequent events.
//! - An unresolvable target drops the event with a diagnostic; it is
//!   never surfaced as an error.

use std::collections::HashMap;
use std::rc::Rc;

use arbor_core::{ElementId, EventKind, NativeOccurrence, NativeTargetRef, Phase, SyntheticEvent};
use arbor_sync::Tree;

use crate::error::{BridgeError, HandlerError};
use crate::extract::extract;

/// Handler signature: handlers mutate the tree through its interceptor
/// and report failure as a value, never by unwinding.
pub type Handler = dyn Fn(&mut Tree, &SyntheticEvent) -> Result<(), HandlerError>;

type RegistrationKey = (String, bool, ElementId);

struct Registration {
    token: arbor_core::ListenerToken,
    handlers: Vec<(u64, Rc<Handler>)>,
}

/// Outcome of dispatching one native occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handlers ran to completion.
    Dispatched {
        /// Number of handler invocations.
        handlers: usize,
    },
    /// The target resolved but nothing listens for this event on it.
    NoHandlers,
    /// The occurrence could not be mapped to a live element; dropped.
    Dropped,
    /// A handler failed; the tree now shows the fallback notice.
    HandlerFailed,
}

/// Single-use capability to detach one handler registration.
///
/// Obtained from [`EventBridge::listen`]; spent by
/// [`EventBridge::unsubscribe`]. Spending it twice is a caller error that
/// fails loudly.
#[derive(Debug)]
pub struct Subscription {
    event: String,
    capture: bool,
    element: ElementId,
    handler_id: u64,
    detached: bool,
}

impl Subscription {
    /// The event name this subscription listens for.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// The listening element.
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }

    /// Whether the capability has been spent.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Translates native occurrences into synthetic events and dispatches
/// them to registered handlers.
pub struct EventBridge {
    registrations: HashMap<RegistrationKey, Registration>,
    next_handler_id: u64,
    fallback_notice: String,
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

impl EventBridge {
    /// Create a bridge with the default fallback notice.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            next_handler_id: 0,
            fallback_notice: "something went wrong".to_owned(),
        }
    }

    /// Override the fallback notice shown after a handler failure.
    #[must_use]
    pub fn with_fallback_notice(mut self, notice: impl Into<String>) -> Self {
        self.fallback_notice = notice.into();
        self
    }

    /// Number of live native subscriptions held by this bridge.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registrations.len()
    }

    /// Attach a handler for `event` on `element`.
    ///
    /// The first registration for a (event, capture, element) triple
    /// attaches one native listener through the adapter; further
    /// registrations reuse it.
    ///
    /// # Errors
    ///
    /// Fails for an unknown element or an adapter refusal.
    pub fn listen<H>(
        &mut self,
        tree: &mut Tree,
        element: ElementId,
        event: &str,
        capture: bool,
        handler: H,
    ) -> Result<Subscription, BridgeError>
    where
        H: Fn(&mut Tree, &SyntheticEvent) -> Result<(), HandlerError> + 'static,
    {
        let handle = tree
            .handle_of(element)
            .map_err(|_| BridgeError::UnknownElement(element))?;

        let key: RegistrationKey = (event.to_owned(), capture, element);
        let registration = match self.registrations.entry(key) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let token = tree.adapter_mut().add_listener(handle, event, capture)?;
                entry.insert(Registration {
                    token,
                    handlers: Vec::new(),
                })
            }
        };

        let handler_id = self.next_handler_id;
        self.next_handler_id += 1;
        registration.handlers.push((handler_id, Rc::new(handler)));

        Ok(Subscription {
            event: event.to_owned(),
            capture,
            element,
            handler_id,
            detached: false,
        })
    }

    /// Spend an unsubscription capability: detach the handler and, when it
    /// was the last one on its triple, release the native listener.
    ///
    /// A subscription whose registration was already released by a sweep
    /// (its element left the tree) spends cleanly. Spending the same
    /// capability twice is [`BridgeError::DoubleUnsubscribe`].
    ///
    /// # Errors
    ///
    /// `DoubleUnsubscribe` on a spent capability; adapter failures while
    /// detaching the native listener propagate.
    pub fn unsubscribe(
        &mut self,
        tree: &mut Tree,
        subscription: &mut Subscription,
    ) -> Result<(), BridgeError> {
        if subscription.detached {
            return Err(BridgeError::DoubleUnsubscribe);
        }
        subscription.detached = true;

        let key: RegistrationKey = (
            subscription.event.clone(),
            subscription.capture,
            subscription.element,
        );
        let Some(registration) = self.registrations.get_mut(&key) else {
            // Already released when its element left the tree.
            return Ok(());
        };
        registration
            .handlers
            .retain(|(id, _)| *id != subscription.handler_id);

        if registration.handlers.is_empty() {
            let token = registration.token;
            self.registrations.remove(&key);
            tree.adapter_mut().remove_listener(token)?;
        }
        Ok(())
    }

    /// Release registrations whose elements are no longer in the tree.
    ///
    /// Called after element removal (and after a fallback replacement) so
    /// detached elements release their native subscriptions.
    pub fn sweep(&mut self, tree: &mut Tree) {
        let dead: Vec<(RegistrationKey, arbor_core::ListenerToken)> = self
            .registrations
            .iter()
            .filter(|((_, _, element), _)| !tree.contains(*element))
            .map(|(key, registration)| (key.clone(), registration.token))
            .collect();
        for (key, token) in dead {
            self.registrations.remove(&key);
            if let Err(err) = tree.adapter_mut().remove_listener(token) {
                tracing::warn!(
                    target: "arbor.bridge",
                    error = %err,
                    "failed to release native listener during sweep"
                );
            }
        }
    }

    /// Dispatch one native occurrence end-to-end.
    ///
    /// Target and current target are resolved by native-reported id; an
    /// id that cannot be resolved falls back to the window element only
    /// when the native object is the window singleton, otherwise the
    /// event is dropped with a diagnostic.
    pub fn dispatch(&mut self, tree: &mut Tree, occurrence: NativeOccurrence) -> DispatchOutcome {
        let Some(target) = resolve(tree, &occurrence.target) else {
            tracing::debug!(
                target: "arbor.bridge",
                event = %occurrence.name,
                "dropping occurrence with unresolvable target"
            );
            return DispatchOutcome::Dropped;
        };
        let current = occurrence
            .current
            .as_ref()
            .and_then(|reference| resolve(tree, reference))
            .unwrap_or(target);

        let kind = EventKind::resolve(&occurrence.name);
        let (value, detail) = extract(tree, kind, &occurrence, current);
        let native = Rc::new(occurrence);

        let at_target = current == target;
        let phase_sets = [
            (true, if at_target { Phase::AtTarget } else { Phase::Capture }),
            (false, if at_target { Phase::AtTarget } else { Phase::Bubble }),
        ];

        let mut invoked = 0usize;
        for (capture, phase) in phase_sets {
            let key: RegistrationKey = (native.name.clone(), capture, current);
            let handlers: Vec<Rc<Handler>> = match self.registrations.get(&key) {
                Some(registration) => registration
                    .handlers
                    .iter()
                    .map(|(_, handler)| Rc::clone(handler))
                    .collect(),
                None => continue,
            };
            if handlers.is_empty() {
                continue;
            }

            let event = SyntheticEvent::new(
                native.name.clone(),
                kind.bubbles(),
                kind.cancelable(),
                phase,
                target,
                current,
                Rc::clone(&native),
                value.clone(),
                detail.clone(),
            );

            for handler in handlers {
                invoked += 1;
                if let Err(err) = handler(tree, &event) {
                    tracing::error!(
                        target: "arbor.bridge",
                        event = %native.name,
                        element = %current,
                        error = %err,
                        "handler failed; replacing content with fallback notice"
                    );
                    if let Err(fallback_err) = tree.replace_with_fallback(&self.fallback_notice) {
                        tracing::error!(
                            target: "arbor.bridge",
                            error = %fallback_err,
                            "fallback replacement failed"
                        );
                    }
                    self.sweep(tree);
                    return DispatchOutcome::HandlerFailed;
                }
            }
        }

        if invoked == 0 {
            DispatchOutcome::NoHandlers
        } else {
            DispatchOutcome::Dispatched { handlers: invoked }
        }
    }
}

fn resolve(tree: &Tree, reference: &NativeTargetRef) -> Option<ElementId> {
    match reference {
        NativeTargetRef::Element(id) if tree.contains(*id) => Some(*id),
        NativeTargetRef::Window => Some(tree.window()),
        NativeTargetRef::Element(_) | NativeTargetRef::Unknown => None,
    }
}
