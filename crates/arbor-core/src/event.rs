#![forbid(unsafe_code)]

//! Canonical synthetic event types and native occurrence normalization.
//!
//! This module defines the cross-mode event model shared by live, server,
//! and static execution. Platform glue normalizes whatever its native
//! layer produces into a [`NativeOccurrence`]; the bridge resolves targets
//! and builds a [`SyntheticEvent`] from it.
//!
//! # Design Notes
//!
//! - The event taxonomy is a closed enumeration ([`EventKind`]), resolved
//!   once per native event type name. Each kind owns its payload shape.
//! - Keyboard and mouse details are copied once at construction time — an
//!   immutable snapshot, never lazy reads back into the native layer.
//! - `Modifiers` use bitflags for easy combination.

use std::rc::Rc;

use bitflags::bitflags;

use crate::id::ElementId;
use crate::value::Value;

/// Dispatch phase of a synthetic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Travelling from the root toward the target.
    Capture = 1,
    /// At the target element.
    AtTarget = 2,
    /// Bubbling from the target back toward the root.
    Bubble = 3,
}

bitflags! {
    /// Modifier keys held during a keyboard or mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Alt/Option key.
        const ALT   = 0b0001;
        /// Control key.
        const CTRL  = 0b0010;
        /// Meta/Command key.
        const META  = 0b0100;
        /// Shift key.
        const SHIFT = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Keyboard payload, snapshotted once when the synthetic event is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardDetail {
    /// The logical key value (`"Enter"`, `"a"`, ...).
    pub key: String,
    /// The physical key code (`"KeyA"`, `"Enter"`, ...).
    pub code: String,
    /// Key location (standard, left, right, numpad).
    pub location: u32,
    /// Whether this is an auto-repeat.
    pub repeat: bool,
    /// Whether the key is part of an IME composition.
    pub composing: bool,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

impl KeyboardDetail {
    /// Check if Alt is held.
    #[must_use]
    pub const fn alt_key(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub const fn ctrl_key(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Meta is held.
    #[must_use]
    pub const fn meta_key(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }

    /// Check if Shift is held.
    #[must_use]
    pub const fn shift_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Mouse payload, snapshotted once when the synthetic event is built.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseDetail {
    /// Button that changed state.
    pub button: i16,
    /// Buttons currently held, as a bitmask.
    pub buttons: u16,
    /// Viewport-relative coordinates.
    pub client: (f64, f64),
    /// Document-relative coordinates.
    pub page: (f64, f64),
    /// Screen-relative coordinates.
    pub screen: (f64, f64),
    /// Target-relative coordinates.
    pub offset: (f64, f64),
    /// Delta since the previous mouse event.
    pub movement: (f64, f64),
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// The related element (e.g. the one being left on `mouseover`),
    /// resolved by id through the registry; `None` when unresolvable.
    pub related_target: Option<ElementId>,
}

/// Specialized payload carried by a synthetic event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventDetail {
    /// No specialized payload.
    #[default]
    None,
    /// Keyboard snapshot.
    Keyboard(KeyboardDetail),
    /// Mouse snapshot.
    Mouse(MouseDetail),
}

/// Closed taxonomy of native event types, resolved once per event name.
///
/// Each kind owns its payload extraction; there is no runtime type-switch
/// over native subtypes anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// History navigation (`popstate`, `navigate`).
    Navigation,
    /// Keyboard input (`keydown`, `keyup`, `keypress`).
    Keyboard,
    /// Pointer input (`click`, `mousedown`, ... ).
    Mouse,
    /// Text input (`input`, `change`, `beforeinput`).
    Input,
    /// Everything else; carries generic UI fields only.
    Ui,
}

impl EventKind {
    /// Resolve a native event type name to its kind.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        match name {
            "popstate" | "navigate" | "hashchange" => Self::Navigation,
            "keydown" | "keyup" | "keypress" => Self::Keyboard,
            "click" | "dblclick" | "mousedown" | "mouseup" | "mousemove" | "mouseover"
            | "mouseout" | "mouseenter" | "mouseleave" | "contextmenu" => Self::Mouse,
            "input" | "change" | "beforeinput" => Self::Input,
            _ => Self::Ui,
        }
    }

    /// Whether events of this kind bubble by default.
    #[must_use]
    pub const fn bubbles(self) -> bool {
        match self {
            Self::Navigation => false,
            Self::Keyboard | Self::Mouse | Self::Input | Self::Ui => true,
        }
    }

    /// Whether events of this kind are cancelable by default.
    #[must_use]
    pub const fn cancelable(self) -> bool {
        match self {
            Self::Keyboard | Self::Mouse => true,
            Self::Navigation | Self::Input | Self::Ui => false,
        }
    }
}

/// Reference to a native event participant, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeTargetRef {
    /// A native node annotated with an element id.
    Element(ElementId),
    /// The window/global singleton.
    Window,
    /// A native node the platform could not attribute to any element.
    Unknown,
}

/// Raw keyboard fields as reported by the native layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawKeyboard {
    /// Logical key value.
    pub key: String,
    /// Physical key code.
    pub code: String,
    /// Key location.
    pub location: u32,
    /// Auto-repeat flag.
    pub repeat: bool,
    /// IME composition flag.
    pub composing: bool,
    /// Alt held.
    pub alt: bool,
    /// Ctrl held.
    pub ctrl: bool,
    /// Meta held.
    pub meta: bool,
    /// Shift held.
    pub shift: bool,
}

impl RawKeyboard {
    /// Collapse the raw modifier booleans into a flag set.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::NONE;
        if self.alt {
            mods |= Modifiers::ALT;
        }
        if self.ctrl {
            mods |= Modifiers::CTRL;
        }
        if self.meta {
            mods |= Modifiers::META;
        }
        if self.shift {
            mods |= Modifiers::SHIFT;
        }
        mods
    }
}

/// Raw mouse fields as reported by the native layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMouse {
    /// Button that changed state.
    pub button: i16,
    /// Held-buttons bitmask.
    pub buttons: u16,
    /// Viewport-relative coordinates.
    pub client: (f64, f64),
    /// Document-relative coordinates.
    pub page: (f64, f64),
    /// Screen-relative coordinates.
    pub screen: (f64, f64),
    /// Target-relative coordinates.
    pub offset: (f64, f64),
    /// Delta since the previous mouse event.
    pub movement: (f64, f64),
    /// Related native node, if the platform reported one.
    pub related: Option<NativeTargetRef>,
    /// Alt held.
    pub alt: bool,
    /// Ctrl held.
    pub ctrl: bool,
    /// Meta held.
    pub meta: bool,
    /// Shift held.
    pub shift: bool,
}

impl RawMouse {
    /// Collapse the raw modifier booleans into a flag set.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::NONE;
        if self.alt {
            mods |= Modifiers::ALT;
        }
        if self.ctrl {
            mods |= Modifiers::CTRL;
        }
        if self.meta {
            mods |= Modifiers::META;
        }
        if self.shift {
            mods |= Modifiers::SHIFT;
        }
        mods
    }
}

/// A native input occurrence, normalized by platform glue before it
/// reaches the bridge.
///
/// This plays the role crossterm's event type plays for a terminal
/// backend: one canonical shape the rest of the system consumes, however
/// the platform actually reported it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeOccurrence {
    /// Native event type name (`click`, `keydown`, `popstate`, ...).
    pub name: String,
    /// The reported target.
    pub target: NativeTargetRef,
    /// The reported current target; defaults to the target when absent.
    pub current: Option<NativeTargetRef>,
    /// Raw keyboard fields, when the occurrence carries them.
    pub keyboard: Option<RawKeyboard>,
    /// Raw mouse fields, when the occurrence carries them.
    pub mouse: Option<RawMouse>,
    /// Current path, for navigation occurrences.
    pub path: Option<String>,
    /// Serialized history blob accompanying a navigation occurrence.
    pub history: Option<String>,
    /// Generic UI detail counter.
    pub detail: Option<f64>,
    /// Legacy `which` field.
    pub which: Option<u32>,
    /// Inserted text, for input occurrences.
    pub data: Option<String>,
    /// Input type name, for input occurrences.
    pub input_type: Option<String>,
}

impl Default for NativeTargetRef {
    fn default() -> Self {
        Self::Unknown
    }
}

impl NativeOccurrence {
    /// Create a bare occurrence with a name and target.
    #[must_use]
    pub fn new(name: impl Into<String>, target: NativeTargetRef) -> Self {
        Self {
            name: name.into(),
            target,
            ..Self::default()
        }
    }

    /// Convenience constructor for a keydown occurrence.
    #[must_use]
    pub fn keydown(target: NativeTargetRef, key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            keyboard: Some(RawKeyboard {
                key: key.into(),
                code: code.into(),
                ..RawKeyboard::default()
            }),
            ..Self::new("keydown", target)
        }
    }

    /// Convenience constructor for a click occurrence.
    #[must_use]
    pub fn click(target: NativeTargetRef, x: f64, y: f64) -> Self {
        Self {
            mouse: Some(RawMouse {
                client: (x, y),
                page: (x, y),
                ..RawMouse::default()
            }),
            ..Self::new("click", target)
        }
    }

    /// Convenience constructor for a navigation occurrence.
    #[must_use]
    pub fn navigation(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new("popstate", NativeTargetRef::Window)
        }
    }

    /// Set the raw keyboard fields.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: RawKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Set the raw mouse fields.
    #[must_use]
    pub fn with_mouse(mut self, mouse: RawMouse) -> Self {
        self.mouse = Some(mouse);
        self
    }

    /// Attach a serialized history blob to a navigation occurrence.
    #[must_use]
    pub fn with_history(mut self, blob: impl Into<String>) -> Self {
        self.history = Some(blob.into());
        self
    }

    /// Set the reported current target.
    #[must_use]
    pub fn with_current(mut self, current: NativeTargetRef) -> Self {
        self.current = Some(current);
        self
    }
}

/// A synthetic event delivered to handlers.
///
/// All fields are populated at construction; keyboard and mouse details
/// are immutable snapshots of the native payload.
#[derive(Debug, Clone)]
pub struct SyntheticEvent {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    phase: Phase,
    target: ElementId,
    current_target: ElementId,
    native: Rc<NativeOccurrence>,
    value: Value,
    detail: EventDetail,
}

impl SyntheticEvent {
    /// Assemble a synthetic event. Called by the bridge once per dispatch.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: impl Into<String>,
        bubbles: bool,
        cancelable: bool,
        phase: Phase,
        target: ElementId,
        current_target: ElementId,
        native: Rc<NativeOccurrence>,
        value: Value,
        detail: EventDetail,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles,
            cancelable,
            phase,
            target,
            current_target,
            native,
            value,
            detail,
        }
    }

    /// The event type name.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether the event bubbles.
    #[must_use]
    pub const fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event is cancelable.
    #[must_use]
    pub const fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// The dispatch phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The target element.
    #[must_use]
    pub const fn target(&self) -> ElementId {
        self.target
    }

    /// The element whose listener is currently being invoked.
    #[must_use]
    pub const fn current_target(&self) -> ElementId {
        self.current_target
    }

    /// The opaque native payload capsule.
    #[must_use]
    pub fn native(&self) -> &NativeOccurrence {
        &self.native
    }

    /// The structured value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The specialized payload.
    #[must_use]
    pub const fn detail(&self) -> &EventDetail {
        &self.detail
    }

    /// The keyboard snapshot, for keyboard events.
    #[must_use]
    pub fn keyboard(&self) -> Option<&KeyboardDetail> {
        match &self.detail {
            EventDetail::Keyboard(k) => Some(k),
            _ => None,
        }
    }

    /// The mouse snapshot, for mouse events.
    #[must_use]
    pub fn mouse(&self) -> Option<&MouseDetail> {
        match &self.detail {
            EventDetail::Mouse(m) => Some(m),
            _ => None,
        }
    }

    /// The logical key value, for keyboard events.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.keyboard().map(|k| k.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_resolution_table() {
        assert_eq!(EventKind::resolve("click"), EventKind::Mouse);
        assert_eq!(EventKind::resolve("mouseover"), EventKind::Mouse);
        assert_eq!(EventKind::resolve("keydown"), EventKind::Keyboard);
        assert_eq!(EventKind::resolve("keyup"), EventKind::Keyboard);
        assert_eq!(EventKind::resolve("popstate"), EventKind::Navigation);
        assert_eq!(EventKind::resolve("input"), EventKind::Input);
        assert_eq!(EventKind::resolve("scroll"), EventKind::Ui);
        assert_eq!(EventKind::resolve(""), EventKind::Ui);
    }

    #[test]
    fn kind_defaults() {
        assert!(EventKind::Mouse.bubbles());
        assert!(EventKind::Mouse.cancelable());
        assert!(!EventKind::Navigation.bubbles());
        assert!(!EventKind::Input.cancelable());
    }

    #[test]
    fn raw_keyboard_modifier_mapping() {
        let raw = RawKeyboard {
            ctrl: true,
            shift: true,
            ..RawKeyboard::default()
        };
        let mods = raw.modifiers();
        assert!(mods.contains(Modifiers::CTRL));
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(!mods.contains(Modifiers::ALT));
        assert!(!mods.contains(Modifiers::META));
    }

    #[test]
    fn raw_mouse_modifier_mapping() {
        let raw = RawMouse {
            meta: true,
            ..RawMouse::default()
        };
        assert_eq!(raw.modifiers(), Modifiers::META);
    }

    #[test]
    fn keydown_constructor() {
        let occ = NativeOccurrence::keydown(NativeTargetRef::Window, "Enter", "Enter");
        assert_eq!(occ.name, "keydown");
        assert_eq!(occ.keyboard.as_ref().map(|k| k.key.as_str()), Some("Enter"));
        assert!(occ.mouse.is_none());
    }

    #[test]
    fn navigation_constructor_targets_window() {
        let occ = NativeOccurrence::navigation("/docs");
        assert_eq!(occ.target, NativeTargetRef::Window);
        assert_eq!(occ.path.as_deref(), Some("/docs"));
    }

    #[test]
    fn synthetic_key_accessor() {
        let native = Rc::new(NativeOccurrence::keydown(
            NativeTargetRef::Element(ElementId::from_raw(1)),
            "Enter",
            "Enter",
        ));
        let detail = EventDetail::Keyboard(KeyboardDetail {
            key: "Enter".into(),
            code: "Enter".into(),
            location: 0,
            repeat: false,
            composing: false,
            modifiers: Modifiers::NONE,
        });
        let event = SyntheticEvent::new(
            "keydown",
            true,
            true,
            Phase::AtTarget,
            ElementId::from_raw(1),
            ElementId::from_raw(1),
            native,
            Value::empty(),
            detail,
        );
        assert_eq!(event.key(), Some("Enter"));
        assert!(event.mouse().is_none());
        assert_eq!(event.phase(), Phase::AtTarget);
    }

    #[test]
    fn phase_discriminants() {
        assert_eq!(Phase::Capture as u8, 1);
        assert_eq!(Phase::AtTarget as u8, 2);
        assert_eq!(Phase::Bubble as u8, 3);
    }
}
