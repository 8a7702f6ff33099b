#![forbid(unsafe_code)]

//! Per-kind payload extraction.
//!
//! Each [`EventKind`] variant owns the translation from raw native fields
//! to the synthetic event's structured value and specialized detail. The
//! keyboard and mouse snapshots are copied here, once, at construction
//! time.

use std::collections::BTreeMap;

use arbor_core::{
    ElementId, EventDetail, EventKind, KeyboardDetail, MouseDetail, NativeOccurrence,
    NativeTargetRef, SlotCategory, Value,
};
use arbor_sync::{Tree, parse_history_payload};

/// Build the structured value and detail payload for one occurrence.
///
/// Navigation occurrences merge their accompanying history blob into the
/// current target's history slot before dispatch, through the tree's
/// normal interceptor, so hydration captures it like any other mutation.
/// A malformed blob is logged and skipped; the event still dispatches.
pub(crate) fn extract(
    tree: &mut Tree,
    kind: EventKind,
    occurrence: &NativeOccurrence,
    current: ElementId,
) -> (Value, EventDetail) {
    match kind {
        EventKind::Navigation => {
            if let Some(blob) = &occurrence.history {
                merge_history(tree, current, blob);
            }
            let path = occurrence.path.clone().unwrap_or_default();
            (Value::Str(path), EventDetail::None)
        }
        EventKind::Keyboard => match &occurrence.keyboard {
            Some(raw) => (
                Value::empty(),
                EventDetail::Keyboard(KeyboardDetail {
                    key: raw.key.clone(),
                    code: raw.code.clone(),
                    location: raw.location,
                    repeat: raw.repeat,
                    composing: raw.composing,
                    modifiers: raw.modifiers(),
                }),
            ),
            None => {
                tracing::debug!(
                    target: "arbor.bridge",
                    event = %occurrence.name,
                    "keyboard occurrence without keyboard payload"
                );
                (Value::empty(), EventDetail::None)
            }
        },
        EventKind::Mouse => match &occurrence.mouse {
            Some(raw) => {
                let related_target = raw
                    .related
                    .as_ref()
                    .and_then(|reference| resolve_related(tree, reference));
                (
                    Value::empty(),
                    EventDetail::Mouse(MouseDetail {
                        button: raw.button,
                        buttons: raw.buttons,
                        client: raw.client,
                        page: raw.page,
                        screen: raw.screen,
                        offset: raw.offset,
                        movement: raw.movement,
                        modifiers: raw.modifiers(),
                        related_target,
                    }),
                )
            }
            None => {
                tracing::debug!(
                    target: "arbor.bridge",
                    event = %occurrence.name,
                    "mouse occurrence without mouse payload"
                );
                (Value::empty(), EventDetail::None)
            }
        },
        EventKind::Input => {
            let mut fields = BTreeMap::new();
            if let Some(data) = &occurrence.data {
                fields.insert("data".to_owned(), Value::Str(data.clone()));
            }
            if let Some(input_type) = &occurrence.input_type {
                fields.insert("inputType".to_owned(), Value::Str(input_type.clone()));
            }
            (Value::Object(fields), EventDetail::None)
        }
        EventKind::Ui => {
            let mut fields = BTreeMap::new();
            if let Some(detail) = occurrence.detail {
                fields.insert("detail".to_owned(), Value::Num(detail));
            }
            if let Some(which) = occurrence.which {
                fields.insert("which".to_owned(), Value::Num(f64::from(which)));
            }
            (Value::Object(fields), EventDetail::None)
        }
    }
}

fn merge_history(tree: &mut Tree, current: ElementId, blob: &str) {
    match parse_history_payload(blob) {
        Ok(value) => {
            if let Err(err) = tree.set_slot(current, SlotCategory::History, "history", value) {
                tracing::warn!(
                    target: "arbor.bridge",
                    element = %current,
                    error = %err,
                    "failed to merge history payload"
                );
            }
        }
        Err(err) => {
            tracing::warn!(
                target: "arbor.bridge",
                error = %err,
                "malformed history payload; skipping merge"
            );
        }
    }
}

fn resolve_related(tree: &Tree, reference: &NativeTargetRef) -> Option<ElementId> {
    match reference {
        NativeTargetRef::Element(id) if tree.contains(*id) => Some(*id),
        NativeTargetRef::Window => Some(tree.window()),
        NativeTargetRef::Element(_) | NativeTargetRef::Unknown => None,
    }
}
