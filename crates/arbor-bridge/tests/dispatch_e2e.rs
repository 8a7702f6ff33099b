//! End-to-end dispatch flows: keyboard delivery, handler-failure
//! isolation, and fallback recovery.

use std::cell::Cell;
use std::rc::Rc;

use arbor_bridge::{BridgeError, DispatchOutcome, EventBridge, HandlerError};
use arbor_core::{
    ElementId, HeadlessAdapter, NativeOccurrence, NativeTargetRef, RawKeyboard, RunMode,
    SlotCategory, Value,
};
use arbor_sync::Tree;

fn tree_with_button() -> (Tree, ElementId) {
    let mut tree = Tree::new(Box::new(HeadlessAdapter::new()), RunMode::Browser).unwrap();
    let button = tree.create_element("button", ElementId::WINDOW).unwrap();
    (tree, button)
}

#[test]
fn enter_keydown_invokes_handler_exactly_once() {
    let (mut tree, button) = tree_with_button();
    let mut bridge = EventBridge::new();
    let invocations = Rc::new(Cell::new(0u32));

    let seen = Rc::clone(&invocations);
    bridge
        .listen(&mut tree, button, "keydown", false, move |_, event| {
            seen.set(seen.get() + 1);
            let key = event.keyboard().expect("keyboard detail is snapshotted");
            assert_eq!(event.key(), Some("Enter"));
            assert!(!key.ctrl_key());
            Ok(())
        })
        .unwrap();

    let occurrence = NativeOccurrence::new("keydown", NativeTargetRef::Element(button))
        .with_keyboard(RawKeyboard {
            key: "Enter".into(),
            code: "Enter".into(),
            ..RawKeyboard::default()
        });

    let outcome = bridge.dispatch(&mut tree, occurrence);
    assert_eq!(outcome, DispatchOutcome::Dispatched { handlers: 1 });
    assert_eq!(invocations.get(), 1);
}

#[test]
fn handler_failure_is_isolated_to_one_dispatch() {
    // Listener on the window, which survives the fallback transition.
    let mut tree = Tree::new(Box::new(HeadlessAdapter::new()), RunMode::Browser).unwrap();
    tree.create_element("div", ElementId::WINDOW).unwrap();
    let mut bridge = EventBridge::new().with_fallback_notice("render failed");

    let calls = Rc::new(Cell::new(0u32));
    let calls_in = Rc::clone(&calls);
    let mut sub = bridge
        .listen(&mut tree, ElementId::WINDOW, "click", false, move |_, _| {
            calls_in.set(calls_in.get() + 1);
            if calls_in.get() == 1 {
                Err(HandlerError::new("first click explodes"))
            } else {
                Ok(())
            }
        })
        .unwrap();

    // First rapid click: fails, content replaced with the notice.
    let first = bridge.dispatch(
        &mut tree,
        NativeOccurrence::click(NativeTargetRef::Window, 1.0, 1.0),
    );
    assert_eq!(first, DispatchOutcome::HandlerFailed);
    let notice = tree.registry().window().children()[0];
    assert_eq!(
        tree.slot(notice, SlotCategory::Property, "text")
            .and_then(Value::as_str),
        Some("render failed")
    );

    // Second rapid click: dispatch completes normally.
    let second = bridge.dispatch(
        &mut tree,
        NativeOccurrence::click(NativeTargetRef::Window, 1.0, 1.0),
    );
    assert_eq!(second, DispatchOutcome::Dispatched { handlers: 1 });
    assert_eq!(calls.get(), 2);

    // A single unsubscribe detaches without error; a second fails loudly.
    bridge.unsubscribe(&mut tree, &mut sub).unwrap();
    assert!(matches!(
        bridge.unsubscribe(&mut tree, &mut sub),
        Err(BridgeError::DoubleUnsubscribe)
    ));
}

#[test]
fn fallback_sweeps_listeners_of_replaced_content() {
    let (mut tree, button) = tree_with_button();
    let mut bridge = EventBridge::new();

    let mut sub = bridge
        .listen(&mut tree, button, "click", false, |_, _| {
            Err(HandlerError::new("boom"))
        })
        .unwrap();
    assert_eq!(bridge.subscription_count(), 1);

    let outcome = bridge.dispatch(
        &mut tree,
        NativeOccurrence::click(NativeTargetRef::Element(button), 0.0, 0.0),
    );
    assert_eq!(outcome, DispatchOutcome::HandlerFailed);

    // The button left the tree with the fallback; its native subscription
    // was released by the sweep.
    assert!(!tree.contains(button));
    assert_eq!(bridge.subscription_count(), 0);

    // A later click on the dead element is dropped, not an error.
    let outcome = bridge.dispatch(
        &mut tree,
        NativeOccurrence::click(NativeTargetRef::Element(button), 0.0, 0.0),
    );
    assert_eq!(outcome, DispatchOutcome::Dropped);

    // The capability spends cleanly even though the registration is gone.
    bridge.unsubscribe(&mut tree, &mut sub).unwrap();
    assert!(matches!(
        bridge.unsubscribe(&mut tree, &mut sub),
        Err(BridgeError::DoubleUnsubscribe)
    ));
}

#[test]
fn dispatched_mutations_hydrate_to_a_fresh_tree() {
    // The full loop: interaction on one tree, hydration onto another.
    let build = |tree: &mut Tree| tree.create_element("input", ElementId::WINDOW).unwrap();

    let mut live = Tree::new(Box::new(HeadlessAdapter::new()), RunMode::Browser).unwrap();
    let input = build(&mut live);
    let mut bridge = EventBridge::new();
    bridge
        .listen(&mut live, input, "input", false, move |tree, event| {
            let text = event
                .value()
                .as_object()
                .and_then(|map| map.get("data"))
                .cloned()
                .unwrap_or_else(|| Value::from(""));
            tree.set_slot(event.current_target(), SlotCategory::Property, "value", text)
                .map_err(|err| HandlerError::new(err.to_string()))
        })
        .unwrap();

    live.capture();
    let occurrence = NativeOccurrence {
        data: Some("typed".into()),
        input_type: Some("insertText".into()),
        ..NativeOccurrence::new("input", NativeTargetRef::Element(input))
    };
    assert_eq!(
        bridge.dispatch(&mut live, occurrence),
        DispatchOutcome::Dispatched { handlers: 1 }
    );

    let blob = arbor_sync::snapshot(&live).unwrap();
    let mut fresh = Tree::new(Box::new(HeadlessAdapter::new()), RunMode::Browser).unwrap();
    build(&mut fresh);
    arbor_sync::hydrate(&mut fresh, &blob).unwrap();

    assert_eq!(
        fresh
            .slot(input, SlotCategory::Property, "value")
            .and_then(Value::as_str),
        Some("typed")
    );
}
