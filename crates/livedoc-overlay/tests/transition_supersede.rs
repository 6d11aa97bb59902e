//! Rapid A → B → C showing: timers of superseded transitions fire late and
//! must not disturb the panel that ends up in view.

use std::time::Duration;

use livedoc_overlay::{
    HeadlessView, MemoryStorage, Overlay, OverlayMount, OverlayOptions, PanelKey, PanelSpec,
    ShowOptions, SlideSlot, TransitionConfig, TransitionPhase,
};
use pretty_assertions::assert_eq;

fn overlay() -> Overlay<HeadlessView, MemoryStorage> {
    let mount = OverlayMount::new("renders")
        .with_item(PanelSpec::new("a"))
        .with_item(PanelSpec::new("b"))
        .with_item(PanelSpec::new("c"));
    let timings = TransitionConfig::default()
        .start_delay(Duration::from_millis(5))
        .settle_time(Duration::from_millis(250));
    Overlay::new(
        mount,
        OverlayOptions::default().transition(timings),
        HeadlessView::new(),
        MemoryStorage::new(),
    )
    .expect("valid mount")
}

#[test]
fn latest_request_wins_even_when_old_timers_fire() {
    let mut overlay = overlay();
    overlay.show_content_item("a", ShowOptions::instant());

    overlay.show_content_item("b", ShowOptions::default());
    let to_b = overlay.view_mut().take_scheduled();
    overlay.show_content_item("c", ShowOptions::default());
    let to_c = overlay.view_mut().take_scheduled();

    // Superseded timers fire first and are ignored.
    for (ticket, _) in &to_b {
        assert!(!overlay.transition_step(*ticket));
    }
    assert_eq!(overlay.view().slot("c"), Some(SlideSlot::Leading));

    let (ticket, delay) = to_c[0];
    assert_eq!(delay, Duration::from_millis(5));
    assert!(overlay.transition_step(ticket));
    let settle = overlay.view_mut().take_scheduled();
    assert_eq!(settle, vec![(ticket, Duration::from_millis(250))]);
    assert!(overlay.transition_step(ticket));

    assert_eq!(overlay.transition_phase(), TransitionPhase::Settled);
    assert_eq!(overlay.view().visible_panels(), vec![&PanelKey::new("c")]);
    assert_eq!(overlay.current_key(), Some(&PanelKey::new("c")));
    for key in ["a", "b", "c"] {
        assert_eq!(overlay.view().slot(key), None, "slot left on {key}");
    }
}

#[test]
fn instant_show_mid_slide_settles_immediately() {
    let mut overlay = overlay();
    overlay.show_content_item("a", ShowOptions::instant());
    overlay.show_content_item("b", ShowOptions::default());
    let pending = overlay.view_mut().take_scheduled();

    overlay.show_content_item("c", ShowOptions::instant());
    assert_eq!(overlay.view().visible_panels(), vec![&PanelKey::new("c")]);
    for (ticket, _) in pending {
        assert!(!overlay.transition_step(ticket));
    }
    assert_eq!(overlay.view().visible_panels(), vec![&PanelKey::new("c")]);
}

#[test]
fn backward_paging_stages_incoming_before_outgoing() {
    let mut overlay = overlay();
    overlay.show_content_item("b", ShowOptions::instant());
    assert!(overlay.next_content_item(-1));

    assert_eq!(overlay.current_key(), Some(&PanelKey::new("a")));
    let order: Vec<&str> = overlay.view().order().iter().map(PanelKey::as_str).collect();
    let a = order.iter().position(|k| *k == "a").expect("a tracked");
    let b = order.iter().position(|k| *k == "b").expect("b tracked");
    assert!(a < b);
}
