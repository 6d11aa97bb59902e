#![forbid(unsafe_code)]

//! Rendering boundary of the overlay.
//!
//! [`Overlay`](crate::Overlay) never touches a document directly; every side
//! effect flows through [`OverlayView`]. The browser implementation lives in
//! `livedoc-web`; [`HeadlessView`] records the same effects in memory so the
//! state machine can be exercised natively.

use std::time::Duration;

use ahash::AHashMap;

use crate::colorize::{ChromeClasses, ChromeDelta};
use crate::panel::PanelKey;
use crate::transition::{SlideDirection, SlideSlot, TransitionTicket};

/// Presentation side of an overlay.
///
/// Implementations report their own failures (e.g. a panel element that
/// vanished from the document); the state machine treats every call as
/// best-effort.
pub trait OverlayView {
    /// Show or hide the overlay container. `animate` requests the fade.
    fn set_overlay_visible(&mut self, visible: bool, animate: bool);

    /// Show or hide one panel.
    fn set_panel_visible(&mut self, key: &PanelKey, visible: bool);

    /// Place a panel in a slide slot, or clear every slot class with `None`.
    fn set_panel_slot(&mut self, key: &PanelKey, slot: Option<SlideSlot>, direction: SlideDirection);

    /// Move panel `key` directly before `anchor` in document order.
    fn place_before(&mut self, key: &PanelKey, anchor: &PanelKey);

    /// Apply a chrome class delta (removals first).
    fn apply_chrome(&mut self, delta: &ChromeDelta);

    /// Arrange for [`Overlay::transition_step`](crate::Overlay::transition_step)
    /// to be called with `ticket` after `delay`.
    fn schedule_transition(&mut self, ticket: TransitionTicket, delay: Duration);
}

/// In-memory view that records every effect.
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    overlay_visible: bool,
    order: Vec<PanelKey>,
    visible: AHashMap<PanelKey, bool>,
    slots: AHashMap<PanelKey, SlideSlot>,
    chrome: ChromeClasses,
    scheduled: Vec<(TransitionTicket, Duration)>,
    mutations: usize,
}

impl HeadlessView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the overlay container is shown.
    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Whether `key` is shown.
    pub fn panel_visible(&self, key: &str) -> bool {
        self.visible.get(key).copied().unwrap_or(false)
    }

    /// Keys of every shown panel, in document order.
    pub fn visible_panels(&self) -> Vec<&PanelKey> {
        self.order
            .iter()
            .filter(|key| self.panel_visible(key.as_str()))
            .collect()
    }

    /// Slot currently held by `key`.
    pub fn slot(&self, key: &str) -> Option<SlideSlot> {
        self.slots.get(key).copied()
    }

    /// Panels known to the view, in document order.
    pub fn order(&self) -> &[PanelKey] {
        &self.order
    }

    /// Chrome classes currently applied.
    pub fn chrome(&self) -> &ChromeClasses {
        &self.chrome
    }

    /// Transition steps scheduled and not yet drained.
    pub fn scheduled(&self) -> &[(TransitionTicket, Duration)] {
        &self.scheduled
    }

    /// Drain the transition steps scheduled since the last call.
    pub fn take_scheduled(&mut self) -> Vec<(TransitionTicket, Duration)> {
        std::mem::take(&mut self.scheduled)
    }

    /// Number of effects applied so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    fn track(&mut self, key: &PanelKey) {
        if !self.order.contains(key) {
            self.order.push(key.clone());
        }
    }
}

impl OverlayView for HeadlessView {
    fn set_overlay_visible(&mut self, visible: bool, _animate: bool) {
        self.mutations += 1;
        self.overlay_visible = visible;
    }

    fn set_panel_visible(&mut self, key: &PanelKey, visible: bool) {
        self.mutations += 1;
        self.track(key);
        self.visible.insert(key.clone(), visible);
    }

    fn set_panel_slot(&mut self, key: &PanelKey, slot: Option<SlideSlot>, _direction: SlideDirection) {
        self.mutations += 1;
        self.track(key);
        match slot {
            Some(slot) => {
                self.slots.insert(key.clone(), slot);
            }
            None => {
                self.slots.remove(key);
            }
        }
    }

    fn place_before(&mut self, key: &PanelKey, anchor: &PanelKey) {
        self.mutations += 1;
        self.track(anchor);
        self.order.retain(|k| k != key);
        let at = self
            .order
            .iter()
            .position(|k| k == anchor)
            .unwrap_or(self.order.len());
        self.order.insert(at, key.clone());
    }

    fn apply_chrome(&mut self, delta: &ChromeDelta) {
        self.mutations += 1;
        self.chrome.apply(delta);
    }

    fn schedule_transition(&mut self, ticket: TransitionTicket, delay: Duration) {
        self.scheduled.push((ticket, delay));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_before_reorders_panels() {
        let mut view = HeadlessView::new();
        let (a, b, c) = (PanelKey::new("a"), PanelKey::new("b"), PanelKey::new("c"));
        view.set_panel_visible(&a, false);
        view.set_panel_visible(&b, false);
        view.set_panel_visible(&c, true);
        view.place_before(&c, &a);
        assert_eq!(view.order(), &[c.clone(), a, b]);
        assert_eq!(view.visible_panels(), vec![&c]);
    }

    #[test]
    fn clearing_a_slot_removes_it() {
        let mut view = HeadlessView::new();
        let key = PanelKey::new("k");
        view.set_panel_slot(&key, Some(SlideSlot::Leading), SlideDirection::Forward);
        assert_eq!(view.slot("k"), Some(SlideSlot::Leading));
        view.set_panel_slot(&key, None, SlideDirection::Forward);
        assert_eq!(view.slot("k"), None);
        assert_eq!(view.mutation_count(), 2);
    }
}
