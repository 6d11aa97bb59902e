#![forbid(unsafe_code)]

//! DOM binding of an [`Overlay`].
//!
//! [`DomOverlayView`] turns view calls into class and style changes on the
//! mount point. Transition steps cannot run inside a view call (the overlay
//! is borrowed), so they are queued and [`OverlayHandle::with`] turns them
//! into timers once the borrow ends.
//!
//! # Invariants
//!
//! - Every access to the overlay goes through [`OverlayHandle::with`], so
//!   no queued step is lost.
//! - Timers hold a weak reference; a timer firing after the dashboard was
//!   cleared does nothing.
//! - Only the latest show/hide fade is applied ([`FadeGuard`]).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use livedoc_overlay::{
    ChromeDelta, ChromeTarget, HideOptions, Overlay, OverlayError, OverlayOptions, OverlayView,
    PanelKey, Region, SlideDirection, SlideSlot, TransitionConfig, TransitionTicket,
    controls_id,
};
use livedoc_session::OverlayConfig;
use tracing::{debug, error};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use super::dom::{self, Listener};
use super::storage::LocalStorage;
use crate::error::WebError;
use crate::markup::{
    COLOR_ATTR, CONTENT_CLASS, CONTENT_SELECTOR, CONTROLS_CLASSES, FADE_IN_DELAY, FADE_OUT,
    FadeGuard, HIDDEN_CLASS, ITEM_SELECTOR, ITEMS_CLASS, ITEMS_SELECTOR, KEY_ATTR, MountScan,
    NAV_ICON_SELECTOR, NavControl, OVERLAY_CLASS, PanelAttributes, TEXT_ATTR, TEXT_HOVER_ATTR,
    is_backdrop_click, panel_selector,
};

pub(crate) type DomOverlay = Overlay<DomOverlayView, LocalStorage>;

// ============================================================================
// View
// ============================================================================

pub(crate) struct DomOverlayView {
    container: HtmlElement,
    content: Element,
    items: Element,
    controls: Element,
    nav_icons: Vec<Element>,
    panels: HashMap<PanelKey, Element>,
    fade: Rc<Cell<FadeGuard>>,
    pending: Vec<(TransitionTicket, Duration)>,
}

impl DomOverlayView {
    pub(crate) fn items(&self) -> &Element {
        &self.items
    }

    fn id(&self) -> String {
        self.container.id()
    }

    /// Panel element of `key`. Panels added behind the overlay's back are
    /// looked up in the items region and cached.
    fn panel(&mut self, key: &PanelKey) -> Option<Element> {
        if let Some(panel) = self.panels.get(key) {
            return Some(panel.clone());
        }
        let Some(panel) = dom::query(&self.items, &panel_selector(key.as_str())) else {
            debug!(message = "overlay.panel.missing", overlay_id = %self.id(), key = %key);
            return None;
        };
        self.panels.insert(key.clone(), panel.clone());
        Some(panel)
    }

    fn set_style(&self, elem: &HtmlElement, property: &str, value: &str) {
        if let Err(err) = elem.style().set_property(property, value) {
            debug!(message = "overlay.style.failed", overlay_id = %self.id(), property, err = ?err);
        }
    }

    fn take_pending(&mut self) -> Vec<(TransitionTicket, Duration)> {
        std::mem::take(&mut self.pending)
    }

    fn next_fade(&self) -> u64 {
        let mut guard = self.fade.get();
        let generation = guard.begin();
        self.fade.set(guard);
        generation
    }

    fn after(&self, delay: Duration, callback: impl FnOnce() + 'static) {
        if let Err(err) = dom::set_timeout(delay, callback) {
            error!(message = "overlay.timer.failed", overlay_id = %self.id(), %err);
        }
    }

    fn chrome_targets(&self, target: ChromeTarget) -> Vec<&Element> {
        match target {
            ChromeTarget::NavIcons => self.nav_icons.iter().collect(),
            ChromeTarget::Controls => vec![&self.controls],
            ChromeTarget::ContentBorder => vec![&self.content],
        }
    }
}

impl OverlayView for DomOverlayView {
    fn set_overlay_visible(&mut self, visible: bool, animate: bool) {
        let generation = self.next_fade();
        self.set_style(&self.container, "opacity", "0");
        if visible {
            self.set_style(&self.container, "display", "flex");
            dom::remove_classes(&self.container, [HIDDEN_CLASS]);
            dom::remove_classes(&self.content, [HIDDEN_CLASS]);
            let container = self.container.clone();
            let fade = Rc::clone(&self.fade);
            self.after(FADE_IN_DELAY, move || {
                if !fade.get().is_current(generation) {
                    return;
                }
                if let Err(err) = container.style().set_property("opacity", "1") {
                    debug!(
                        message = "overlay.style.failed",
                        overlay_id = %container.id(),
                        property = "opacity",
                        err = ?err
                    );
                }
            });
            return;
        }

        let container = self.container.clone();
        let content = self.content.clone();
        let fade = Rc::clone(&self.fade);
        let finish = move || {
            if fade.get().is_current(generation) {
                dom::add_classes(&container, [HIDDEN_CLASS]);
                dom::add_classes(&content, [HIDDEN_CLASS]);
            }
        };
        if animate {
            self.after(FADE_OUT, finish);
        } else {
            finish();
        }
    }

    fn set_panel_visible(&mut self, key: &PanelKey, visible: bool) {
        let Some(panel) = self.panel(key) else {
            return;
        };
        if visible {
            dom::remove_classes(&panel, [HIDDEN_CLASS]);
        } else {
            dom::add_classes(&panel, [HIDDEN_CLASS]);
        }
    }

    fn set_panel_slot(&mut self, key: &PanelKey, slot: Option<SlideSlot>, direction: SlideDirection) {
        let Some(panel) = self.panel(key) else {
            return;
        };
        dom::remove_classes(
            &panel,
            SlideSlot::ALL.map(|s| s.class_name(SlideDirection::Forward)),
        );
        if let Some(slot) = slot {
            dom::add_classes(&panel, [slot.class_name(direction)]);
        }
    }

    fn place_before(&mut self, key: &PanelKey, anchor: &PanelKey) {
        let (Some(panel), Some(anchor)) = (self.panel(key), self.panel(anchor)) else {
            return;
        };
        if let Err(err) = self.items.insert_before(&panel, Some(&anchor)) {
            error!(message = "overlay.reorder.failed", overlay_id = %self.id(), err = ?err);
        }
    }

    fn apply_chrome(&mut self, delta: &ChromeDelta) {
        for target in ChromeTarget::ALL {
            for elem in self.chrome_targets(target) {
                dom::remove_classes(elem, delta.remove.get(target).iter());
                dom::add_classes(elem, delta.add.get(target).iter());
            }
        }
    }

    fn schedule_transition(&mut self, ticket: TransitionTicket, delay: Duration) {
        self.pending.push((ticket, delay));
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Shared access to a mounted overlay.
#[derive(Clone)]
pub(crate) struct OverlayHandle {
    inner: Rc<RefCell<DomOverlay>>,
}

impl OverlayHandle {
    fn new(overlay: DomOverlay) -> Self {
        let handle = Self {
            inner: Rc::new(RefCell::new(overlay)),
        };
        // Construction may already have started a restoring transition.
        handle.with(|_| ());
        handle
    }

    fn downgrade(&self) -> Weak<RefCell<DomOverlay>> {
        Rc::downgrade(&self.inner)
    }

    /// Run `f` against the overlay, then schedule the transition steps it
    /// queued.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut DomOverlay) -> R) -> R {
        let (out, pending) = {
            let mut overlay = self.inner.borrow_mut();
            let out = f(&mut overlay);
            (out, overlay.view_mut().take_pending())
        };
        for (ticket, delay) in pending {
            self.schedule(ticket, delay);
        }
        out
    }

    fn schedule(&self, ticket: TransitionTicket, delay: Duration) {
        let weak = self.downgrade();
        let scheduled = dom::set_timeout(delay, move || {
            if let Some(inner) = weak.upgrade() {
                OverlayHandle { inner }.with(|overlay| overlay.transition_step(ticket));
            }
        });
        if let Err(err) = scheduled {
            error!(message = "overlay.transition.unscheduled", ticket = ticket.get(), %err);
        }
    }

    pub(crate) fn id(&self) -> String {
        self.inner.borrow().id().to_owned()
    }

    /// Append `panel` to the items region. Registration is up to the caller,
    /// which removes the element again when it fails.
    pub(crate) fn append_panel(&self, key: &PanelKey, panel: &Element) -> Result<(), WebError> {
        let mut overlay = self.inner.borrow_mut();
        let view = overlay.view_mut();
        dom::append(&view.items, panel)?;
        view.panels.entry(key.clone()).or_insert_with(|| panel.clone());
        Ok(())
    }

    /// Remove a panel whose registration failed. A panel already registered
    /// under the same key stays cached.
    pub(crate) fn discard_panel(&self, key: &PanelKey, panel: &Element) {
        panel.remove();
        let mut overlay = self.inner.borrow_mut();
        let panels = &mut overlay.view_mut().panels;
        if panels.get(key) == Some(panel) {
            panels.remove(key);
        }
    }

    /// Scroll the items region to its end.
    pub(crate) fn scroll_items_to_bottom(&self) {
        dom::scroll_to_bottom(self.inner.borrow().view().items());
    }
}

// ============================================================================
// Mounting
// ============================================================================

/// A mounted overlay and the listeners of its chrome.
pub(crate) struct MountedOverlay {
    handle: OverlayHandle,
    _listeners: Vec<Listener>,
}

impl MountedOverlay {
    pub(crate) fn handle(&self) -> &OverlayHandle {
        &self.handle
    }
}

/// Bind an overlay to the element with `config.identifier`, creating the
/// standard skeleton when the page has none.
pub(crate) fn mount(
    document: &Document,
    config: &OverlayConfig,
    transition: TransitionConfig,
) -> Result<MountedOverlay, WebError> {
    let container = match dom::by_id(document, &config.identifier) {
        Some(elem) => elem,
        None => create_skeleton(document, &config.identifier)?,
    };
    dom::add_classes(&container, config.classes.iter().map(String::as_str));
    let container: HtmlElement = container
        .dyn_into()
        .map_err(|_| WebError::Js(format!("`#{}` is not an HTML element", config.identifier)))?;

    let id = container.id();
    let content = dom::query(&container, CONTENT_SELECTOR);
    let items = content
        .as_ref()
        .and_then(|content| dom::query(content, ITEMS_SELECTOR));
    let nav_id = controls_id(&id);
    let existing_nav = dom::by_id(document, &nav_id);

    let item_elems = items
        .as_ref()
        .map(|items| dom::query_all(items, ITEM_SELECTOR))
        .unwrap_or_default();
    let item_attrs: Vec<_> = item_elems.iter().map(panel_attributes).collect();
    let panels = item_attrs
        .iter()
        .zip(&item_elems)
        .filter_map(|(attrs, elem)| Some((attrs.panel_key()?, elem.clone())))
        .collect();

    let scan = MountScan {
        id: Some(id.clone()).filter(|id| !id.is_empty()),
        has_content: content.is_some(),
        has_items: items.is_some(),
        items: item_attrs,
        controls_present: existing_nav.is_some(),
    };
    let mount = scan.into_mount();
    if mount.id.is_empty() {
        return Err(OverlayError::MissingId.into());
    }
    let Some(content) = content else {
        return Err(missing_region(&id, Region::Content));
    };
    let Some(items) = items else {
        return Err(missing_region(&id, Region::Items));
    };

    let controls = match existing_nav {
        Some(nav) => nav,
        None => create_controls(document, &content, &nav_id)?,
    };
    let nav_icons = dom::query_all(&controls, NAV_ICON_SELECTOR);

    let view = DomOverlayView {
        container: container.clone(),
        content,
        items,
        controls: controls.clone(),
        nav_icons: nav_icons.clone(),
        panels,
        fade: Rc::new(Cell::new(FadeGuard::new())),
        pending: Vec::new(),
    };
    let options = OverlayOptions::default()
        .colorize(config.colorize)
        .transition(transition);
    let overlay = Overlay::new(mount, options, view, LocalStorage::open())?;
    let handle = OverlayHandle::new(overlay);
    let listeners = wire_controls(&handle, &container, &controls, &nav_icons)?;
    debug!(message = "overlay.mounted", overlay_id = %id, panels = handle.with(|o| o.panel_count()));

    Ok(MountedOverlay {
        handle,
        _listeners: listeners,
    })
}

fn missing_region(id: &str, region: Region) -> WebError {
    OverlayError::MissingRegion {
        overlay_id: id.to_owned(),
        region,
    }
    .into()
}

fn panel_attributes(elem: &Element) -> PanelAttributes {
    PanelAttributes {
        key: elem.get_attribute(KEY_ATTR),
        color: elem.get_attribute(COLOR_ATTR),
        color_text: elem.get_attribute(TEXT_ATTR),
        color_text_hover: elem.get_attribute(TEXT_HOVER_ATTR),
    }
}

fn create_skeleton(document: &Document, id: &str) -> Result<Element, WebError> {
    let container = dom::create(document, "div", &[OVERLAY_CLASS, HIDDEN_CLASS])?;
    container.set_id(id);
    let content = dom::create(document, "div", &[CONTENT_CLASS, HIDDEN_CLASS])?;
    let items = dom::create(document, "div", &[ITEMS_CLASS])?;
    dom::append(&content, &items)?;
    dom::append(&container, &content)?;
    let body = document.body().ok_or_else(|| WebError::missing("body"))?;
    body.append_child(&container).map_err(dom::js_error)?;
    debug!(message = "overlay.skeleton.created", overlay_id = id);
    Ok(container)
}

fn create_controls(document: &Document, content: &Element, nav_id: &str) -> Result<Element, WebError> {
    let nav = dom::create(document, "nav", &CONTROLS_CLASSES)?;
    nav.set_id(nav_id);
    for control in NavControl::ALL {
        let icon = dom::create(document, "i", control.classes())?;
        dom::append(&nav, &icon)?;
    }
    content
        .insert_before(&nav, content.first_child().as_ref())
        .map_err(dom::js_error)?;
    Ok(nav)
}

fn wire_controls(
    handle: &OverlayHandle,
    container: &HtmlElement,
    controls: &Element,
    nav_icons: &[Element],
) -> Result<Vec<Listener>, WebError> {
    let mut listeners = Vec::new();

    for control in NavControl::ALL {
        let Some(icon) = dom::query(controls, &format!(".{}", control.marker())) else {
            continue;
        };
        let overlay = handle.clone();
        listeners.push(Listener::new(&icon, "click", move |_| match control.delta() {
            Some(delta) => {
                overlay.with(|o| o.next_content_item(delta));
            }
            None => overlay.with(|o| o.hide_overlay(HideOptions::default())),
        })?);
    }

    for icon in nav_icons {
        for (event, entering) in [("mouseover", true), ("mouseout", false)] {
            let overlay = handle.clone();
            let target = icon.clone();
            listeners.push(Listener::new(icon, event, move |_| {
                if let Some(swap) = overlay.with(|o| o.hover_swap(entering)) {
                    dom::remove_classes(&target, swap.remove);
                    dom::add_classes(&target, swap.add);
                }
            })?);
        }
    }

    let overlay = handle.clone();
    let overlay_id = container.id();
    listeners.push(Listener::new(container, "click", move |event| {
        let target_id = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .map(|elem| elem.id())
            .unwrap_or_default();
        if is_backdrop_click(&target_id, &overlay_id) {
            overlay.with(|o| o.hide_overlay(HideOptions::default()));
        }
    })?);

    Ok(listeners)
}
