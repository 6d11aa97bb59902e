#![forbid(unsafe_code)]

//! Small DOM helpers shared by the wasm glue.
//!
//! Listeners and intervals are owned values: dropping one detaches it, so a
//! component's lifetime bounds every callback it registered.

use std::time::Duration;

use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, EventTarget, Window};

use crate::error::WebError;

pub(crate) fn js_error(value: JsValue) -> WebError {
    WebError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

pub(crate) fn window() -> Result<Window, WebError> {
    web_sys::window().ok_or(WebError::NoWindow)
}

pub(crate) fn document() -> Result<Document, WebError> {
    window()?.document().ok_or(WebError::NoWindow)
}

fn millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

/// Milliseconds since the epoch, the key of panels created on the client.
pub(crate) fn now_ms() -> i64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

// ============================================================================
// Elements
// ============================================================================

pub(crate) fn create(document: &Document, tag: &str, classes: &[&str]) -> Result<Element, WebError> {
    let elem = document.create_element(tag).map_err(js_error)?;
    add_classes(&elem, classes.iter().copied());
    Ok(elem)
}

pub(crate) fn create_text(
    document: &Document,
    tag: &str,
    text: &str,
    classes: &[&str],
) -> Result<Element, WebError> {
    let elem = create(document, tag, classes)?;
    elem.set_text_content(Some(text));
    Ok(elem)
}

pub(crate) fn add_classes<'a>(elem: &Element, classes: impl IntoIterator<Item = &'a str>) {
    let list = elem.class_list();
    for class in classes {
        if let Err(err) = list.add_1(class) {
            debug!(message = "dom.class.add_failed", class, err = ?err);
        }
    }
}

pub(crate) fn remove_classes<'a>(elem: &Element, classes: impl IntoIterator<Item = &'a str>) {
    let list = elem.class_list();
    for class in classes {
        if let Err(err) = list.remove_1(class) {
            debug!(message = "dom.class.remove_failed", class, err = ?err);
        }
    }
}

pub(crate) fn append(parent: &Element, child: &Element) -> Result<(), WebError> {
    parent.append_child(child).map_err(js_error)?;
    Ok(())
}

pub(crate) fn by_id(document: &Document, id: &str) -> Option<Element> {
    document.get_element_by_id(id)
}

pub(crate) fn require_id(document: &Document, id: &str) -> Result<Element, WebError> {
    by_id(document, id).ok_or_else(|| WebError::missing(format!("#{id}")))
}

pub(crate) fn query(parent: &Element, selector: &str) -> Option<Element> {
    parent.query_selector(selector).ok().flatten()
}

pub(crate) fn query_all(parent: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = parent.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub(crate) fn scroll_to_bottom(elem: &Element) {
    elem.set_scroll_top(elem.scroll_height());
}

/// `<i class="bi …">` followed by the path as text, with the link wrapper
/// used for served URLs.
pub(crate) fn path_element(
    document: &Document,
    path: &str,
    wrapper: &str,
    text_tag: &str,
    icon_spacing: &str,
) -> Result<Element, WebError> {
    let (icon_class, color) = livedoc_session::render::path_icon(path);
    let icon = create(document, "i", &["bi", icon_class, icon_spacing])?;
    if let Some(color) = color {
        add_classes(&icon, [color]);
    }
    let text = create_text(document, text_tag, path, &[])?;
    let output = create(document, wrapper, &[])?;
    if wrapper == "a" {
        output.set_attribute("href", path).map_err(js_error)?;
    }
    append(&output, &icon)?;
    append(&output, &text)?;
    Ok(output)
}

// ============================================================================
// Timers and listeners
// ============================================================================

/// Run `callback` once after `delay`.
pub(crate) fn set_timeout(delay: Duration, callback: impl FnOnce() + 'static) -> Result<i32, WebError> {
    let callback = Closure::once_into_js(callback);
    window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            millis(delay),
        )
        .map_err(js_error)
}

/// A `setInterval` cleared on drop.
pub(crate) struct Interval {
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    pub(crate) fn new(period: Duration, tick: impl FnMut() + 'static) -> Result<Self, WebError> {
        let callback = Closure::<dyn FnMut()>::new(tick);
        let id = window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(period),
            )
            .map_err(js_error)?;
        Ok(Self {
            id,
            _callback: callback,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.id);
        }
    }
}

/// An event listener removed on drop.
pub(crate) struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub(crate) fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, WebError> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let removed = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
        if let Err(err) = removed {
            debug!(message = "dom.listener.detach_failed", event = self.event, err = ?err);
        }
    }
}
