#![forbid(unsafe_code)]

//! Banner buttons and the input forms they open.
//!
//! Buttons either move an overlay (latest render, latest response, open a
//! form) or call the API; API responses land in the responses overlay.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---|---|
//! | Invalid form input | input outlined, message shown, inputs overlay turns warning |
//! | Request fails | logged; the spinner is removed |

use livedoc_overlay::{ColorizeOptions, HideOptions, PanelKey, ThemeColor};
use livedoc_session::controls::{
    INVALID_INPUT_CLASSES, history_form, last_form, open_form, register_forms, render_form,
    show_latest, show_latest_response,
};
use livedoc_session::requests::{ApiRequest, RenderRequest};
use livedoc_session::{ControlAction, FormError, FormKind, LatestResponse};
use tracing::{debug, error, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

use super::dom::{self, Listener, js_error};
use super::fetch;
use super::overlay::OverlayHandle;
use crate::error::WebError;
use crate::markup::{
    ButtonMarkup, COLOR_ATTR, HIDDEN_CLASS, ITEM_CLASS, KEY_ATTR, input_id, submit_button_id,
};

// ============================================================================
// Spinner
// ============================================================================

/// Spinner shown on a button while its request runs; removed on drop.
pub(crate) struct Busy {
    spinner: Option<Element>,
    icons: Vec<Element>,
}

impl Busy {
    pub(crate) fn start(document: &Document, button: &Element) -> Self {
        let icons = dom::query_all(button, "i");
        for icon in &icons {
            dom::add_classes(icon, [HIDDEN_CLASS]);
        }
        let spinner = dom::create(document, "span", &[ButtonMarkup::SPINNER_CLASS])
            .and_then(|spinner| dom::append(button, &spinner).map(|()| spinner));
        if let Err(err) = &spinner {
            warn!(message = "controls.spinner.failed", %err);
        }
        Self {
            spinner: spinner.ok(),
            icons,
        }
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.remove();
        }
        for icon in &self.icons {
            dom::remove_classes(icon, [HIDDEN_CLASS]);
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// What every button and form handler needs.
#[derive(Clone)]
struct Context {
    document: Document,
    renders: OverlayHandle,
    responses: OverlayHandle,
    inputs: OverlayHandle,
    page_path: String,
}

impl Context {
    /// Send `request` in the background with a spinner on `button`, then
    /// show the response. `after` runs once the response is shown.
    fn request(&self, button: &Element, request: ApiRequest, after: impl FnOnce(&Self) + 'static) {
        let context = self.clone();
        let busy = Busy::start(&self.document, button);
        spawn_local(async move {
            match fetch::send(&request).await {
                Ok(summary) => {
                    if let Err(err) = fetch::present(&context.document, &context.responses, &summary, true) {
                        error!(message = "controls.response.failed", url = request.url, %err);
                    }
                }
                Err(err) => error!(message = "controls.request.failed", url = request.url, %err),
            }
            drop(busy);
            after(&context);
        });
    }

    fn show_responses(&self) {
        let shown = self
            .responses
            .with(|overlay| show_latest_response(overlay, dom::now_ms()));
        match shown {
            LatestResponse::Existing(key) => {
                debug!(message = "controls.responses.shown", key = %key);
            }
            LatestResponse::Placeholder(summary) => {
                if let Err(err) = fetch::present(&self.document, &self.responses, &summary, true) {
                    error!(message = "controls.placeholder.failed", %err);
                }
            }
        }
    }

    fn colorize_inputs(&self, color: ThemeColor) {
        self.inputs
            .with(|overlay| overlay.colorize(&ColorizeOptions::color(color)));
    }
}

// ============================================================================
// Buttons
// ============================================================================

/// The banner control strip and its handlers.
pub(crate) struct Controls {
    elem: Element,
    _listeners: Vec<Listener>,
}

impl Controls {
    /// Build the button strip and the forms of the inputs overlay.
    pub(crate) fn mount(
        document: &Document,
        renders: OverlayHandle,
        responses: OverlayHandle,
        inputs: OverlayHandle,
        page_path: String,
    ) -> Result<Self, WebError> {
        let context = Context {
            document: document.clone(),
            renders,
            responses,
            inputs,
            page_path,
        };
        let mut listeners = mount_forms(&context)?;

        let elem = dom::create(document, "div", &["banner-controls"])?;
        let strip = dom::create(document, "div", &["banner-controls-container"])?;
        for action in ControlAction::ALL {
            let button = button(document, &ButtonMarkup::for_action(action))?;
            dom::append(&strip, &button)?;
            let context = context.clone();
            let target = button.clone();
            listeners.push(Listener::new(&button, "click", move |_| {
                run_action(&context, action, &target);
            })?);
        }
        dom::append(&elem, &strip)?;
        Ok(Self {
            elem,
            _listeners: listeners,
        })
    }

    pub(crate) fn element(&self) -> &Element {
        &self.elem
    }
}

fn button(document: &Document, markup: &ButtonMarkup) -> Result<Element, WebError> {
    let elem = dom::create(document, "button", &ButtonMarkup::CLASSES)?;
    elem.set_id(markup.id);
    elem.set_attribute("type", "button").map_err(js_error)?;
    elem.set_attribute("data-bs-toggle", "tooltip").map_err(js_error)?;
    elem.set_attribute("data-bs-title", markup.tooltip).map_err(js_error)?;
    if let Some(key) = markup.data_key {
        elem.set_attribute(KEY_ATTR, key).map_err(js_error)?;
    }
    let icon = dom::create(document, "i", &["bi", markup.icon.as_str()])?;
    dom::add_classes(&icon, markup.icon_classes.iter().copied());
    dom::append(&elem, &icon)?;
    Ok(elem)
}

fn run_action(context: &Context, action: ControlAction, button: &Element) {
    debug!(message = "controls.action", id = action.id());
    match action {
        ControlAction::ShowLatestRender => {
            context.renders.with(show_latest);
        }
        ControlAction::ShowServerResponses => context.show_responses(),
        ControlAction::RenderCurrent => {
            let body = RenderRequest::new(Vec::new(), &context.page_path);
            match ApiRequest::render(&body) {
                Ok(request) => context.request(button, request, |_| ()),
                Err(err) => error!(message = "controls.request.invalid", %err),
            }
        }
        ControlAction::Render | ControlAction::GetAllRenders | ControlAction::GetLastRendered => {
            if let Some(form) = action.form() {
                context.inputs.with(|overlay| open_form(overlay, form));
                focus_form(&context.document, form);
            }
        }
        ControlAction::ClearLogs => context.request(button, ApiRequest::clear_logs(), |_| ()),
        ControlAction::ClearRenders => context.request(button, ApiRequest::clear_renders(), |_| ()),
    }
}

// ============================================================================
// Forms
// ============================================================================

const RENDER_KINDS: [&str; 2] = ["file", "directory"];
const FILTER_KINDS: [&str; 4] = ["none", "direct", "defered", "static"];

fn mount_forms(context: &Context) -> Result<Vec<Listener>, WebError> {
    let mut listeners = Vec::new();
    for form in FormKind::ALL {
        let (panel, submit) = form_panel(&context.document, form)?;
        context.inputs.append_panel(&PanelKey::from(form.key()), &panel)?;
        let handler_context = context.clone();
        let button = submit.clone();
        listeners.push(Listener::new(&submit, "click", move |_| {
            submit_form(&handler_context, form, &button);
        })?);
    }
    context.inputs.with(register_forms)?;
    Ok(listeners)
}

fn form_panel(document: &Document, form: FormKind) -> Result<(Element, Element), WebError> {
    let key = form.key();
    let panel = dom::create(document, "div", &[ITEM_CLASS, HIDDEN_CLASS])?;
    panel.set_attribute(KEY_ATTR, key).map_err(js_error)?;
    panel
        .set_attribute(COLOR_ATTR, ThemeColor::Primary.name())
        .map_err(js_error)?;
    dom::append(&panel, &dom::create_text(document, "h4", form.title(), &["my-5"])?)?;

    let params = dom::create(document, "div", &["m-3"])?;
    params.set_id(&format!("api-params-{key}"));
    if form == FormKind::Render {
        let item = dom::create(document, "input", &["form-control", "w-100", "mb-3"])?;
        item.set_id(&input_id(key, "item"));
        item.set_attribute("type", "text").map_err(js_error)?;
        item.set_attribute("placeholder", "path/to/file.qmd")
            .map_err(js_error)?;
        dom::append(&params, &item)?;
        dom::append(&params, &select(document, key, &RENDER_KINDS)?)?;
    } else {
        dom::append(&params, &select(document, key, &FILTER_KINDS)?)?;
    }
    let error = dom::create(document, "div", &["form-text", "text-warning", HIDDEN_CLASS])?;
    error.set_id(&input_id(key, "error"));
    dom::append(&params, &error)?;
    dom::append(&panel, &params)?;

    let submit = dom::create_text(document, "button", "Submit", &["btn", "btn-primary", "m-3"])?;
    submit.set_id(&submit_button_id(key));
    submit.set_attribute("type", "button").map_err(js_error)?;
    dom::append(&panel, &submit)?;
    Ok((panel, submit))
}

fn select(document: &Document, key: &str, options: &[&str]) -> Result<Element, WebError> {
    let elem = dom::create(document, "select", &["form-select", "w-100"])?;
    elem.set_id(&input_id(key, "kind"));
    for value in options {
        let option = dom::create_text(document, "option", value, &[])?;
        option.set_attribute("value", value).map_err(js_error)?;
        dom::append(&elem, &option)?;
    }
    Ok(elem)
}

fn input_value(document: &Document, key: &str, input: &str) -> String {
    let Some(elem) = dom::by_id(document, &input_id(key, input)) else {
        return String::new();
    };
    if let Some(input) = elem.dyn_ref::<HtmlInputElement>() {
        return input.value();
    }
    elem.dyn_ref::<HtmlSelectElement>()
        .map(HtmlSelectElement::value)
        .unwrap_or_default()
}

fn submit_form(context: &Context, form: FormKind, button: &Element) {
    let document = &context.document;
    let key = form.key();
    let kind = input_value(document, key, "kind");
    let request = match form {
        FormKind::Render => render_form(&input_value(document, key, "item"), &kind)
            .map(|body| ApiRequest::render(&body)),
        FormKind::History => history_form(&kind).map(|body| ApiRequest::history(&body)),
        FormKind::Last => last_form(&kind).map(|body| ApiRequest::last(&body)),
    };
    let request = match request {
        Ok(Ok(request)) => request,
        Ok(Err(err)) => {
            error!(message = "controls.form.unencodable", form = key, %err);
            return;
        }
        Err(err) => {
            mark_invalid(context, form, err);
            return;
        }
    };
    clear_invalid(document, form);
    context.colorize_inputs(ThemeColor::Primary);
    context.request(button, request, |context| {
        context
            .inputs
            .with(|overlay| overlay.hide_overlay(HideOptions::default()));
    });
}

fn offending_input(form: FormKind, err: FormError) -> &'static str {
    match (form, err) {
        (FormKind::Render, FormError::MissingPath) => "item",
        _ => "kind",
    }
}

fn mark_invalid(context: &Context, form: FormKind, err: FormError) {
    let document = &context.document;
    let key = form.key();
    debug!(message = "controls.form.invalid", form = key, %err);
    if let Some(input) = dom::by_id(document, &input_id(key, offending_input(form, err))) {
        dom::add_classes(&input, INVALID_INPUT_CLASSES);
    }
    if let Some(message) = dom::by_id(document, &input_id(key, "error")) {
        message.set_text_content(Some(&err.to_string()));
        dom::remove_classes(&message, [HIDDEN_CLASS]);
    }
    context.colorize_inputs(ThemeColor::Warning);
}

fn clear_invalid(document: &Document, form: FormKind) {
    let key = form.key();
    for input in ["item", "kind"] {
        if let Some(elem) = dom::by_id(document, &input_id(key, input)) {
            dom::remove_classes(&elem, INVALID_INPUT_CLASSES);
        }
    }
    if let Some(message) = dom::by_id(document, &input_id(key, "error")) {
        dom::add_classes(&message, [HIDDEN_CLASS]);
    }
}

fn focus_form(document: &Document, form: FormKind) {
    let input = if form == FormKind::Render { "item" } else { "kind" };
    let Some(elem) = dom::by_id(document, &input_id(form.key(), input)) else {
        return;
    };
    if let Some(elem) = elem.dyn_ref::<HtmlElement>() {
        if let Err(err) = elem.focus() {
            debug!(message = "controls.focus.failed", form = form.key(), err = ?err);
        }
    }
}
