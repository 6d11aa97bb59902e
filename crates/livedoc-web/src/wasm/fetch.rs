#![forbid(unsafe_code)]

//! REST calls to the development API and their response panels.

use livedoc_overlay::PanelKey;
use livedoc_session::controls::present_response;
use livedoc_session::requests::{ApiRequest, ResponseParts, ResponseSummary};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, Request, RequestInit, Response};

use super::dom::{self, js_error};
use super::overlay::OverlayHandle;
use crate::error::WebError;
use crate::markup::{COLOR_ATTR, HIDDEN_CLASS, ITEM_CLASS, KEY_ATTR};

const JSON: &str = "application/json";

/// Send `request` and summarize whatever comes back.
pub(crate) async fn send(request: &ApiRequest) -> Result<ResponseSummary, WebError> {
    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    let headers = js_sys::Object::new();
    for name in ["Content-Type", "Accept"] {
        js_sys::Reflect::set(&headers, &JsValue::from_str(name), &JsValue::from_str(JSON))
            .map_err(js_error)?;
    }
    init.set_headers(&headers);
    if let Some(body) = &request.body {
        init.set_body(&JsValue::from_str(body));
    }
    let fetch_request = Request::new_with_str_and_init(request.url, &init).map_err(js_error)?;

    debug!(message = "api.request", method = request.method.as_str(), url = request.url);
    let response: Response = JsFuture::from(dom::window()?.fetch_with_request(&fetch_request))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    let body = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    debug!(message = "api.response", url = request.url, status = response.status());

    Ok(ResponseSummary::new(
        ResponseParts {
            url: &response.url(),
            status: response.status(),
            status_text: &response.status_text(),
            ok: Some(response.ok()),
            body: &body,
        },
        dom::now_ms(),
    ))
}

/// Panel markup of `summary`: a header with the URL and status line, then
/// the body one terminal row per line.
fn response_panel(
    document: &Document,
    summary: &ResponseSummary,
) -> Result<Element, WebError> {
    let panel = dom::create(document, "div", &[ITEM_CLASS, HIDDEN_CLASS])?;
    panel
        .set_attribute(KEY_ATTR, summary.key.as_str())
        .map_err(js_error)?;
    panel
        .set_attribute(COLOR_ATTR, summary.color.name())
        .map_err(js_error)?;

    let terminal = dom::create(document, "div", &["terminal"])?;
    let head = dom::create(document, "span", &["terminal-row", "text-blue", "text-center"])?;
    dom::append(&head, &dom::create_text(document, "span", &summary.url, &[])?)?;
    dom::append(
        &head,
        &dom::create_text(document, "span", &format!(" {}", summary.status_line), &[])?,
    )?;
    dom::append(&terminal, &head)?;

    let text = summary.text_class();
    dom::append(
        &terminal,
        &dom::create_text(document, "span", " ", &["terminal-row", text])?,
    )?;
    for line in &summary.lines {
        let row = dom::create_text(document, "span", line, &["terminal-row", text, "fw-light"])?;
        dom::append(&terminal, &row)?;
    }
    dom::append(&panel, &terminal)?;
    Ok(panel)
}

/// Add the panel of `summary` to the responses overlay, showing it unless
/// `show` is false.
pub(crate) fn present(
    document: &Document,
    responses: &OverlayHandle,
    summary: &ResponseSummary,
    show: bool,
) -> Result<PanelKey, WebError> {
    let panel = response_panel(document, summary)?;
    responses.append_panel(&summary.key, &panel)?;
    match responses.with(|overlay| present_response(overlay, summary, show)) {
        Ok(key) => Ok(key),
        Err(err) => {
            responses.discard_panel(&summary.key, &panel);
            Err(err.into())
        }
    }
}
