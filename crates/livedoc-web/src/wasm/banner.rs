#![forbid(unsafe_code)]

//! The render banner pinned to the bottom of the page.

use livedoc_session::RenderEvent;
use livedoc_session::banner::{BANNER_EMPTY_TEXT, BANNER_ID, BANNER_NEW_CLASS, Banner};
use tracing::warn;
use web_sys::{Document, Element, Node};

use super::dom;
use crate::error::WebError;

/// Banner element and the model deciding what it shows.
pub(crate) struct BannerView {
    document: Document,
    elem: Element,
    text: Element,
    model: Banner,
}

impl BannerView {
    /// Build the banner around `controls` and append it to the body.
    pub(crate) fn mount(document: &Document, controls: Option<&Element>) -> Result<Self, WebError> {
        let elem = dom::create(document, "div", &[])?;
        elem.set_id(BANNER_ID);
        let content = dom::create(document, "div", &["banner-content"])?;
        if let Some(controls) = controls {
            dom::append(&content, controls)?;
        }

        let text_wrapper = dom::create(document, "div", &["banner-text"])?;
        let text = dom::create_text(document, "div", BANNER_EMPTY_TEXT, &["banner-text-container"])?;
        dom::append(&text_wrapper, &text)?;
        dom::append(&content, &text_wrapper)?;
        dom::append(&elem, &content)?;

        let body = document.body().ok_or_else(|| WebError::missing("body"))?;
        body.append_child(&elem).map_err(dom::js_error)?;
        Ok(Self {
            document: document.clone(),
            elem,
            text,
            model: Banner::new(),
        })
    }

    /// Show `event`; live events flash the banner.
    pub(crate) fn show(&mut self, event: &RenderEvent, is_new: bool) {
        let update = self.model.show(event, is_new);
        let message = &update.message;
        if let Err(err) = self.render_text(&message.time, &message.target, &message.origin) {
            warn!(message = "banner.render.failed", %err);
        }
        dom::remove_classes(&self.elem, [update.remove]);
        dom::add_classes(&self.elem, [update.add]);

        let Some(flash) = update.flash else {
            return;
        };
        dom::add_classes(&self.elem, [BANNER_NEW_CLASS]);
        let elem = self.elem.clone();
        let unflash = move || dom::remove_classes(&elem, [BANNER_NEW_CLASS]);
        if let Err(err) = dom::set_timeout(flash, unflash) {
            warn!(message = "banner.flash.unscheduled", %err);
        }
    }

    fn render_text(&self, time: &str, target: &str, origin: &str) -> Result<(), WebError> {
        let document = &self.document;
        let text = |content: &str| -> Node { document.create_text_node(content).into() };
        let time: Node = dom::create_text(document, "code", time, &["fw-bolder"])?.into();
        let pieces = [
            text("Last rendered "),
            path_code(document, target)?,
            text(" at "),
            time,
            text(" from changes in "),
            path_code(document, origin)?,
            text("."),
        ];
        self.text.set_text_content(None);
        for piece in &pieces {
            self.text.append_child(piece).map_err(dom::js_error)?;
        }
        Ok(())
    }
}

fn path_code(document: &Document, path: &str) -> Result<Node, WebError> {
    let elem = dom::path_element(document, path, "span", "code", "px-1")?;
    dom::add_classes(&elem, ["bg-black"]);
    Ok(elem.into())
}
