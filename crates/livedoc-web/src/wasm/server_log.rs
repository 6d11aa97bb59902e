#![forbid(unsafe_code)]

//! Server log rows in the page.

use livedoc_session::{ElementConfig, LogRow, LogSink, RowHighlight, ServerConfig};
use tracing::{debug, error};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use super::dom::{self, Listener};
use crate::error::WebError;

/// [`LogSink`] appending to the server log table.
pub(crate) struct LogTable {
    document: Document,
    body: Element,
    container: Element,
    listeners: Vec<Listener>,
}

impl LogTable {
    /// Bind to the table and container of `config`; both must exist.
    pub(crate) fn new(document: &Document, config: &ServerConfig) -> Result<Self, WebError> {
        let table = require(document, &config.table)?;
        let body = dom::query(&table, "tbody")
            .ok_or_else(|| WebError::missing(format!("#{} tbody", config.table.identifier)))?;
        let container = require(document, &config.container)?;
        Ok(Self {
            document: document.clone(),
            body,
            container,
            listeners: Vec::new(),
        })
    }

    fn row(&mut self, row: &LogRow) -> Result<Element, WebError> {
        let document = &self.document;
        let elem = dom::create(document, "tr", &["terminal-row"])?;
        let time = dom::create_text(
            document,
            "td",
            row.time.as_deref().unwrap_or_default(),
            &["terminal-row-time"],
        )?;
        let level = dom::create_text(document, "td", &row.level, &["terminal-row-level", row.level_class.as_str()])?;

        let message = dom::create(document, "td", &["terminal-row-msg"])?;
        let segments = row.message.segments();
        if segments.is_empty() {
            message.set_text_content(Some(&row.message.text()));
        }
        for segment in segments {
            dom::append(&message, &dom::create_text(document, "span", &segment.text, &[segment.class])?)?;
        }
        if let Some(tone) = row.tone {
            if let Some(message) = message.dyn_ref::<HtmlElement>() {
                if let Err(err) = message.style().set_property("color", tone.css_color()) {
                    debug!(message = "server_log.tone.failed", err = ?err);
                }
            }
        }
        let name = dom::create_text(document, "td", &row.name, &["terminal-row-name", "text-dark"])?;
        for cell in [&time, &level, &message, &name] {
            dom::append(&elem, cell)?;
        }

        let target = elem.clone();
        let mut highlight = RowHighlight::default();
        self.listeners.push(Listener::new(&elem, "click", move |_| {
            if highlight.toggle() {
                dom::add_classes(&target, RowHighlight::CLASSES);
            } else {
                dom::remove_classes(&target, RowHighlight::CLASSES);
            }
        })?);
        Ok(elem)
    }
}

impl LogSink for LogTable {
    fn append_row(&mut self, row: LogRow) {
        let appended = match self.row(&row) {
            Ok(elem) => dom::append(&self.body, &elem),
            Err(err) => Err(err),
        };
        if let Err(err) = appended {
            error!(message = "log.row.failed", %err);
        }
    }

    fn scroll_to_bottom(&mut self) {
        dom::scroll_to_bottom(&self.container);
    }
}

fn require(document: &Document, config: &ElementConfig) -> Result<Element, WebError> {
    let elem = dom::require_id(document, &config.identifier)?;
    dom::add_classes(&elem, config.classes.iter().map(String::as_str));
    Ok(elem)
}
