#![forbid(unsafe_code)]

//! Render events in the page: detail panels in the renders overlay, rows
//! in the render table, and the banner.

use std::collections::HashMap;

use livedoc_session::render::{
    FlashStep, ROW_HIGHLIGHT_CLASS, inspect_panel, kind_cell_class, panel_lines,
    register_render_panel, row_classes, row_flash, trigger_cell_class,
};
use livedoc_session::requests::{ApiRequest, RenderRequest, RenderTarget};
use livedoc_session::{ElementConfig, RenderEvent, RenderSink, SessionError};
use tracing::{debug, error, warn};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element};

use super::banner::BannerView;
use super::controls::Busy;
use super::dom::{self, Listener, js_error};
use super::fetch;
use super::overlay::OverlayHandle;
use crate::error::WebError;
use crate::markup::{COLOR_ATTR, HIDDEN_CLASS, ITEM_CLASS, KEY_ATTR, PANEL_SCROLL_DELAY};

/// [`RenderSink`] writing into the page.
pub(crate) struct RenderDashboard {
    document: Document,
    renders: OverlayHandle,
    responses: OverlayHandle,
    table_body: Option<Element>,
    container: Option<Element>,
    banner: Option<BannerView>,
    page_path: String,
    rows: HashMap<i64, Element>,
    listeners: Vec<Listener>,
}

impl RenderDashboard {
    /// Bind to the table described by `table` when the page has one. With
    /// `create_table` a missing table is created inside the container.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        document: &Document,
        renders: OverlayHandle,
        responses: OverlayHandle,
        table: &ElementConfig,
        container: &ElementConfig,
        create_table: bool,
        banner: Option<BannerView>,
        page_path: String,
    ) -> Result<Self, WebError> {
        let container = dom::by_id(document, &container.identifier);
        let table_body = match dom::by_id(document, &table.identifier) {
            Some(table) => dom::query(&table, "tbody"),
            None if create_table => match &container {
                Some(container) => Some(create_table_in(document, container, table)?),
                None => None,
            },
            None => None,
        };
        if table_body.is_none() {
            debug!(message = "render.table.absent", table = %table.identifier);
        }
        Ok(Self {
            document: document.clone(),
            renders,
            responses,
            table_body,
            container,
            banner,
            page_path,
            rows: HashMap::new(),
            listeners: Vec::new(),
        })
    }

    fn render_panel(&self, event: &RenderEvent) -> Result<Element, WebError> {
        let document = &self.document;
        let panel = dom::create(document, "div", &[ITEM_CLASS, HIDDEN_CLASS])?;
        panel
            .set_attribute(KEY_ATTR, event.panel_key().as_str())
            .map_err(js_error)?;
        panel
            .set_attribute(COLOR_ATTR, event.panel_color().name())
            .map_err(js_error)?;
        let terminal = dom::create(document, "code", &["terminal", "p-3"])?;
        for line in panel_lines(event) {
            let row = dom::create_text(document, "span", &line.text, &["terminal-row", line.color_class])?;
            dom::append(&terminal, &row)?;
        }
        dom::append(&panel, &terminal)?;
        Ok(panel)
    }

    fn append_row(&mut self, event: &RenderEvent) -> Result<(), WebError> {
        let Some(body) = &self.table_body else {
            return Ok(());
        };
        let document = &self.document;
        let row = dom::create(document, "tr", &row_classes(event))?;
        row.set_attribute(KEY_ATTR, event.panel_key().as_str())
            .map_err(js_error)?;

        let info = cell_with_icon(document, "quarto-log-info", "bi-info-circle")?;
        let render = cell_with_icon(document, "quarto-log-render", "bi-arrow-repeat")?;
        let kind = dom::create_text(document, "td", event.kind.name(), &["quarto-log-kind"])?;
        if let Some(class) = kind_cell_class(event.kind) {
            dom::add_classes(&kind, [class]);
        }
        let from = dom::create_text(document, "td", event.trigger.name(), &["quarto-log-from"])?;
        if let Some(class) = trigger_cell_class(event.trigger) {
            dom::add_classes(&from, [class]);
        }
        let time = dom::create_text(document, "td", &event.time, &["quarto-log-time"])?;
        let url = path_cell(
            document,
            "quarto-log-target-url-path",
            event.target_url_path.as_deref().unwrap_or_default(),
            "a",
        )?;
        let target = path_cell(document, "quarto-log-target", &event.target, "p")?;
        let origin = path_cell(document, "quarto-log-origin", &event.origin, "p")?;
        for cell in [&info, &render, &kind, &from, &time, &url, &target, &origin] {
            dom::append(&row, cell)?;
        }
        dom::append(body, &row)?;

        let renders = self.renders.clone();
        let key = event.panel_key();
        self.listeners.push(Listener::new(&info, "click", move |_| {
            renders.with(|overlay| inspect_panel(overlay, &key));
            scroll_later(&renders);
        })?);

        let responses = self.responses.clone();
        let document = self.document.clone();
        let page_path = self.page_path.clone();
        let target_path = event.target.clone();
        let button = render.clone();
        self.listeners.push(Listener::new(&render, "click", move |_| {
            let request = RenderRequest::new(vec![RenderTarget::from(target_path.as_str())], &page_path);
            let responses = responses.clone();
            let document = document.clone();
            let busy = Busy::start(&document, &button);
            spawn_local(async move {
                if let Err(err) = rerender(&document, &responses, &request).await {
                    error!(message = "render.rerender.failed", %err);
                }
                drop(busy);
            });
        })?);

        let highlighted = row.clone();
        self.listeners.push(Listener::new(&row, "click", move |_| {
            if let Err(err) = highlighted.class_list().toggle(ROW_HIGHLIGHT_CLASS) {
                debug!(message = "render.row.highlight_failed", err = ?err);
            }
        })?);

        self.rows.insert(event.timestamp, row);
        Ok(())
    }

    fn flash(&self, row: &Element, step: FlashStep) {
        if step.at.is_zero() {
            dom::remove_classes(row, step.remove);
            dom::add_classes(row, step.add);
            return;
        }
        let row = row.clone();
        let at = step.at;
        let apply = move || {
            dom::remove_classes(&row, step.remove);
            dom::add_classes(&row, step.add);
        };
        if let Err(err) = dom::set_timeout(at, apply) {
            warn!(message = "render.flash.unscheduled", %err);
        }
    }
}

impl RenderSink for RenderDashboard {
    fn add_render(&mut self, event: &RenderEvent) -> Result<(), SessionError> {
        let placement = |err: WebError| SessionError::Placement {
            key: event.panel_key().to_string(),
            reason: err.to_string(),
        };
        let panel = self.render_panel(event).map_err(placement)?;
        if let Err(err) = self.renders.append_panel(&event.panel_key(), &panel) {
            panel.remove();
            return Err(placement(err));
        }
        if let Err(err) = self.renders.with(|overlay| register_render_panel(overlay, event)) {
            self.renders.discard_panel(&event.panel_key(), &panel);
            return Err(err);
        }
        if let Err(err) = self.append_row(event) {
            error!(message = "render.row.failed", timestamp = event.timestamp, %err);
        }
        Ok(())
    }

    fn show_panel(&mut self, event: &RenderEvent) {
        self.renders
            .with(|overlay| inspect_panel(overlay, &event.panel_key()));
        scroll_later(&self.renders);
    }

    fn flash_row(&mut self, event: &RenderEvent) {
        let Some(row) = self.rows.get(&event.timestamp) else {
            return;
        };
        for step in row_flash(event.failed()) {
            self.flash(row, step);
        }
    }

    fn show_banner(&mut self, event: &RenderEvent, is_new: bool) {
        if let Some(banner) = &mut self.banner {
            banner.show(event, is_new);
        }
    }

    fn scroll_to_bottom(&mut self) {
        if let Some(container) = &self.container {
            dom::scroll_to_bottom(container);
        }
    }

    fn reload_page(&mut self) {
        let reloaded = dom::window().and_then(|window| window.location().reload().map_err(js_error));
        if let Err(err) = reloaded {
            error!(message = "render.reload.failed", %err);
        }
    }
}

async fn rerender(
    document: &Document,
    responses: &OverlayHandle,
    request: &RenderRequest,
) -> Result<(), WebError> {
    let summary = fetch::send(&ApiRequest::render(request)?).await?;
    fetch::present(document, responses, &summary, false)?;
    Ok(())
}

fn scroll_later(renders: &OverlayHandle) {
    let renders = renders.clone();
    if let Err(err) = dom::set_timeout(PANEL_SCROLL_DELAY, move || renders.scroll_items_to_bottom()) {
        warn!(message = "render.scroll.unscheduled", %err);
    }
}

fn cell_with_icon(document: &Document, class: &str, icon: &str) -> Result<Element, WebError> {
    let cell = dom::create(document, "td", &[class])?;
    dom::append(&cell, &dom::create(document, "i", &["bi", icon])?)?;
    Ok(cell)
}

fn path_cell(document: &Document, class: &str, path: &str, wrapper: &str) -> Result<Element, WebError> {
    let cell = dom::create(document, "td", &[class])?;
    if !path.is_empty() {
        dom::append(&cell, &dom::path_element(document, path, wrapper, "text", "px-3")?)?;
    }
    Ok(cell)
}

fn create_table_in(
    document: &Document,
    container: &Element,
    table: &ElementConfig,
) -> Result<Element, WebError> {
    let elem = dom::create(document, "table", &[])?;
    elem.set_id(&table.identifier);
    dom::add_classes(&elem, table.classes.iter().map(String::as_str));
    let body = dom::create(document, "tbody", &[])?;
    dom::append(&elem, &body)?;
    dom::append(container, &elem)?;
    Ok(body)
}
