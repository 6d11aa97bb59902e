#![forbid(unsafe_code)]

//! Live render session: consumes render events pushed over the render socket.
//!
//! The session is a two-state machine. The first batch after connecting is
//! assumed to be replayed history ([`BatchPhase::Initial`]); every later
//! batch is live ([`BatchPhase::Steady`]). Replayed events are registered but
//! never flashed or auto-opened.
//!
//! # Per-event ordering
//!
//! For each event of a batch, in arrival order:
//!
//! 1. register the panel and the table row ([`RenderSink::add_render`]);
//! 2. when live: open the panel if the render failed, then flash the row;
//! 3. in reload mode: open the panel if this is the last event of the batch
//!    and it failed (replayed or not);
//! 4. in reload mode, when live and the event produced the current page:
//!    close the socket normally and reload the page, dropping the rest of
//!    the batch;
//! 5. update the banner.
//!
//! After the batch the session becomes `Steady` and the table is scrolled.
//!
//! # Failure Modes
//!
//! - A payload that is `null`, blank, or carries no items changes nothing,
//!   not even the batch phase.
//! - A panel that cannot be registered (duplicate timestamp) is logged and
//!   the event is skipped.
//! - The wire never marks events as replayed. A first batch that arrives
//!   after a live event cannot be told apart from history; this heuristic
//!   is kept as is.

use std::time::Duration;

use livedoc_overlay::{
    Overlay, OverlayStorage, OverlayView, PanelKey, PanelSpec, ShowOptions, ShowOutcome,
};

use crate::error::{SessionError, Stream};
use crate::event::{RenderBatch, RenderEvent, RenderKind, RenderTrigger, decode_batch};
use crate::keepalive::{KEEPALIVE_INTERVAL, KeepaliveToken, SocketPhase};
use crate::requests::{RENDER_SOCKET_PATH, RenderFilter};
use crate::transport::{Connection, Transport};

// ============================================================================
// Configuration
// ============================================================================

/// Settings of one render session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSessionConfig {
    /// History items requested on connect.
    pub last: Option<u32>,
    /// Filter sent as the first message; `None` sends `null`.
    pub filter: Option<RenderFilter>,
    /// Reload the page when it is re-rendered.
    pub reload: bool,
    /// Path of the page hosting the session (`location.pathname`).
    pub page_path: String,
    /// Keepalive ping interval.
    pub keepalive: Duration,
}

impl RenderSessionConfig {
    /// Session for the page at `page_path`, without history, filter, or
    /// reloading.
    pub fn new(page_path: impl Into<String>) -> Self {
        Self {
            last: None,
            filter: None,
            reload: false,
            page_path: page_path.into(),
            keepalive: KEEPALIVE_INTERVAL,
        }
    }

    /// Request `last` items of history.
    pub fn last(mut self, last: u32) -> Self {
        self.last = Some(last);
        self
    }

    /// Send `filter` on open.
    pub fn filter(mut self, filter: RenderFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Enable or disable reload mode.
    pub fn reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    /// Keepalive ping interval.
    pub fn keepalive(mut self, interval: Duration) -> Self {
        self.keepalive = interval;
        self
    }

    /// Socket path, with the history query when requested.
    pub fn socket_url(&self) -> String {
        match self.last {
            Some(last) if last > 0 => format!("{RENDER_SOCKET_PATH}?last={last}"),
            _ => RENDER_SOCKET_PATH.to_owned(),
        }
    }

    /// First message sent once the socket opens.
    pub fn first_message(&self) -> Result<String, SessionError> {
        serde_json::to_string(&self.filter).map_err(SessionError::Encode)
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Collaborators updated by a [`RenderSession`].
///
/// The panel registry and the table row are independent: `add_render` must
/// register the panel even when no table is mounted.
pub trait RenderSink {
    /// Register the detail panel and append the table row for `event`.
    fn add_render(&mut self, event: &RenderEvent) -> Result<(), SessionError>;

    /// Open the overlay on the panel of `event`.
    fn show_panel(&mut self, event: &RenderEvent);

    /// Mark the table row of `event` as new.
    fn flash_row(&mut self, event: &RenderEvent);

    /// Update the banner. `is_new` is false for replayed events.
    fn show_banner(&mut self, _event: &RenderEvent, _is_new: bool) {}

    /// Scroll the table container to its last row.
    fn scroll_to_bottom(&mut self) {}

    /// Navigate to the current page again.
    fn reload_page(&mut self);
}

/// Register the detail panel of `event` with `overlay`.
pub fn register_render_panel<V: OverlayView, S: OverlayStorage>(
    overlay: &mut Overlay<V, S>,
    event: &RenderEvent,
) -> Result<PanelKey, SessionError> {
    let spec = PanelSpec::new(event.panel_key().as_str()).with_theme(event.panel_theme());
    Ok(overlay.add_content(spec)?)
}

/// Open `overlay` on panel `key`, as the row "info" affordance does.
pub fn inspect_panel<V: OverlayView, S: OverlayStorage>(
    overlay: &mut Overlay<V, S>,
    key: &PanelKey,
) -> ShowOutcome {
    overlay.show_overlay();
    overlay.show_content_item(key.as_str(), ShowOptions::default())
}

// ============================================================================
// Session
// ============================================================================

/// Whether the next batch is replayed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Initial,
    Steady,
}

/// What one batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Events in the batch.
    pub events: usize,
    /// Events registered with the sink.
    pub added: usize,
    /// Panels opened, in order (a panel may appear twice).
    pub shown: Vec<PanelKey>,
    /// Rows flashed.
    pub flashed: usize,
    /// Whether the page reload was triggered.
    pub reloaded: bool,
    /// Whether the batch was handled as replayed history.
    pub was_initial: bool,
}

/// Render-event consumer bound to one socket.
#[derive(Debug)]
pub struct RenderSession<T: Transport> {
    config: RenderSessionConfig,
    connection: Connection<T>,
    phase: BatchPhase,
}

impl<T: Transport> RenderSession<T> {
    /// Bind a session to a socket opened at [`RenderSessionConfig::socket_url`].
    pub fn new(config: RenderSessionConfig, transport: T) -> Self {
        let connection = Connection::new(transport, config.keepalive);
        Self {
            config,
            connection,
            phase: BatchPhase::Initial,
        }
    }

    /// Session settings.
    pub fn config(&self) -> &RenderSessionConfig {
        &self.config
    }

    /// Batch phase.
    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// Socket phase.
    pub fn socket_phase(&self) -> SocketPhase {
        self.connection.phase()
    }

    /// The socket and its keepalive.
    pub fn connection(&self) -> &Connection<T> {
        &self.connection
    }

    /// The socket opened: send the filter, then arm the keepalive.
    pub fn on_open(&mut self) -> Result<Option<KeepaliveToken>, SessionError> {
        let first = self.config.first_message()?;
        tracing::debug!(message = "render.open", filter = %first);
        self.connection.on_open(Some(&first))
    }

    /// Keepalive interval fired.
    pub fn on_tick(&mut self, token: KeepaliveToken) -> Result<bool, SessionError> {
        self.connection.on_tick(token)
    }

    /// The socket closed. Returns the interval token to clear.
    pub fn on_close(&mut self) -> Option<KeepaliveToken> {
        tracing::debug!(message = "render.close");
        self.connection.on_close()
    }

    /// Decode and handle one socket message.
    pub fn handle_message(
        &mut self,
        text: &str,
        sink: &mut impl RenderSink,
    ) -> Result<Option<BatchReport>, SessionError> {
        match decode_batch::<RenderEvent>(Stream::Render, text)? {
            Some(batch) => Ok(self.handle_batch(batch, sink)),
            None => Ok(None),
        }
    }

    /// Handle one decoded batch. Returns `None` when it carried no items.
    pub fn handle_batch(
        &mut self,
        batch: RenderBatch,
        sink: &mut impl RenderSink,
    ) -> Option<BatchReport> {
        if batch.is_empty() {
            return None;
        }
        let initial = self.phase == BatchPhase::Initial;
        let count = batch.items.len();
        tracing::debug!(
            message = "render.batch",
            events = count,
            initial,
            target = batch.target.as_deref().unwrap_or_default(),
        );

        let mut report = BatchReport {
            events: count,
            was_initial: initial,
            ..BatchReport::default()
        };
        for (index, event) in batch.items.iter().enumerate() {
            if let Err(err) = sink.add_render(event) {
                tracing::warn!(
                    message = "render.add.failed",
                    timestamp = event.timestamp,
                    error = %err,
                );
                continue;
            }
            report.added += 1;

            if !initial {
                if event.failed() {
                    sink.show_panel(event);
                    report.shown.push(event.panel_key());
                }
                sink.flash_row(event);
                report.flashed += 1;
            }

            if self.config.reload {
                if event.failed() && index + 1 == count {
                    sink.show_panel(event);
                    report.shown.push(event.panel_key());
                }
                if !initial && event.targets_page(&self.config.page_path) {
                    tracing::info!(
                        message = "render.reload",
                        timestamp = event.timestamp,
                        page = %self.config.page_path,
                    );
                    if let Err(err) = self.connection.close_normally() {
                        tracing::error!(message = "render.close.failed", error = %err);
                    }
                    sink.reload_page();
                    report.reloaded = true;
                    break;
                }
            }

            sink.show_banner(event, !initial);
        }

        self.phase = BatchPhase::Steady;
        if !report.reloaded {
            sink.scroll_to_bottom();
        }
        Some(report)
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// One line of a render's detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub text: String,
    /// Color class shared by every line of the panel.
    pub color_class: &'static str,
}

/// Lines of the detail panel for `event`: a header, a spacer, then stdout.
pub fn panel_lines(event: &RenderEvent) -> Vec<TerminalLine> {
    let color_class = if event.failed() { "text-danger" } else { "text-light" };
    let header = [
        format!("Timestamp: {}", event.timestamp),
        format!("Command: {}", event.command.join(",")),
        format!("Origin: {}", event.origin),
        format!("Target: {}", event.target),
        format!("Status: {}", event.status_code),
        String::new(),
    ];
    header
        .into_iter()
        .chain(event.stdout.iter().cloned())
        .map(|text| TerminalLine { text, color_class })
        .collect()
}

/// Classes of the table row for `event`.
pub fn row_classes(event: &RenderEvent) -> Vec<&'static str> {
    let mut classes = vec![
        if event.failed() { "quarto-failure" } else { "quarto-success" },
        "quarto-row",
    ];
    if event.kind == RenderKind::Static {
        classes.push("quarto-static");
    }
    classes
}

/// Color class of the kind cell.
pub fn kind_cell_class(kind: RenderKind) -> Option<&'static str> {
    match kind {
        RenderKind::Direct => Some("text-warning"),
        RenderKind::Deferred => Some("text-primary"),
        RenderKind::Static => None,
    }
}

/// Color class of the trigger cell.
pub fn trigger_cell_class(trigger: RenderTrigger) -> Option<&'static str> {
    (trigger == RenderTrigger::Client).then_some("text-warning")
}

/// Bootstrap file icon and color class for a path, by extension.
pub fn path_icon(path: &str) -> (&'static str, Option<&'static str>) {
    let ext = path.rsplit_once('.').map_or("", |(_, ext)| ext);
    match ext {
        "py" => ("bi-filetype-py", Some("text-yellow")),
        "qmd" => ("bi-filetype-md", Some("text-teal")),
        "html" => ("bi-filetype-html", Some("text-orange")),
        "js" => ("bi-filetype-js", Some("text-green")),
        "scss" => ("bi-filetype-scss", Some("text-pink")),
        "yaml" => ("bi-filetype-yml", Some("text-yellow")),
        "pdf" => ("bi-filetype-pdf", Some("text-red")),
        _ => ("bi-file", None),
    }
}

/// Class toggled by clicking a render row.
pub const ROW_HIGHLIGHT_CLASS: &str = "highlight";

/// One timed class change of a row flash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashStep {
    /// Delay from the start of the flash.
    pub at: Duration,
    pub remove: Vec<&'static str>,
    pub add: Vec<&'static str>,
}

/// "New row" border flash: colored for a second, then black until it fades.
pub fn row_flash(failed: bool) -> [FlashStep; 3] {
    let color = if failed { "border-red" } else { "border-teal" };
    [
        FlashStep {
            at: Duration::ZERO,
            remove: Vec::new(),
            add: vec![color, "border", "border-3"],
        },
        FlashStep {
            at: Duration::from_secs(1),
            remove: vec![color],
            add: vec!["border-black"],
        },
        FlashStep {
            at: Duration::from_secs(30),
            remove: vec!["border-black", "border", "border-3"],
            add: Vec::new(),
        },
    ]
}
