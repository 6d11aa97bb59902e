#![forbid(unsafe_code)]

//! Server-log session: turns pushed log records into table rows.
//!
//! Rows are described, not built: [`LogRow`] carries the text, segments and
//! classes, and the host creates the elements.
//!
//! # Invariants
//!
//! - A row shows its time only when it differs from the previous record of
//!   the same batch; the first row of every batch always shows it.
//! - Access-log and websocket-log messages are split into styled segments;
//!   anything else is kept verbatim.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{SessionError, Stream};
use crate::event::{LogBatch, LogEvent, decode_batch};
use crate::keepalive::{KEEPALIVE_INTERVAL, KeepaliveToken, SocketPhase};
use crate::requests::LOG_SOCKET_PATH;
use crate::transport::{Connection, Transport};

// ============================================================================
// Message shapes
// ============================================================================

static ACCESS_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?<ip>[\d.]+):(?<port>\d+)\s+-\s+"(?<method>[A-Z]+)\s+(?<path>[^\s]+)\s+(?<protocol>HTTP/\d+\.\d+)"\s+(?<status>\d+)"#,
    )
    .expect("access log regex")
});

static WEBSOCKET_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\('(?<ip>[\d.]+)', (?<port>\d+)\) - "WebSocket (?<path>[^"]+)" \[(?<detail>[^\]]+)\]$"#,
    )
    .expect("websocket log regex")
});

// The trailing `.` applies to the last alternative only.
static RENDER_DONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Starting render of `.*`)|(Copying `.*` to `.*`)|(Rendered `.*`).")
        .expect("render regex")
});

static RENDER_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Failed to render `.*`.").expect("failure regex")
});

static RENDER_DEFERRED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Dispatching render of `.*` from changes in `.*`.")
        .expect("dispatch regex")
});

/// One styled piece of a formatted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub class: &'static str,
}

impl Segment {
    fn new(text: impl Into<String>, class: &'static str) -> Self {
        Self {
            text: text.into(),
            class,
        }
    }
}

/// A log message, split into segments when its shape is recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMessage {
    /// `ip:port - "METHOD path HTTP/x.y" status`.
    Access(Vec<Segment>),
    /// `('ip', port) - "WebSocket path" [detail]`.
    WebSocket(Vec<Segment>),
    Plain(String),
}

impl LogMessage {
    /// Classify `message`.
    pub fn parse(message: &str) -> Self {
        if let Some(caps) = ACCESS_LOG.captures(message) {
            let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
            return Self::Access(vec![
                Segment::new(group("ip"), "uvicorn-ip"),
                Segment::new(format!(":{}", group("port")), "uvicorn-port"),
                Segment::new(format!(" {}", group("method")), "uvicorn-method"),
                Segment::new(format!(" {}", group("path")), "uvicorn-path"),
                Segment::new(format!(" {}", group("status")), "uvicorn-status"),
                Segment::new(format!(" {}", group("protocol")), "uvicorn-protocol"),
            ]);
        }
        if let Some(caps) = WEBSOCKET_LOG.captures(message) {
            let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
            return Self::WebSocket(vec![
                Segment::new(group("ip"), "uvicorn-ip"),
                Segment::new(format!(":{}", group("port")), "uvicorn-port"),
                Segment::new(format!(" {}", group("detail").to_uppercase()), "uvicorn-method"),
                Segment::new(format!(" {}", group("path")), "uvicorn-path"),
                Segment::new(" WEBSOCKET", "uvicorn-protocol"),
            ]);
        }
        Self::Plain(message.to_owned())
    }

    /// Segments, empty for plain messages.
    pub fn segments(&self) -> &[Segment] {
        match self {
            Self::Access(segments) | Self::WebSocket(segments) => segments.as_slice(),
            Self::Plain(_) => &[],
        }
    }

    /// Concatenated display text.
    pub fn text(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            _ => self.segments().iter().map(|s| s.text.as_str()).collect(),
        }
    }
}

/// Message color picked from what the line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTone {
    /// A render started, finished, or an asset was copied.
    Rendered,
    /// A render was dispatched from a dependency change.
    Deferred,
    Failed,
    /// Connection chatter.
    Connection,
}

impl MessageTone {
    /// Tone of `message`, if any.
    pub fn of(message: &str) -> Option<Self> {
        if RENDER_DONE.is_match(message) {
            Some(Self::Rendered)
        } else if RENDER_DEFERRED.is_match(message) {
            Some(Self::Deferred)
        } else if RENDER_FAILED.is_match(message) {
            Some(Self::Failed)
        } else if message.starts_with("connection") {
            Some(Self::Connection)
        } else {
            None
        }
    }

    /// CSS color value.
    pub fn css_color(self) -> &'static str {
        match self {
            Self::Rendered => "var(--bs-green)",
            Self::Deferred => "var(--bs-blue)",
            Self::Failed => "var(--bs-red)",
            Self::Connection => "var(--bs-gray-600)",
        }
    }
}

// ============================================================================
// Rows
// ============================================================================

/// Display description of one log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    /// `[created_time]`, or `None` when repeated from the previous row.
    pub time: Option<String>,
    pub level: String,
    /// Lower-cased level name.
    pub level_class: String,
    pub message: LogMessage,
    pub tone: Option<MessageTone>,
    /// `logger:line`.
    pub name: String,
}

impl LogRow {
    /// Describe `event`, hiding the time when it repeats `previous`.
    pub fn new(event: &LogEvent, previous: Option<&LogEvent>) -> Self {
        let repeated = previous.is_some_and(|prev| prev.created_time == event.created_time);
        Self {
            time: (!repeated).then(|| format!("[{}]", event.created_time)),
            level: event.level_name.clone(),
            level_class: event.level_name.to_lowercase(),
            message: LogMessage::parse(&event.message),
            tone: MessageTone::of(&event.message),
            name: format!("{}:{}", event.logger_name, event.line_number),
        }
    }
}

/// Rows for one batch.
pub fn format_batch(items: &[LogEvent]) -> Vec<LogRow> {
    items
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let previous = index.checked_sub(1).and_then(|i| items.get(i));
            LogRow::new(event, previous)
        })
        .collect()
}

/// Click-toggled highlight of a log row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowHighlight {
    on: bool,
}

impl RowHighlight {
    /// Classes added while highlighted.
    pub const CLASSES: [&'static str; 3] = ["border", "border-1", "border-yellow"];

    /// Flip; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }

    /// Whether the row is highlighted.
    pub fn is_on(self) -> bool {
        self.on
    }
}

// ============================================================================
// Session
// ============================================================================

/// Collaborator of a [`LogSession`].
pub trait LogSink {
    /// Append one row to the table.
    fn append_row(&mut self, row: LogRow);

    /// Scroll the table container to its last row.
    fn scroll_to_bottom(&mut self) {}
}

/// Server-log consumer bound to one socket.
#[derive(Debug)]
pub struct LogSession<T: Transport> {
    connection: Connection<T>,
}

impl<T: Transport> LogSession<T> {
    /// Socket path.
    pub const SOCKET_URL: &'static str = LOG_SOCKET_PATH;

    /// Bind a session to a socket opened at [`Self::SOCKET_URL`].
    pub fn new(transport: T) -> Self {
        Self::with_interval(transport, KEEPALIVE_INTERVAL)
    }

    /// Bind a session with a custom keepalive interval.
    pub fn with_interval(transport: T, interval: Duration) -> Self {
        Self {
            connection: Connection::new(transport, interval),
        }
    }

    /// The socket and its keepalive.
    pub fn connection(&self) -> &Connection<T> {
        &self.connection
    }

    /// Socket phase.
    pub fn socket_phase(&self) -> SocketPhase {
        self.connection.phase()
    }

    /// The socket opened. Nothing is sent before the first ping.
    pub fn on_open(&mut self) -> Result<Option<KeepaliveToken>, SessionError> {
        tracing::debug!(message = "log.open");
        self.connection.on_open(None)
    }

    /// Keepalive interval fired.
    pub fn on_tick(&mut self, token: KeepaliveToken) -> Result<bool, SessionError> {
        self.connection.on_tick(token)
    }

    /// The socket closed. Returns the interval token to clear.
    pub fn on_close(&mut self) -> Option<KeepaliveToken> {
        tracing::debug!(message = "log.close");
        self.connection.on_close()
    }

    /// Decode and handle one message. Returns the number of rows appended.
    pub fn handle_message(
        &mut self,
        text: &str,
        sink: &mut impl LogSink,
    ) -> Result<usize, SessionError> {
        Ok(decode_batch::<LogEvent>(Stream::Log, text)?
            .map_or(0, |batch| self.handle_batch(&batch, sink)))
    }

    /// Append the rows of `batch`.
    pub fn handle_batch(&mut self, batch: &LogBatch, sink: &mut impl LogSink) -> usize {
        let rows = format_batch(&batch.items);
        let count = rows.len();
        for row in rows {
            sink.append_row(row);
        }
        if count > 0 {
            tracing::trace!(message = "log.batch", rows = count);
            sink.scroll_to_bottom();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;
    use pretty_assertions::assert_eq;

    fn log(time: &str, msg: &str) -> LogEvent {
        LogEvent {
            created_time: time.into(),
            level_name: "INFO".into(),
            logger_name: "uvicorn.access".into(),
            line_number: 12,
            message: msg.into(),
        }
    }

    #[test]
    fn access_log_is_segmented() {
        let message = LogMessage::parse(r#"127.0.0.1:53412 - "GET /posts/a/ HTTP/1.1" 200"#);
        let texts: Vec<&str> = message.segments().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["127.0.0.1", ":53412", " GET", " /posts/a/", " 200", " HTTP/1.1"]);
        assert!(matches!(message, LogMessage::Access(_)));
    }

    #[test]
    fn websocket_log_is_segmented() {
        let message = LogMessage::parse(r#"('127.0.0.1', 50432) - "WebSocket /api/dev/log" [accepted]"#);
        assert_eq!(message.text(), "127.0.0.1:50432 ACCEPTED /api/dev/log WEBSOCKET");
        assert_eq!(message.segments()[2].class, "uvicorn-method");
    }

    #[test]
    fn other_messages_stay_plain() {
        let message = LogMessage::parse("Application startup complete.");
        assert_eq!(message, LogMessage::Plain("Application startup complete.".into()));
        assert!(message.segments().is_empty());
    }

    #[test]
    fn tones_follow_message_patterns() {
        assert_eq!(MessageTone::of("Rendered `a.qmd`."), Some(MessageTone::Rendered));
        assert_eq!(MessageTone::of("Starting render of `a.qmd`"), Some(MessageTone::Rendered));
        assert_eq!(
            MessageTone::of("Dispatching render of `a.qmd` from changes in `b.py`."),
            Some(MessageTone::Deferred)
        );
        assert_eq!(MessageTone::of("Failed to render `a.qmd`."), Some(MessageTone::Failed));
        assert_eq!(MessageTone::of("connection open"), Some(MessageTone::Connection));
        assert_eq!(MessageTone::of("nothing"), None);
        assert_eq!(MessageTone::Failed.css_color(), "var(--bs-red)");
    }

    #[test]
    fn repeated_times_are_hidden_within_a_batch() {
        let rows = format_batch(&[
            log("12:00:00", "a"),
            log("12:00:00", "b"),
            log("12:00:01", "c"),
            log("12:00:00", "d"),
        ]);
        let times: Vec<Option<&str>> = rows.iter().map(|r| r.time.as_deref()).collect();
        assert_eq!(
            times,
            vec![Some("[12:00:00]"), None, Some("[12:00:01]"), Some("[12:00:00]")]
        );
        assert_eq!(rows[0].name, "uvicorn.access:12");
        assert_eq!(rows[0].level_class, "info");
    }

    #[test]
    fn highlight_toggles() {
        let mut highlight = RowHighlight::default();
        assert!(highlight.toggle());
        assert!(!highlight.toggle());
        assert!(!highlight.is_on());
    }

    #[derive(Default)]
    struct Rows(Vec<LogRow>, usize);

    impl LogSink for Rows {
        fn append_row(&mut self, row: LogRow) {
            self.0.push(row);
        }
        fn scroll_to_bottom(&mut self) {
            self.1 += 1;
        }
    }

    #[test]
    fn session_sends_nothing_on_open_and_restarts_dedup_per_batch() {
        let mut session = LogSession::new(RecordingTransport::new());
        session.on_open().expect("open");
        assert!(session.connection().transport().sent().is_empty());

        let mut rows = Rows::default();
        let one = r#"{"items": [{"created_time": "t", "levelname": "INFO", "name": "x", "lineno": 1, "msg": "a"}]}"#;
        assert_eq!(session.handle_message(one, &mut rows).expect("batch"), 1);
        assert_eq!(session.handle_message(one, &mut rows).expect("batch"), 1);
        assert_eq!(session.handle_message("null", &mut rows).expect("null"), 0);
        assert_eq!(rows.0[1].time.as_deref(), Some("[t]"));
        assert_eq!(rows.1, 2);
    }
}
