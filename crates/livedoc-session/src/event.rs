#![forbid(unsafe_code)]

//! Wire entities pushed by the development server.
//!
//! Both sockets deliver `{"items": [...]} | null`. Render batches may also
//! carry the `target` that triggered them.

use std::fmt;

use livedoc_overlay::{ColorizeOptions, PanelKey, ThemeColor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, Stream};

// ============================================================================
// Render events
// ============================================================================

/// How a render was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderKind {
    /// Dispatched because a dependency changed. The server spells it `defered`.
    #[serde(rename = "defered", alias = "deferred")]
    Deferred,
    /// The changed document itself.
    #[default]
    #[serde(rename = "direct")]
    Direct,
    /// A static asset copied into the site.
    #[serde(rename = "static")]
    Static,
}

impl RenderKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Direct => "direct",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for RenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who asked for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTrigger {
    /// A browser request.
    Client,
    /// The server's file watcher.
    #[default]
    Lifespan,
}

impl RenderTrigger {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Lifespan => "lifespan",
        }
    }
}

/// One build / render outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderEvent {
    /// Unique, used as the panel key.
    pub timestamp: i64,
    /// Human-readable time.
    pub time: String,
    /// Source file whose change caused the render.
    pub origin: String,
    /// Build artifact.
    pub target: String,
    /// Served URL of the artifact, when it has one.
    pub target_url_path: Option<String>,
    pub kind: RenderKind,
    #[serde(rename = "item_from", alias = "from")]
    pub trigger: RenderTrigger,
    /// Zero on success.
    pub status_code: i64,
    pub command: Vec<String>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl RenderEvent {
    /// Whether the render failed.
    #[inline]
    pub fn failed(&self) -> bool {
        self.status_code != 0
    }

    /// Key of the overlay panel holding this event.
    pub fn panel_key(&self) -> PanelKey {
        PanelKey::from(self.timestamp)
    }

    /// Whether this render produced the page at `page_path`, either exactly or
    /// through an implicit `index.html`.
    pub fn targets_page(&self, page_path: &str) -> bool {
        let Some(url) = self.target_url_path.as_deref() else {
            return false;
        };
        url == page_path
            || url
                .strip_prefix(page_path)
                .is_some_and(|rest| rest == "index.html")
    }

    /// Theme of the detail panel: red on failure, blue for static assets,
    /// teal otherwise.
    pub fn panel_color(&self) -> ThemeColor {
        if self.failed() {
            ThemeColor::Danger
        } else if self.kind == RenderKind::Static {
            ThemeColor::Primary
        } else {
            ThemeColor::Teal
        }
    }

    /// Theme hint for the detail panel.
    pub fn panel_theme(&self) -> ColorizeOptions {
        ColorizeOptions::color(self.panel_color())
    }
}

// ============================================================================
// Log events
// ============================================================================

/// One structured log line from the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEvent {
    pub created_time: String,
    #[serde(rename = "levelname")]
    pub level_name: String,
    #[serde(rename = "name")]
    pub logger_name: String,
    #[serde(rename = "lineno")]
    pub line_number: i64,
    #[serde(rename = "msg")]
    pub message: String,
}

// ============================================================================
// Batches
// ============================================================================

/// `{"items": [...], "target"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            target: None,
        }
    }
}

impl<T> Batch<T> {
    /// A batch of `items` with no target.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            target: None,
        }
    }

    /// Whether the batch carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub type RenderBatch = Batch<RenderEvent>;
pub type LogBatch = Batch<LogEvent>;

/// Decode a socket message. `null` and blank text decode to `None`.
pub fn decode_batch<T: DeserializeOwned>(
    stream: Stream,
    text: &str,
) -> Result<Option<Batch<T>>, SessionError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<Batch<T>>>(text)
        .map_err(|source| SessionError::Decode { stream, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(url: Option<&str>) -> RenderEvent {
        RenderEvent {
            target_url_path: url.map(str::to_owned),
            ..RenderEvent::default()
        }
    }

    #[test]
    fn render_event_accepts_server_spellings() {
        let json = r#"{
            "timestamp": 1732000000,
            "time": "12:00:00",
            "origin": "blog/posts/a/index.qmd",
            "target": "blog/posts/a/index.qmd",
            "target_url_path": "/posts/a/index.html",
            "kind": "defered",
            "from": "client",
            "status_code": 1,
            "command": ["quarto", "render"],
            "stdout": ["ERROR"],
            "stderr": []
        }"#;
        let event: RenderEvent = serde_json::from_str(json).expect("valid event");
        assert_eq!(event.kind, RenderKind::Deferred);
        assert_eq!(event.trigger, RenderTrigger::Client);
        assert!(event.failed());
        assert_eq!(event.panel_key().as_str(), "1732000000");
        assert_eq!(event.panel_color(), ThemeColor::Danger);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let event: RenderEvent =
            serde_json::from_str(r#"{"timestamp": 3, "item_from": "lifespan", "kind": "deferred"}"#)
                .expect("sparse event");
        assert_eq!(event.kind, RenderKind::Deferred);
        assert_eq!(event.target_url_path, None);
        assert!(!event.failed());
        assert_eq!(event.panel_color(), ThemeColor::Teal);
    }

    #[test]
    fn page_match_allows_implicit_index() {
        assert!(event(Some("/posts/a/index.html")).targets_page("/posts/a/"));
        assert!(event(Some("/posts/a/")).targets_page("/posts/a/"));
        assert!(!event(Some("/posts/a/other.html")).targets_page("/posts/a/"));
        assert!(!event(Some("/posts/ab/index.html")).targets_page("/posts/a/"));
        assert!(!event(None).targets_page("/posts/a/"));
    }

    #[test]
    fn static_success_is_primary() {
        let event = RenderEvent {
            kind: RenderKind::Static,
            ..RenderEvent::default()
        };
        assert_eq!(event.panel_color(), ThemeColor::Primary);
    }

    #[test]
    fn log_event_uses_wire_names() {
        let json = r#"{"created_time": "2024-01-01 00:00:00", "levelname": "INFO",
            "name": "uvicorn.access", "lineno": 42, "msg": "hello", "levelno": 20}"#;
        let event: LogEvent = serde_json::from_str(json).expect("valid log");
        assert_eq!(event.level_name, "INFO");
        assert_eq!(event.logger_name, "uvicorn.access");
        assert_eq!(event.line_number, 42);
        assert_eq!(event.message, "hello");
    }

    #[test]
    fn null_and_blank_payloads_are_no_data() {
        assert_eq!(decode_batch::<LogEvent>(Stream::Log, "null").expect("null"), None);
        assert_eq!(decode_batch::<LogEvent>(Stream::Log, "  ").expect("blank"), None);
        let batch = decode_batch::<RenderEvent>(Stream::Render, "{}")
            .expect("object")
            .expect("some");
        assert!(batch.is_empty());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_batch::<RenderEvent>(Stream::Render, "{items:").unwrap_err();
        assert!(matches!(err, SessionError::Decode { stream: Stream::Render, .. }));
    }
}
