#![forbid(unsafe_code)]

//! REST request bodies for the development API, and summaries of their
//! responses for display in the responses overlay.

use livedoc_overlay::{ColorizeOptions, PanelKey, ThemeColor};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::event::RenderKind;

/// Render-event socket.
pub const RENDER_SOCKET_PATH: &str = "/api/dev/quarto";
/// Server-log socket.
pub const LOG_SOCKET_PATH: &str = "/api/dev/log";
/// `POST`: render targets.
pub const RENDER_ENDPOINT: &str = "/api/dev/quarto/render";
/// `POST`: filtered render history. `DELETE`: clear renders.
pub const HISTORY_ENDPOINT: &str = "/api/dev/quarto";
/// `POST`: most recent render.
pub const LAST_ENDPOINT: &str = "/api/dev/quarto/last";
/// `DELETE`: clear server logs.
pub const LOG_ENDPOINT: &str = "/api/dev/log";

// ============================================================================
// Bodies
// ============================================================================

/// What a render target path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    File,
    Directory,
}

/// One render target: a bare path, or a path with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderTarget {
    Path(String),
    Item {
        path: String,
        #[serde(default)]
        kind: TargetKind,
    },
}

impl From<&str> for RenderTarget {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

/// Body of `POST /api/dev/quarto/render`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub items: Vec<RenderTarget>,
    /// Stop the batch at the first failed render.
    ///
    /// Wire-only: the dashboard never sets it, so it is omitted from every
    /// body built here. Bodies from other clients keep it when decoded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exit_on_failure: bool,
}

impl RenderRequest {
    /// Render `items`, or the page at `current_path` when none are given.
    pub fn new(items: Vec<RenderTarget>, current_path: &str) -> Self {
        let items = if items.is_empty() {
            vec![RenderTarget::from(current_path)]
        } else {
            items
        };
        Self {
            items,
            exit_on_failure: false,
        }
    }
}

/// Render-history filter; also the first message on the render socket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<String>>,
    /// `Some(true)` keeps only failures, `Some(false)` only successes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<Vec<RenderKind>>,
}

impl RenderFilter {
    /// Filter on `targets`.
    pub fn targets(targets: Vec<String>) -> Self {
        Self {
            targets: Some(targets),
            ..Self::default()
        }
    }

    /// Whether every field is unset (matches everything).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of `POST /api/dev/quarto/last`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LastRequest {
    pub kind: Vec<RenderKind>,
}

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Delete,
}

impl Method {
    /// Method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// A fully described API call, ready for the host's HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: &'static str,
    /// JSON body.
    pub body: Option<String>,
}

impl ApiRequest {
    fn post(url: &'static str, body: &impl Serialize) -> Result<Self, SessionError> {
        let body = serde_json::to_string(body).map_err(SessionError::Encode)?;
        Ok(Self {
            method: Method::Post,
            url,
            body: Some(body),
        })
    }

    fn delete(url: &'static str) -> Self {
        Self {
            method: Method::Delete,
            url,
            body: None,
        }
    }

    /// Trigger a render.
    pub fn render(request: &RenderRequest) -> Result<Self, SessionError> {
        Self::post(RENDER_ENDPOINT, request)
    }

    /// Fetch render history.
    pub fn history(filter: &RenderFilter) -> Result<Self, SessionError> {
        Self::post(HISTORY_ENDPOINT, filter)
    }

    /// Fetch the most recent render.
    pub fn last(request: &LastRequest) -> Result<Self, SessionError> {
        Self::post(LAST_ENDPOINT, request)
    }

    /// Clear stored renders.
    pub fn clear_renders() -> Self {
        Self::delete(HISTORY_ENDPOINT)
    }

    /// Clear stored server logs.
    pub fn clear_logs() -> Self {
        Self::delete(LOG_ENDPOINT)
    }
}

// ============================================================================
// Response summaries
// ============================================================================

/// Text of the placeholder shown when no request has been made yet.
pub const PLACEHOLDER_BODY: &str =
    r#"{"msg": "No responses yet.", "note": "Make a request to and you'll see responses here."}"#;

/// A response as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseParts<'a> {
    pub url: &'a str,
    pub status: u16,
    pub status_text: &'a str,
    /// `None` when the outcome is not known.
    pub ok: Option<bool>,
    pub body: &'a str,
}

/// Display-ready summary of an API response, shown as its own panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub key: PanelKey,
    pub url: String,
    pub status_line: String,
    pub color: ThemeColor,
    pub lines: Vec<String>,
    /// Whether the body parsed as JSON.
    pub is_json: bool,
}

impl ResponseSummary {
    /// Summarize a response received at `now_ms` (milliseconds since epoch,
    /// also the panel key).
    pub fn new(parts: ResponseParts<'_>, now_ms: i64) -> Self {
        let color = match parts.ok {
            None => ThemeColor::Yellow,
            Some(false) => ThemeColor::Red,
            Some(true) => ThemeColor::Primary,
        };
        let pretty = serde_json::from_str::<serde_json::Value>(parts.body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok());
        let (lines, is_json) = match pretty {
            Some(pretty) => (pretty.lines().map(str::to_owned).collect(), true),
            None => (vec![format!("Response: {}", parts.body)], false),
        };
        Self {
            key: PanelKey::from(now_ms),
            url: parts.url.to_owned(),
            status_line: format!("{} {}", parts.status, parts.status_text),
            color,
            lines,
            is_json,
        }
    }

    /// Summary shown when the responses overlay is still empty.
    pub fn placeholder(now_ms: i64) -> Self {
        Self::new(
            ResponseParts {
                url: "/dev/live.html",
                status: 200,
                status_text: "OK",
                ok: None,
                body: PLACEHOLDER_BODY,
            },
            now_ms,
        )
    }

    /// Text color class for body rows.
    pub fn text_class(&self) -> &'static str {
        self.color.text_class()
    }

    /// Theme hint for the panel.
    pub fn panel_theme(&self) -> ColorizeOptions {
        ColorizeOptions::color(self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_request_defaults_to_current_page() {
        let request = RenderRequest::new(Vec::new(), "/posts/a/");
        assert_eq!(
            serde_json::to_string(&request).expect("encode"),
            r#"{"items":["/posts/a/"]}"#
        );
    }

    #[test]
    fn exit_on_failure_is_only_sent_when_set() {
        let decoded: RenderRequest =
            serde_json::from_str(r#"{"items":["a.qmd"],"exit_on_failure":true}"#).expect("decode");
        assert!(decoded.exit_on_failure);
        assert_eq!(
            serde_json::to_string(&decoded).expect("encode"),
            r#"{"items":["a.qmd"],"exit_on_failure":true}"#
        );

        let built = crate::controls::render_form("a.qmd", "file").expect("valid");
        assert!(!built.exit_on_failure);
        assert!(!serde_json::to_string(&built).expect("encode").contains("exit_on_failure"));
    }

    #[test]
    fn render_targets_mix_paths_and_items() {
        let request = RenderRequest::new(
            vec![
                "blog/index.qmd".into(),
                RenderTarget::Item {
                    path: "blog/posts".into(),
                    kind: TargetKind::Directory,
                },
            ],
            "/",
        );
        assert_eq!(
            serde_json::to_string(&request).expect("encode"),
            r#"{"items":["blog/index.qmd",{"path":"blog/posts","kind":"directory"}]}"#
        );
    }

    #[test]
    fn empty_filter_serializes_as_empty_object() {
        assert_eq!(serde_json::to_string(&RenderFilter::default()).expect("encode"), "{}");
        let filter = RenderFilter {
            kind: Some(vec![RenderKind::Deferred]),
            errors: Some(true),
            ..RenderFilter::default()
        };
        assert_eq!(
            serde_json::to_string(&filter).expect("encode"),
            r#"{"errors":true,"kind":["defered"]}"#
        );
    }

    #[test]
    fn api_requests_target_the_right_endpoints() {
        let last = ApiRequest::last(&LastRequest {
            kind: vec![RenderKind::Direct],
        })
        .expect("encode");
        assert_eq!(last.url, LAST_ENDPOINT);
        assert_eq!(last.method.as_str(), "POST");
        assert_eq!(last.body.as_deref(), Some(r#"{"kind":["direct"]}"#));

        let clear = ApiRequest::clear_logs();
        assert_eq!((clear.method, clear.url, clear.body), (Method::Delete, LOG_ENDPOINT, None));
    }

    #[test]
    fn json_bodies_are_pretty_printed() {
        let summary = ResponseSummary::new(
            ResponseParts {
                url: "/api/dev/quarto/render",
                status: 200,
                status_text: "OK",
                ok: Some(true),
                body: r#"{"items":[1,2]}"#,
            },
            1_700_000_000_000,
        );
        assert!(summary.is_json);
        assert_eq!(summary.color, ThemeColor::Primary);
        assert_eq!(summary.status_line, "200 OK");
        assert_eq!(summary.lines, vec!["{", "  \"items\": [", "    1,", "    2", "  ]", "}"]);
        assert_eq!(summary.key.as_str(), "1700000000000");
    }

    #[test]
    fn text_bodies_are_prefixed() {
        let summary = ResponseSummary::new(
            ResponseParts {
                url: "/api/dev/log",
                status: 500,
                status_text: "Internal Server Error",
                ok: Some(false),
                body: "boom",
            },
            1,
        );
        assert!(!summary.is_json);
        assert_eq!(summary.color, ThemeColor::Red);
        assert_eq!(summary.text_class(), "text-red");
        assert_eq!(summary.lines, vec!["Response: boom"]);
    }

    #[test]
    fn placeholder_is_yellow() {
        let summary = ResponseSummary::placeholder(5);
        assert_eq!(summary.color, ThemeColor::Yellow);
        assert!(summary.lines.iter().any(|l| l.contains("No responses yet.")));
    }
}
