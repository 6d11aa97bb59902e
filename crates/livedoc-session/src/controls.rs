#![forbid(unsafe_code)]

//! Banner controls: the buttons that dispatch API requests, their input
//! forms, and the overlay moves they trigger.
//!
//! Three overlays cooperate here: renders (one panel per render event),
//! inputs (one panel per form) and responses (one panel per API response).

use livedoc_overlay::{Overlay, OverlayStorage, OverlayView, PanelKey, PanelSpec, ShowOptions, ShowOutcome};

use crate::error::SessionError;
use crate::event::RenderKind;
use crate::requests::{LastRequest, RenderFilter, RenderRequest, RenderTarget, ResponseSummary, TargetKind};

/// A banner button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    /// Open the renders overlay on the newest render.
    ShowLatestRender,
    /// Open the responses overlay on the newest response.
    ShowServerResponses,
    /// Render the current page.
    RenderCurrent,
    /// Render a path entered in a form.
    Render,
    /// Fetch render history, optionally by kind.
    GetAllRenders,
    /// Fetch the most recent render of a kind.
    GetLastRendered,
    ClearLogs,
    ClearRenders,
}

impl ControlAction {
    /// Buttons in display order.
    pub const ALL: [ControlAction; 8] = [
        Self::ShowLatestRender,
        Self::ShowServerResponses,
        Self::RenderCurrent,
        Self::Render,
        Self::GetAllRenders,
        Self::GetLastRendered,
        Self::ClearLogs,
        Self::ClearRenders,
    ];

    /// Element id of the button.
    pub fn id(self) -> &'static str {
        match self {
            Self::ShowLatestRender => "quarto-controls-banner-overlay",
            Self::ShowServerResponses => "server-responses",
            Self::RenderCurrent => "quarto-controls-render-current",
            Self::Render => "quarto-controls-render",
            Self::GetAllRenders => "quarto-controls-get-all",
            Self::GetLastRendered => "quarto-controls-get-last",
            Self::ClearLogs => "server-controls-clear-logs",
            Self::ClearRenders => "quarto-controls-clear-renders",
        }
    }

    /// Bootstrap icon name, without the `bi-` prefix.
    pub fn icon(self) -> &'static str {
        match self {
            Self::ShowLatestRender => "info-circle-fill",
            Self::ShowServerResponses => "server",
            Self::RenderCurrent => "arrow-repeat",
            Self::Render => "hammer",
            Self::GetAllRenders => "body-text",
            Self::GetLastRendered => "clock-fill",
            Self::ClearLogs | Self::ClearRenders => "trash-fill",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            Self::ShowLatestRender => "Show Latest Render",
            Self::ShowServerResponses => "Show Server Responses.",
            Self::RenderCurrent => "Render This Page",
            Self::Render => "Render",
            Self::GetAllRenders => "Render History",
            Self::GetLastRendered => "Get Last Rendered.",
            Self::ClearLogs => "Clear Logs",
            Self::ClearRenders => "Clear Renders",
        }
    }

    /// Key of the input form this button opens, if it has one.
    pub fn form(self) -> Option<FormKind> {
        match self {
            Self::Render => Some(FormKind::Render),
            Self::GetAllRenders => Some(FormKind::History),
            Self::GetLastRendered => Some(FormKind::Last),
            _ => None,
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

/// An input form, registered as a panel of the inputs overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Render,
    History,
    Last,
}

impl FormKind {
    pub const ALL: [FormKind; 3] = [Self::Render, Self::History, Self::Last];

    /// Panel key and id prefix.
    pub fn key(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::History => "get-all",
            Self::Last => "get-last",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Render => "Render By URL",
            Self::History => "Get All",
            Self::Last => "Get Last Render",
        }
    }
}

/// Classes marking an invalid input.
pub const INVALID_INPUT_CLASSES: [&str; 3] = ["border", "border-warning", "border-3"];

/// Invalid form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("The provided value must be a valid path.")]
    MissingPath,
    #[error("At least one kind must be selected.")]
    MissingKind,
    #[error("unknown option `{0}`")]
    UnknownOption(&'static str),
}

/// Value of a kind `<select>`: `none` or a render kind.
pub fn parse_kind(value: &str) -> Result<Option<RenderKind>, FormError> {
    match value.trim() {
        "" | "none" => Ok(None),
        "direct" => Ok(Some(RenderKind::Direct)),
        "defered" | "deferred" => Ok(Some(RenderKind::Deferred)),
        "static" => Ok(Some(RenderKind::Static)),
        _ => Err(FormError::UnknownOption("kind")),
    }
}

/// Build the body of the render form.
pub fn render_form(path: &str, kind: &str) -> Result<RenderRequest, FormError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(FormError::MissingPath);
    }
    let kind = match kind.trim() {
        "file" | "" => TargetKind::File,
        "directory" => TargetKind::Directory,
        _ => return Err(FormError::UnknownOption("kind")),
    };
    let target = RenderTarget::Item {
        path: path.to_owned(),
        kind,
    };
    Ok(RenderRequest::new(vec![target], path))
}

/// Build the body of the history form; `none` fetches every kind.
pub fn history_form(kind: &str) -> Result<RenderFilter, FormError> {
    Ok(RenderFilter {
        kind: parse_kind(kind)?.map(|kind| vec![kind]),
        ..RenderFilter::default()
    })
}

/// Build the body of the last-render form; a kind is required.
pub fn last_form(kind: &str) -> Result<LastRequest, FormError> {
    match parse_kind(kind)? {
        Some(kind) => Ok(LastRequest { kind: vec![kind] }),
        None => Err(FormError::MissingKind),
    }
}

// ============================================================================
// Overlay moves
// ============================================================================

/// Register every form as a panel of the inputs overlay.
pub fn register_forms<V: OverlayView, S: OverlayStorage>(
    inputs: &mut Overlay<V, S>,
) -> Result<(), SessionError> {
    for form in FormKind::ALL {
        if !inputs.contains(form.key()) {
            inputs.add_content(PanelSpec::new(form.key()))?;
        }
    }
    Ok(())
}

/// Open the inputs overlay on `form`.
pub fn open_form<V: OverlayView, S: OverlayStorage>(
    inputs: &mut Overlay<V, S>,
    form: FormKind,
) -> ShowOutcome {
    inputs.show_overlay();
    inputs.show_content_item(form.key(), ShowOptions::default())
}

/// Open `overlay` on its newest panel. The overlay opens even when empty.
pub fn show_latest<V: OverlayView, S: OverlayStorage>(overlay: &mut Overlay<V, S>) -> ShowOutcome {
    overlay.show_overlay();
    match overlay.latest_key().cloned() {
        Some(key) => overlay.show_content_item(key.as_str(), ShowOptions::default()),
        None => ShowOutcome::Unknown,
    }
}

/// Register a response panel, and show it unless `show` is false.
pub fn present_response<V: OverlayView, S: OverlayStorage>(
    responses: &mut Overlay<V, S>,
    summary: &ResponseSummary,
    show: bool,
) -> Result<PanelKey, SessionError> {
    let key = responses.add_content(
        PanelSpec::new(summary.key.as_str()).with_theme(summary.panel_theme()),
    )?;
    if show {
        responses.show_content_item(key.as_str(), ShowOptions::default());
        responses.show_overlay();
    }
    Ok(key)
}

/// Open the responses overlay on its newest response.
///
/// An empty overlay is left untouched and the placeholder response is
/// returned: the host builds its panel and hands it to
/// [`present_response`].
pub fn show_latest_response<V: OverlayView, S: OverlayStorage>(
    responses: &mut Overlay<V, S>,
    now_ms: i64,
) -> LatestResponse {
    let Some(key) = responses.latest_key().cloned() else {
        return LatestResponse::Placeholder(ResponseSummary::placeholder(now_ms));
    };
    responses.show_overlay();
    responses.show_content_item(key.as_str(), ShowOptions::default());
    LatestResponse::Existing(key)
}

/// Result of [`show_latest_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestResponse {
    /// An existing panel was shown.
    Existing(PanelKey),
    /// Nothing to show yet; the host presents this placeholder.
    Placeholder(ResponseSummary),
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedoc_overlay::{HeadlessView, MemoryStorage, OverlayMount, OverlayOptions};
    use pretty_assertions::assert_eq;

    fn overlay(id: &str) -> Overlay<HeadlessView, MemoryStorage> {
        Overlay::new(
            OverlayMount::new(id),
            OverlayOptions::default(),
            HeadlessView::new(),
            MemoryStorage::new(),
        )
        .expect("valid mount")
    }

    #[test]
    fn button_ids_are_unique() {
        let mut ids: Vec<&str> = ControlAction::ALL.iter().map(|a| a.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ControlAction::ALL.len());
    }

    #[test]
    fn render_form_requires_a_path() {
        assert_eq!(render_form("  ", "file"), Err(FormError::MissingPath));
        let request = render_form("/posts/a/", "directory").expect("valid");
        assert_eq!(
            request.items,
            vec![RenderTarget::Item {
                path: "/posts/a/".into(),
                kind: TargetKind::Directory,
            }]
        );
    }

    #[test]
    fn kind_forms() {
        assert_eq!(history_form("none").expect("any kind"), RenderFilter::default());
        assert_eq!(
            history_form("defered").expect("deferred").kind,
            Some(vec![RenderKind::Deferred])
        );
        assert_eq!(last_form("none"), Err(FormError::MissingKind));
        assert_eq!(last_form("bogus"), Err(FormError::UnknownOption("kind")));
        assert_eq!(FormError::MissingKind.to_string(), "At least one kind must be selected.");
    }

    #[test]
    fn forms_open_in_the_inputs_overlay() {
        let mut inputs = overlay("quarto-live-inputs");
        register_forms(&mut inputs).expect("forms");
        register_forms(&mut inputs).expect("idempotent");
        assert_eq!(inputs.panel_count(), 3);
        assert_eq!(open_form(&mut inputs, FormKind::Last), ShowOutcome::Shown);
        assert!(inputs.is_open());
        assert_eq!(inputs.current_key().map(PanelKey::as_str), Some("get-last"));
    }

    #[test]
    fn empty_responses_get_a_placeholder() {
        let mut responses = overlay("quarto-live-responses");
        let LatestResponse::Placeholder(summary) = show_latest_response(&mut responses, 10) else {
            panic!("empty overlay has no latest response");
        };
        assert_eq!(summary.key, PanelKey::new("10"));
        assert_eq!(responses.panel_count(), 0);
        assert!(!responses.is_open());

        present_response(&mut responses, &summary, true).expect("placeholder panel");
        assert!(responses.is_open());
        assert_eq!(responses.current_key().map(PanelKey::as_str), Some("10"));

        let again = show_latest_response(&mut responses, 20);
        assert_eq!(again, LatestResponse::Existing(PanelKey::new("10")));
        assert_eq!(responses.panel_count(), 1);
    }

    #[test]
    fn hidden_responses_are_only_registered() {
        let mut responses = overlay("quarto-live-responses");
        let summary = ResponseSummary::placeholder(3);
        present_response(&mut responses, &summary, false).expect("registered");
        assert!(!responses.is_open());
        assert_eq!(responses.current_key(), None);
    }

    #[test]
    fn show_latest_on_empty_overlay_only_opens() {
        let mut renders = overlay("quarto-live-renders");
        assert_eq!(show_latest(&mut renders), ShowOutcome::Unknown);
        assert!(renders.is_open());
    }
}
