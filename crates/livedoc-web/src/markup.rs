#![forbid(unsafe_code)]

//! Markup contract of the dashboard.
//!
//! Selectors, class names and attribute names the browser glue reads and
//! writes, plus the pure parts of scanning: turning attribute values into
//! [`PanelSpec`]s and an [`OverlayMount`], and guarding delayed fades.
//!
//! Everything here compiles natively so it can be tested off-target.

use std::time::Duration;

use livedoc_overlay::{ColorizeOptions, OverlayMount, PanelKey, PanelSpec};
use livedoc_session::ControlAction;

/// Id of the `<script type="application/json">` element holding the page's
/// [`LiveConfig`](livedoc_session::LiveConfig).
pub const CONFIG_SCRIPT_ID: &str = "live-config";

pub const HIDDEN_CLASS: &str = "hidden";
pub const OVERLAY_CLASS: &str = "overlay";
pub const CONTENT_CLASS: &str = "overlay-content";
pub const ITEMS_CLASS: &str = "overlay-content-items";
pub const CONTENT_SELECTOR: &str = ".overlay-content";
pub const ITEMS_SELECTOR: &str = ".overlay-content-items";
pub const ITEM_SELECTOR: &str = ".overlay-content-item";
pub const ITEM_CLASS: &str = "overlay-content-item";
pub const NAV_ICON_SELECTOR: &str = ".overlay-controls-item";
pub const CONTROLS_CLASSES: [&str; 2] = ["overlay-controls", "p-1"];

pub const KEY_ATTR: &str = "data-key";
pub const COLOR_ATTR: &str = "data-colorize-color";
pub const TEXT_ATTR: &str = "data-colorize-color-text";
pub const TEXT_HOVER_ATTR: &str = "data-colorize-color-text-hover";

/// Delay before a shown overlay fades in.
pub const FADE_IN_DELAY: Duration = Duration::from_millis(10);
/// Length of the fade-out before a hidden overlay is removed from layout.
pub const FADE_OUT: Duration = Duration::from_millis(300);

/// Delay before scrolling a freshly shown render panel to its end.
pub const PANEL_SCROLL_DELAY: Duration = Duration::from_millis(100);

// ============================================================================
// Scanning
// ============================================================================

/// Raw attributes of one `.overlay-content-item`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelAttributes {
    pub key: Option<String>,
    pub color: Option<String>,
    pub color_text: Option<String>,
    pub color_text_hover: Option<String>,
}

impl PanelAttributes {
    /// Panel description. Blank keys count as missing; unknown colors are
    /// dropped.
    pub fn spec(&self) -> PanelSpec {
        PanelSpec {
            key: self.present_key().map(str::to_owned),
            theme_hint: ColorizeOptions::from_names(
                self.color.as_deref(),
                self.color_text.as_deref(),
                self.color_text_hover.as_deref(),
            ),
        }
    }

    /// Key the panel element is indexed under, if it has one.
    pub fn panel_key(&self) -> Option<PanelKey> {
        self.present_key().map(PanelKey::from)
    }

    fn present_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

/// What a scan of an overlay container found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountScan {
    pub id: Option<String>,
    pub has_content: bool,
    pub has_items: bool,
    pub items: Vec<PanelAttributes>,
    pub controls_present: bool,
}

impl MountScan {
    /// Mount description for [`Overlay::new`](livedoc_overlay::Overlay::new),
    /// which reports any structural problem.
    pub fn into_mount(self) -> OverlayMount {
        OverlayMount {
            id: self.id.unwrap_or_default(),
            has_content: self.has_content,
            has_items: self.has_items,
            items: self.items.iter().map(PanelAttributes::spec).collect(),
            controls_present: self.controls_present,
        }
    }
}

/// Selector of the panel with `key` inside an items region.
///
/// The key is serialized as a CSS string: quotes and backslashes are
/// escaped, control characters become `\HH ` code point escapes and NUL
/// becomes U+FFFD.
pub fn panel_selector(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        match ch {
            '\0' => escaped.push(char::REPLACEMENT_CHARACTER),
            '\u{1}'..='\u{1f}' | '\u{7f}' => {
                escaped.push_str(&format!("\\{:x} ", u32::from(ch)));
            }
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    format!("{ITEM_SELECTOR}[{KEY_ATTR}=\"{escaped}\"]")
}

/// Whether a click landed on the backdrop of the overlay itself rather than
/// on its content.
pub fn is_backdrop_click(target_id: &str, overlay_id: &str) -> bool {
    !overlay_id.is_empty() && target_id == overlay_id
}

/// Absolute socket URL for `path` on the page's origin.
pub fn socket_url(protocol: &str, host: &str, path: &str) -> String {
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    format!("{scheme}://{host}{path}")
}

// ============================================================================
// Controls nav
// ============================================================================

/// Icons of the controls nav, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavControl {
    Back,
    Forward,
    Exit,
}

impl NavControl {
    pub const ALL: [NavControl; 3] = [Self::Back, Self::Forward, Self::Exit];

    /// Classes of the `<i>` element.
    pub fn classes(self) -> &'static [&'static str] {
        match self {
            Self::Back => &[
                "bi",
                "bi-chevron-left",
                "overlay-controls-item",
                "px-1",
                "overlay-controls-left",
            ],
            Self::Forward => &[
                "bi",
                "bi-chevron-right",
                "overlay-controls-item",
                "px-1",
                "overlay-controls-right",
            ],
            Self::Exit => &[
                "bi",
                "bi-x-lg",
                "overlay-controls-item",
                "overlay-controls-exit",
                "px-1",
            ],
        }
    }

    /// Class identifying this control within the nav.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Back => "overlay-controls-left",
            Self::Forward => "overlay-controls-right",
            Self::Exit => "overlay-controls-exit",
        }
    }

    /// Paging delta, or `None` for the exit control.
    pub fn delta(self) -> Option<i64> {
        match self {
            Self::Back => Some(-1),
            Self::Forward => Some(1),
            Self::Exit => None,
        }
    }
}

// ============================================================================
// Banner buttons
// ============================================================================

/// Markup of one banner control button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMarkup {
    pub id: &'static str,
    /// Bootstrap icon class (`bi-…`).
    pub icon: String,
    pub tooltip: &'static str,
    /// Form key, for buttons that open an input form.
    pub data_key: Option<&'static str>,
    pub icon_classes: &'static [&'static str],
}

impl ButtonMarkup {
    pub const CLASSES: [&'static str; 2] = ["btn", "banner-control"];
    pub const SPINNER_CLASS: &'static str = "spinner-border";

    /// Markup for `action`.
    pub fn for_action(action: ControlAction) -> Self {
        Self {
            id: action.id(),
            icon: format!("bi-{}", action.icon()),
            tooltip: action.tooltip(),
            data_key: action.form().map(|form| form.key()),
            icon_classes: match action {
                ControlAction::ClearLogs => &["text-red"],
                _ => &[],
            },
        }
    }
}

/// Id of the submit button of the form with `key`.
pub fn submit_button_id(form_key: &str) -> String {
    format!("{form_key}-button")
}

/// Id of an input of the form with `key`.
pub fn input_id(form_key: &str, input: &str) -> String {
    format!("api-params-{form_key}-{input}")
}

// ============================================================================
// Delayed fades
// ============================================================================

/// Generation counter for delayed fade steps.
///
/// Every show or hide takes a new generation; a delayed step only runs when
/// its generation is still the latest, so a show that follows a hide within
/// the fade-out is never undone by the hide's timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FadeGuard {
    generation: u64,
}

impl FadeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fade and return its generation.
    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Whether a step of `generation` should still run.
    pub fn is_current(self, generation: u64) -> bool {
        self.generation == generation
    }
}
