#![forbid(unsafe_code)]

//! Theme sub-component for an overlay's chrome (navigation icons, controls
//! bar, and content border).
//!
//! Theme state is kept as [`ThemeColor`] tokens; class names are derived at
//! the boundary from explicit tables. Every change snapshots the previous
//! token per axis so that [`Colorize::revert`] can undo one step.
//!
//! # Invariants
//!
//! - Applying a theme removes the classes derived from the previous state
//!   from every affected target *before* adding the newly derived ones.
//! - Applied classes are tracked as [`ClassSet`]s, so repeating an identical
//!   call never duplicates a class.
//! - Hover swaps read the live state at event time.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownColor;

// ============================================================================
// Theme colors
// ============================================================================

/// Palette token understood by the stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    Primary,
    Secondary,
    Success,
    Danger,
    Warning,
    Info,
    Light,
    Dark,
    Black,
    White,
    Blue,
    Indigo,
    Purple,
    Pink,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Cyan,
    Gray,
}

impl ThemeColor {
    /// Every palette token.
    pub const ALL: [ThemeColor; 21] = [
        Self::Primary,
        Self::Secondary,
        Self::Success,
        Self::Danger,
        Self::Warning,
        Self::Info,
        Self::Light,
        Self::Dark,
        Self::Black,
        Self::White,
        Self::Blue,
        Self::Indigo,
        Self::Purple,
        Self::Pink,
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Teal,
        Self::Cyan,
        Self::Gray,
    ];

    /// Token name as written in markup.
    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Black => "black",
            Self::White => "white",
            Self::Blue => "blue",
            Self::Indigo => "indigo",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Teal => "teal",
            Self::Cyan => "cyan",
            Self::Gray => "gray",
        }
    }

    /// Background class.
    pub fn background_class(self) -> &'static str {
        match self {
            Self::Primary => "bg-primary",
            Self::Secondary => "bg-secondary",
            Self::Success => "bg-success",
            Self::Danger => "bg-danger",
            Self::Warning => "bg-warning",
            Self::Info => "bg-info",
            Self::Light => "bg-light",
            Self::Dark => "bg-dark",
            Self::Black => "bg-black",
            Self::White => "bg-white",
            Self::Blue => "bg-blue",
            Self::Indigo => "bg-indigo",
            Self::Purple => "bg-purple",
            Self::Pink => "bg-pink",
            Self::Red => "bg-red",
            Self::Orange => "bg-orange",
            Self::Yellow => "bg-yellow",
            Self::Green => "bg-green",
            Self::Teal => "bg-teal",
            Self::Cyan => "bg-cyan",
            Self::Gray => "bg-gray",
        }
    }

    /// Border color class.
    pub fn border_class(self) -> &'static str {
        match self {
            Self::Primary => "border-primary",
            Self::Secondary => "border-secondary",
            Self::Success => "border-success",
            Self::Danger => "border-danger",
            Self::Warning => "border-warning",
            Self::Info => "border-info",
            Self::Light => "border-light",
            Self::Dark => "border-dark",
            Self::Black => "border-black",
            Self::White => "border-white",
            Self::Blue => "border-blue",
            Self::Indigo => "border-indigo",
            Self::Purple => "border-purple",
            Self::Pink => "border-pink",
            Self::Red => "border-red",
            Self::Orange => "border-orange",
            Self::Yellow => "border-yellow",
            Self::Green => "border-green",
            Self::Teal => "border-teal",
            Self::Cyan => "border-cyan",
            Self::Gray => "border-gray",
        }
    }

    /// Text color class.
    pub fn text_class(self) -> &'static str {
        match self {
            Self::Primary => "text-primary",
            Self::Secondary => "text-secondary",
            Self::Success => "text-success",
            Self::Danger => "text-danger",
            Self::Warning => "text-warning",
            Self::Info => "text-info",
            Self::Light => "text-light",
            Self::Dark => "text-dark",
            Self::Black => "text-black",
            Self::White => "text-white",
            Self::Blue => "text-blue",
            Self::Indigo => "text-indigo",
            Self::Purple => "text-purple",
            Self::Pink => "text-pink",
            Self::Red => "text-red",
            Self::Orange => "text-orange",
            Self::Yellow => "text-yellow",
            Self::Green => "text-green",
            Self::Teal => "text-teal",
            Self::Cyan => "text-cyan",
            Self::Gray => "text-gray",
        }
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThemeColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownColor(trimmed.to_owned()))
    }
}

// ============================================================================
// Options
// ============================================================================

/// Partial theme: any axis left as `None` keeps its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorizeOptions {
    /// Background / border color.
    pub color: Option<ThemeColor>,
    /// Icon text color.
    #[serde(alias = "colorText")]
    pub color_text: Option<ThemeColor>,
    /// Icon text color while hovered.
    #[serde(alias = "colorTextHover")]
    pub color_text_hover: Option<ThemeColor>,
}

impl ColorizeOptions {
    /// Options setting only the background / border color.
    pub fn color(color: ThemeColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    /// Set the text color.
    pub fn with_text(mut self, color: ThemeColor) -> Self {
        self.color_text = Some(color);
        self
    }

    /// Set the hover text color.
    pub fn with_text_hover(mut self, color: ThemeColor) -> Self {
        self.color_text_hover = Some(color);
        self
    }

    /// Whether no axis is set.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.color_text.is_none() && self.color_text_hover.is_none()
    }

    /// Build options from raw attribute values. Unknown names are logged and
    /// treated as absent.
    pub fn from_names(color: Option<&str>, text: Option<&str>, text_hover: Option<&str>) -> Self {
        fn parse(axis: &'static str, value: Option<&str>) -> Option<ThemeColor> {
            let value = value.filter(|v| !v.trim().is_empty())?;
            match value.parse() {
                Ok(color) => Some(color),
                Err(err) => {
                    tracing::warn!(message = "colorize.unknown_color", axis, %err);
                    None
                }
            }
        }
        Self {
            color: parse("color", color),
            color_text: parse("color_text", text),
            color_text_hover: parse("color_text_hover", text_hover),
        }
    }
}

// ============================================================================
// Class bookkeeping
// ============================================================================

/// Ordered set of CSS class names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassSet(BTreeSet<&'static str>);

impl ClassSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class. Returns `false` if it was already present.
    pub fn insert(&mut self, class: &'static str) -> bool {
        self.0.insert(class)
    }

    /// Remove a class. Returns `false` if it was absent.
    pub fn remove(&mut self, class: &str) -> bool {
        self.0.remove(class)
    }

    /// Whether `class` is present.
    pub fn contains(&self, class: &str) -> bool {
        self.0.contains(class)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate classes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }

    /// Remove every class in `remove`, then add every class in `add`.
    pub fn apply(&mut self, remove: &ClassSet, add: &ClassSet) {
        for class in remove.iter() {
            self.0.remove(class);
        }
        for class in add.iter() {
            self.0.insert(class);
        }
    }
}

impl FromIterator<&'static str> for ClassSet {
    fn from_iter<I: IntoIterator<Item = &'static str>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Chrome element receiving theme classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromeTarget {
    /// The back / forward / close icons.
    NavIcons,
    /// The controls bar holding the icons.
    Controls,
    /// The bordered content wrapper.
    ContentBorder,
}

impl ChromeTarget {
    /// All targets.
    pub const ALL: [ChromeTarget; 3] = [Self::NavIcons, Self::Controls, Self::ContentBorder];
}

/// Classes per chrome target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChromeClasses {
    pub nav_icons: ClassSet,
    pub controls: ClassSet,
    pub content_border: ClassSet,
}

impl ChromeClasses {
    /// Classes for `target`.
    pub fn get(&self, target: ChromeTarget) -> &ClassSet {
        match target {
            ChromeTarget::NavIcons => &self.nav_icons,
            ChromeTarget::Controls => &self.controls,
            ChromeTarget::ContentBorder => &self.content_border,
        }
    }

    fn get_mut(&mut self, target: ChromeTarget) -> &mut ClassSet {
        match target {
            ChromeTarget::NavIcons => &mut self.nav_icons,
            ChromeTarget::Controls => &mut self.controls,
            ChromeTarget::ContentBorder => &mut self.content_border,
        }
    }

    /// Apply a delta: every removal on every target, then every addition.
    pub fn apply(&mut self, delta: &ChromeDelta) {
        for target in ChromeTarget::ALL {
            for class in delta.remove.get(target).iter() {
                self.get_mut(target).remove(class);
            }
        }
        for target in ChromeTarget::ALL {
            for class in delta.add.get(target).iter() {
                self.get_mut(target).insert(class);
            }
        }
    }

    fn derive(color: Option<ThemeColor>, text: Option<ThemeColor>) -> Self {
        let mut out = Self::default();
        if let Some(color) = color {
            out.nav_icons.insert(color.background_class());
            out.controls.insert(color.background_class());
            out.content_border.insert(color.border_class());
            out.content_border.insert("border");
            out.content_border.insert("border-5");
        }
        if let Some(text) = text {
            out.nav_icons.insert(text.text_class());
        }
        out
    }
}

/// Class changes to apply to the chrome, removals first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChromeDelta {
    pub remove: ChromeClasses,
    pub add: ChromeClasses,
}

/// Class swap applied to a themed icon on pointer enter / leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverSwap {
    pub remove: Option<&'static str>,
    pub add: Option<&'static str>,
}

// ============================================================================
// Colorize
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Axis {
    current: Option<ThemeColor>,
    previous: Option<ThemeColor>,
}

impl Axis {
    fn set(&mut self, color: ThemeColor) {
        self.previous = self.current;
        self.current = Some(color);
    }
}

/// Theme state for one overlay.
#[derive(Debug, Clone, Default)]
pub struct Colorize {
    color: Axis,
    text: Axis,
    text_hover: Axis,
    applied: ChromeClasses,
}

impl Colorize {
    /// Create a theme with no colors applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current background / border color.
    pub fn color(&self) -> Option<ThemeColor> {
        self.color.current
    }

    /// Background / border color before the last change.
    pub fn color_prev(&self) -> Option<ThemeColor> {
        self.color.previous
    }

    /// Current icon text color.
    pub fn text_color(&self) -> Option<ThemeColor> {
        self.text.current
    }

    /// Icon text color before the last change.
    pub fn text_color_prev(&self) -> Option<ThemeColor> {
        self.text.previous
    }

    /// Current hover text color.
    pub fn text_hover_color(&self) -> Option<ThemeColor> {
        self.text_hover.current
    }

    /// Hover text color before the last change.
    pub fn text_hover_color_prev(&self) -> Option<ThemeColor> {
        self.text_hover.previous
    }

    /// Classes currently applied to the chrome.
    pub fn applied(&self) -> &ChromeClasses {
        &self.applied
    }

    /// Set every provided axis and re-derive the chrome classes.
    pub fn restart(&mut self, options: &ColorizeOptions) -> ChromeDelta {
        let before = self.derived();
        if let Some(color) = options.color {
            self.color.set(color);
        }
        if let Some(color) = options.color_text {
            self.text.set(color);
        }
        if let Some(color) = options.color_text_hover {
            self.text_hover.set(color);
        }
        self.swap(before)
    }

    /// Return every axis that has a snapshot to its previous value.
    pub fn revert(&mut self) -> ChromeDelta {
        let before = self.derived();
        for axis in [&mut self.color, &mut self.text, &mut self.text_hover] {
            if let Some(previous) = axis.previous {
                axis.set(previous);
            }
        }
        self.swap(before)
    }

    /// Classes to swap on a themed icon when the pointer enters
    /// (`entering == true`) or leaves it.
    pub fn hover_swap(&self, entering: bool) -> HoverSwap {
        let text = self.text.current.map(ThemeColor::text_class);
        let hover = self.text_hover.current.map(ThemeColor::text_class);
        if entering {
            HoverSwap {
                remove: text,
                add: hover,
            }
        } else {
            HoverSwap {
                remove: hover,
                add: text,
            }
        }
    }

    fn derived(&self) -> ChromeClasses {
        ChromeClasses::derive(self.color.current, self.text.current)
    }

    fn swap(&mut self, before: ChromeClasses) -> ChromeDelta {
        let delta = ChromeDelta {
            remove: before,
            add: self.derived(),
        };
        self.applied.apply(&delta);
        tracing::debug!(
            message = "colorize.apply",
            color = ?self.color.current,
            text = ?self.text.current,
            text_hover = ?self.text_hover.current
        );
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classes(items: &[&'static str]) -> ClassSet {
        items.iter().copied().collect()
    }

    #[test]
    fn color_names_parse_case_insensitively() {
        assert_eq!("Danger".parse::<ThemeColor>(), Ok(ThemeColor::Danger));
        assert_eq!(" teal ".parse::<ThemeColor>(), Ok(ThemeColor::Teal));
        assert_eq!(
            "mauve".parse::<ThemeColor>(),
            Err(UnknownColor("mauve".into()))
        );
    }

    #[test]
    fn every_color_has_matching_class_suffixes() {
        for color in ThemeColor::ALL {
            assert_eq!(color.background_class(), format!("bg-{}", color.name()));
            assert_eq!(color.border_class(), format!("border-{}", color.name()));
            assert_eq!(color.text_class(), format!("text-{}", color.name()));
        }
    }

    #[test]
    fn restart_derives_classes_for_each_target() {
        let mut theme = Colorize::new();
        theme.restart(&ColorizeOptions::color(ThemeColor::Red).with_text(ThemeColor::White));
        let applied = theme.applied();
        assert_eq!(applied.nav_icons, classes(&["bg-red", "text-white"]));
        assert_eq!(applied.controls, classes(&["bg-red"]));
        assert_eq!(
            applied.content_border,
            classes(&["border", "border-5", "border-red"])
        );
    }

    #[test]
    fn restart_removes_previous_before_adding() {
        let mut theme = Colorize::new();
        theme.restart(&ColorizeOptions::color(ThemeColor::Red));
        let delta = theme.restart(&ColorizeOptions::color(ThemeColor::Blue));
        assert!(delta.remove.controls.contains("bg-red"));
        assert!(delta.add.controls.contains("bg-blue"));
        assert_eq!(theme.applied().controls, classes(&["bg-blue"]));
        assert_eq!(theme.color_prev(), Some(ThemeColor::Red));
    }

    #[test]
    fn repeated_restart_is_idempotent() {
        let mut once = Colorize::new();
        once.restart(&ColorizeOptions::color(ThemeColor::Red));

        let mut twice = Colorize::new();
        twice.restart(&ColorizeOptions::color(ThemeColor::Red));
        twice.restart(&ColorizeOptions::color(ThemeColor::Red));

        assert_eq!(once.applied(), twice.applied());
    }

    #[test]
    fn revert_undoes_one_restart() {
        let mut reverted = Colorize::new();
        reverted.restart(&ColorizeOptions::color(ThemeColor::Teal).with_text(ThemeColor::Black));
        reverted.restart(&ColorizeOptions::color(ThemeColor::Danger).with_text(ThemeColor::White));
        reverted.revert();

        let mut single = Colorize::new();
        single.restart(&ColorizeOptions::color(ThemeColor::Teal).with_text(ThemeColor::Black));

        assert_eq!(reverted.applied(), single.applied());
        assert_eq!(reverted.color(), Some(ThemeColor::Teal));
    }

    #[test]
    fn hover_swap_reads_live_state() {
        let mut theme = Colorize::new();
        theme.restart(
            &ColorizeOptions::default()
                .with_text(ThemeColor::White)
                .with_text_hover(ThemeColor::Black),
        );
        let before = theme.hover_swap(true);
        assert_eq!(before.remove, Some("text-white"));
        assert_eq!(before.add, Some("text-black"));

        theme.restart(&ColorizeOptions::default().with_text_hover(ThemeColor::Yellow));
        let after = theme.hover_swap(true);
        assert_eq!(after.add, Some("text-yellow"));
        assert_eq!(theme.hover_swap(false).add, Some("text-white"));
    }

    #[test]
    fn from_names_skips_unknown_values() {
        let options = ColorizeOptions::from_names(Some("danger"), Some("chartreuse"), None);
        assert_eq!(options.color, Some(ThemeColor::Danger));
        assert_eq!(options.color_text, None);
        assert!(!options.is_empty());
        assert!(ColorizeOptions::from_names(None, Some(""), None).is_empty());
    }

    #[test]
    fn options_deserialize_from_snake_and_camel_case() {
        let snake: ColorizeOptions =
            serde_json::from_str(r#"{"color":"primary","color_text":"black","color_text_hover":"white"}"#)
                .expect("snake case");
        let camel: ColorizeOptions =
            serde_json::from_str(r#"{"color":"primary","colorText":"black","colorTextHover":"white"}"#)
                .expect("camel case");
        assert_eq!(snake, camel);
        assert_eq!(snake.color_text_hover, Some(ThemeColor::White));
    }
}
