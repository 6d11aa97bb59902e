#![forbid(unsafe_code)]

//! The overlay content-panel manager.
//!
//! An [`Overlay`] owns an ordered set of [`ContentPanel`]s bound to one mount
//! point and shows at most one of them at a time. It pages with wraparound,
//! slides between panels, themes its chrome through [`Colorize`], and
//! persists the open overlay and visible panel so a reload can restore them.
//!
//! # Invariants
//!
//! - `current_index` is always the position of `current_key`, or `None`.
//! - Hiding the overlay clears `current_key` and `current_index`.
//! - Storage writes are the last step of the operation that makes them.
//! - Once every scheduled transition step has run, exactly the current
//!   panel is visible.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Malformed mount | [`Overlay::new`] returns an [`OverlayError`] |
//! | Unknown panel key | Logged, [`ShowOutcome::Unknown`] |
//! | Stale persisted key | Logged, overlay stays closed |
//! | Stale transition timer | Ignored |
//!
//! Showing a panel while the overlay is closed makes it current without
//! opening the container; callers pair it with [`Overlay::show_overlay`].

use crate::colorize::{Colorize, ColorizeOptions, HoverSwap};
use crate::error::{OverlayError, Region};
use crate::panel::{ContentPanel, PanelKey, PanelSet};
use crate::storage::{OVERLAY_ID_KEY, OVERLAY_KEY_KEY, OverlayStorage, PersistedSelection};
use crate::transition::{
    Interrupted, SlideDirection, SlideSlot, SlideTransition, TransitionConfig, TransitionPhase,
    TransitionStep, TransitionTicket,
};
use crate::view::OverlayView;

// ============================================================================
// Construction inputs
// ============================================================================

/// A content panel found in, or added to, the overlay markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelSpec {
    /// Declared key (`data-key`).
    pub key: Option<String>,
    /// Declared theme (`data-colorize-*`).
    pub theme_hint: ColorizeOptions,
}

impl PanelSpec {
    /// A panel with `key` and no theme hint.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            theme_hint: ColorizeOptions::default(),
        }
    }

    /// Attach a theme hint.
    pub fn with_theme(mut self, theme_hint: ColorizeOptions) -> Self {
        self.theme_hint = theme_hint;
        self
    }
}

/// Scanned description of an overlay mount point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayMount {
    /// Element id of the overlay container.
    pub id: String,
    /// Whether `.overlay-content` exists.
    pub has_content: bool,
    /// Whether `.overlay-content-items` exists within the content.
    pub has_items: bool,
    /// Panels already present in the markup, in document order.
    pub items: Vec<PanelSpec>,
    /// Whether the `<id>-controls` nav was already created.
    pub controls_present: bool,
}

impl OverlayMount {
    /// A well-formed mount with no panels and no controls.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            has_content: true,
            has_items: true,
            items: Vec::new(),
            controls_present: false,
        }
    }

    /// Append a pre-existing panel.
    pub fn with_item(mut self, item: PanelSpec) -> Self {
        self.items.push(item);
        self
    }
}

/// Construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayOptions {
    /// Theme applied at construction.
    pub colorize: ColorizeOptions,
    /// Slide timings.
    pub transition: TransitionConfig,
}

impl OverlayOptions {
    /// Set the construction theme.
    pub fn colorize(mut self, colorize: ColorizeOptions) -> Self {
        self.colorize = colorize;
        self
    }

    /// Set the slide timings.
    pub fn transition(mut self, transition: TransitionConfig) -> Self {
        self.transition = transition;
        self
    }
}

/// Options for [`Overlay::hide_overlay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HideOptions {
    /// Hide without the fade.
    pub skip_animation: bool,
    /// Leave the persisted selection untouched.
    pub preserve_storage: bool,
}

impl HideOptions {
    /// Hide without the fade.
    pub fn skip_animation(mut self, skip: bool) -> Self {
        self.skip_animation = skip;
        self
    }

    /// Leave the persisted selection untouched.
    pub fn preserve_storage(mut self, preserve: bool) -> Self {
        self.preserve_storage = preserve;
        self
    }
}

/// Options for [`Overlay::show_content_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOptions {
    /// Leave the persisted selection untouched.
    pub preserve_storage: bool,
    /// Slide from the previous panel when there is one.
    pub animate: bool,
    /// Slide direction.
    pub animate_forward: bool,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            preserve_storage: false,
            animate: true,
            animate_forward: true,
        }
    }
}

impl ShowOptions {
    /// Show without sliding.
    pub fn instant() -> Self {
        Self {
            animate: false,
            ..Self::default()
        }
    }

    /// Leave the persisted selection untouched.
    pub fn preserve_storage(mut self, preserve: bool) -> Self {
        self.preserve_storage = preserve;
        self
    }

    /// Slide from the previous panel when there is one.
    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Slide direction.
    pub fn animate_forward(mut self, forward: bool) -> Self {
        self.animate_forward = forward;
        self
    }
}

/// Result of [`Overlay::show_content_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The panel became current.
    Shown,
    /// The panel was already current; only its theme was re-applied.
    AlreadyCurrent,
    /// No panel has that key.
    Unknown,
}

impl ShowOutcome {
    /// Whether the key resolved to a panel.
    pub fn is_found(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Id of the controls nav created for `overlay_id`.
pub fn controls_id(overlay_id: &str) -> String {
    format!("{overlay_id}-controls")
}

// ============================================================================
// Overlay
// ============================================================================

/// Content-panel manager for one mount point.
#[derive(Debug)]
pub struct Overlay<V: OverlayView, S: OverlayStorage> {
    id: String,
    panels: PanelSet,
    is_open: bool,
    current_key: Option<PanelKey>,
    current_index: Option<usize>,
    theme: Option<Colorize>,
    transition: SlideTransition,
    timings: TransitionConfig,
    view: V,
    storage: S,
}

impl<V: OverlayView, S: OverlayStorage> Overlay<V, S> {
    /// Bind an overlay to a scanned mount point.
    ///
    /// When the controls nav did not exist yet the overlay starts hidden
    /// (keeping any persisted selection). The construction theme is applied
    /// and a persisted selection for this overlay is restored.
    pub fn new(
        mount: OverlayMount,
        options: OverlayOptions,
        view: V,
        storage: S,
    ) -> Result<Self, OverlayError> {
        if mount.id.is_empty() {
            return Err(OverlayError::MissingId);
        }
        if !mount.has_content {
            return Err(OverlayError::MissingRegion {
                overlay_id: mount.id,
                region: Region::Content,
            });
        }
        if !mount.has_items {
            return Err(OverlayError::MissingRegion {
                overlay_id: mount.id,
                region: Region::Items,
            });
        }

        let mut overlay = Self {
            id: mount.id,
            panels: PanelSet::new(),
            is_open: false,
            current_key: None,
            current_index: None,
            theme: None,
            transition: SlideTransition::new(),
            timings: options.transition,
            view,
            storage,
        };
        for item in mount.items {
            overlay.add_content(item)?;
        }

        if !mount.controls_present {
            tracing::debug!(message = "overlay.controls.created", overlay_id = %overlay.id);
            overlay.hide_overlay(HideOptions {
                skip_animation: true,
                preserve_storage: true,
            });
        }
        overlay.colorize(&options.colorize);
        overlay.restore_overlay();
        Ok(overlay)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Mount point id; also the persistence namespace.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of this overlay's controls nav.
    pub fn controls_id(&self) -> String {
        controls_id(&self.id)
    }

    /// Whether the container is shown.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Key of the current panel.
    pub fn current_key(&self) -> Option<&PanelKey> {
        self.current_key.as_ref()
    }

    /// Position of the current panel.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Registered panels.
    pub fn panels(&self) -> &PanelSet {
        &self.panels
    }

    /// Number of registered panels.
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.panels.contains(key)
    }

    /// Key at paging position `index`.
    pub fn key_at(&self, index: usize) -> Option<&PanelKey> {
        self.panels.key_at(index)
    }

    /// Key of the most recently added panel.
    pub fn latest_key(&self) -> Option<&PanelKey> {
        self.panels.last().map(ContentPanel::key)
    }

    /// Theme state, once colorize has been called.
    pub fn theme(&self) -> Option<&Colorize> {
        self.theme.as_ref()
    }

    /// Phase of the slide transition.
    pub fn transition_phase(&self) -> TransitionPhase {
        self.transition.phase()
    }

    /// Slide timings.
    pub fn timings(&self) -> TransitionConfig {
        self.timings
    }

    /// The rendering side.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The rendering side, mutably.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// The persistence side.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ------------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------------

    /// Register a panel at the end of the paging order.
    pub fn add_content(&mut self, spec: PanelSpec) -> Result<PanelKey, OverlayError> {
        let Some(key) = spec.key.filter(|k| !k.is_empty()) else {
            return Err(OverlayError::MissingKey {
                overlay_id: self.id.clone(),
            });
        };
        let key = PanelKey::new(key);
        if self.panels.insert(key.clone(), spec.theme_hint).is_none() {
            return Err(OverlayError::DuplicateKey {
                overlay_id: self.id.clone(),
                key,
            });
        }
        tracing::trace!(message = "overlay.content.added", overlay_id = %self.id, key = %key);
        Ok(key)
    }

    // ------------------------------------------------------------------------
    // Open / close
    // ------------------------------------------------------------------------

    /// Fade the container in and record this overlay as the open one.
    pub fn show_overlay(&mut self) {
        tracing::debug!(message = "overlay.show", overlay_id = %self.id);
        self.view.set_overlay_visible(true, true);
        self.is_open = true;
        self.storage.set(OVERLAY_ID_KEY, &self.id);
    }

    /// Fade the container out, hide every panel and forget the current one.
    pub fn hide_overlay(&mut self, options: HideOptions) {
        tracing::debug!(
            message = "overlay.hide",
            overlay_id = %self.id,
            preserve_storage = options.preserve_storage
        );
        if let Some(interrupted) = self.transition.interrupt() {
            self.settle_now(interrupted);
        }
        self.view
            .set_overlay_visible(false, !options.skip_animation);
        self.hide_content_items(options.preserve_storage);

        self.is_open = false;
        self.current_key = None;
        self.current_index = None;

        if !options.preserve_storage {
            self.storage.remove(OVERLAY_ID_KEY);
        }
    }

    /// Hide every panel. Unless `preserve_storage`, forget the persisted key.
    pub fn hide_content_items(&mut self, preserve_storage: bool) {
        self.hide_all_panels();
        if !preserve_storage {
            self.storage.remove(OVERLAY_KEY_KEY);
        }
    }

    fn hide_all_panels(&mut self) {
        for key in self.panels.keys() {
            self.view.set_panel_visible(key, false);
        }
    }

    // ------------------------------------------------------------------------
    // Showing panels
    // ------------------------------------------------------------------------

    /// Make `key` the current panel.
    ///
    /// With an animated show and a previously current panel, the panels are
    /// staged and the view is asked to schedule the first
    /// [`transition_step`](Self::transition_step). The theme hint of the new
    /// panel is applied once it has settled.
    pub fn show_content_item(&mut self, key: &str, options: ShowOptions) -> ShowOutcome {
        let Some(panel) = self.panels.get(key) else {
            tracing::warn!(message = "overlay.item.unknown", overlay_id = %self.id, key);
            return ShowOutcome::Unknown;
        };
        let key = panel.key().clone();
        let index = panel.index();

        if self.current_key.as_ref() == Some(&key) {
            // Still sliding in: the theme lands on settle.
            if self.transition.incoming() != Some(&key) {
                self.apply_panel_theme(&key);
            }
            return ShowOutcome::AlreadyCurrent;
        }

        if let Some(interrupted) = self.transition.interrupt() {
            tracing::debug!(
                message = "overlay.transition.superseded",
                overlay_id = %self.id,
                incoming = %interrupted.incoming
            );
            self.settle_now(interrupted);
        }
        self.hide_all_panels();

        let direction = SlideDirection::from_forward(options.animate_forward);
        match self.current_key.clone() {
            Some(outgoing) if options.animate => {
                tracing::debug!(
                    message = "overlay.item.slide",
                    overlay_id = %self.id,
                    outgoing = %outgoing,
                    incoming = %key,
                    ?direction
                );
                self.view
                    .set_panel_slot(&outgoing, Some(SlideSlot::Center), direction);
                self.view.set_panel_visible(&outgoing, true);
                self.view
                    .set_panel_slot(&key, Some(SlideSlot::Leading), direction);
                self.view.set_panel_visible(&key, true);
                self.view.place_before(&key, &outgoing);

                let ticket = self.transition.begin(outgoing, key.clone(), direction);
                self.view
                    .schedule_transition(ticket, self.timings.start_delay);
            }
            _ => {
                tracing::debug!(message = "overlay.item.show", overlay_id = %self.id, key = %key);
                self.view.set_panel_visible(&key, true);
                self.apply_panel_theme(&key);
            }
        }

        self.current_key = Some(key.clone());
        self.current_index = Some(index);

        if !options.preserve_storage {
            PersistedSelection {
                overlay_id: self.id.clone(),
                key,
            }
            .store(&mut self.storage);
        }
        ShowOutcome::Shown
    }

    /// Advance the slide transition identified by `ticket`.
    ///
    /// Hosts call this when a timer requested through
    /// [`OverlayView::schedule_transition`] fires. Returns `false` for stale
    /// or unknown tickets.
    pub fn transition_step(&mut self, ticket: TransitionTicket) -> bool {
        match self.transition.step(ticket) {
            Some(TransitionStep::Slide {
                outgoing,
                incoming,
                direction,
            }) => {
                self.view
                    .set_panel_slot(&outgoing, Some(SlideSlot::Trailing), direction);
                self.view
                    .set_panel_slot(&incoming, Some(SlideSlot::Center), direction);
                self.view
                    .schedule_transition(ticket, self.timings.settle_time);
                true
            }
            Some(TransitionStep::Settle {
                outgoing,
                incoming,
                direction,
            }) => {
                self.view.set_panel_visible(&outgoing, false);
                self.view.set_panel_slot(&outgoing, None, direction);
                self.view.set_panel_slot(&incoming, None, direction);
                tracing::debug!(message = "overlay.transition.settled", overlay_id = %self.id, key = %incoming);
                self.apply_panel_theme(&incoming);
                true
            }
            None => false,
        }
    }

    fn settle_now(&mut self, interrupted: Interrupted) {
        let Interrupted {
            outgoing,
            incoming,
            direction,
        } = interrupted;
        self.view.set_panel_visible(&outgoing, false);
        self.view.set_panel_slot(&outgoing, None, direction);
        self.view.set_panel_slot(&incoming, None, direction);
    }

    /// Move `delta` panels from the current one, wrapping in both directions.
    ///
    /// Landing on the current position (a single panel, or `delta` a
    /// multiple of the panel count) does nothing. Returns whether a panel
    /// was shown.
    pub fn next_content_item(&mut self, delta: i64) -> bool {
        let current = self.current_index.unwrap_or(0);
        let Some(next) = self.panels.wrap_index(current, delta) else {
            return false;
        };
        if next == current {
            tracing::trace!(message = "overlay.page.noop", overlay_id = %self.id, delta);
            return false;
        }
        let Some(key) = self.panels.key_at(next).cloned() else {
            return false;
        };
        let options = ShowOptions::default().animate_forward(delta > 0);
        self.show_content_item(key.as_str(), options) == ShowOutcome::Shown
    }

    /// Reopen the overlay on the persisted panel, if it belongs to this overlay.
    ///
    /// Returns whether the overlay was restored.
    pub fn restore_overlay(&mut self) -> bool {
        let Some(selection) = PersistedSelection::load(&self.storage) else {
            return false;
        };
        if selection.overlay_id != self.id {
            return false;
        }
        let outcome = self.show_content_item(
            selection.key.as_str(),
            ShowOptions::instant().preserve_storage(true),
        );
        if !outcome.is_found() {
            tracing::warn!(
                message = "overlay.restore.failed",
                overlay_id = %self.id,
                key = %selection.key
            );
            return false;
        }
        self.show_overlay();
        tracing::debug!(message = "overlay.restored", overlay_id = %self.id, key = %selection.key);
        true
    }

    // ------------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------------

    /// Apply a theme, creating the theme state on first use.
    pub fn colorize(&mut self, options: &ColorizeOptions) {
        let delta = self
            .theme
            .get_or_insert_with(Colorize::new)
            .restart(options);
        self.view.apply_chrome(&delta);
    }

    /// Undo the last theme change. Does nothing before the first colorize.
    pub fn revert_colorize(&mut self) {
        if let Some(theme) = self.theme.as_mut() {
            let delta = theme.revert();
            self.view.apply_chrome(&delta);
        }
    }

    /// Icon class swap for pointer enter / leave, from the live theme.
    pub fn hover_swap(&self, entering: bool) -> Option<HoverSwap> {
        self.theme.as_ref().map(|theme| theme.hover_swap(entering))
    }

    fn apply_panel_theme(&mut self, key: &PanelKey) {
        if self.theme.is_none() {
            return;
        }
        let Some(hint) = self.panels.get(key.as_str()).map(|p| *p.theme_hint()) else {
            return;
        };
        if !hint.is_empty() {
            self.colorize(&hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorize::ThemeColor;
    use crate::storage::MemoryStorage;
    use crate::view::HeadlessView;

    type TestOverlay = Overlay<HeadlessView, MemoryStorage>;

    fn overlay_with(keys: &[&str], storage: MemoryStorage) -> TestOverlay {
        let mount = keys
            .iter()
            .fold(OverlayMount::new("renders"), |mount, key| {
                mount.with_item(PanelSpec::new(*key))
            });
        Overlay::new(mount, OverlayOptions::default(), HeadlessView::new(), storage)
            .expect("valid mount")
    }

    fn run_scheduled(overlay: &mut TestOverlay) {
        loop {
            let scheduled = overlay.view_mut().take_scheduled();
            if scheduled.is_empty() {
                break;
            }
            for (ticket, _) in scheduled {
                overlay.transition_step(ticket);
            }
        }
    }

    #[test]
    fn construction_rejects_malformed_mounts() {
        let err = Overlay::new(
            OverlayMount::new(""),
            OverlayOptions::default(),
            HeadlessView::new(),
            MemoryStorage::new(),
        )
        .unwrap_err();
        assert_eq!(err, OverlayError::MissingId);

        let mount = OverlayMount {
            has_items: false,
            ..OverlayMount::new("x")
        };
        let err = Overlay::new(mount, OverlayOptions::default(), HeadlessView::new(), MemoryStorage::new())
            .unwrap_err();
        assert!(matches!(err, OverlayError::MissingRegion { region: Region::Items, .. }));

        let mount = OverlayMount::new("x").with_item(PanelSpec::default());
        let err = Overlay::new(mount, OverlayOptions::default(), HeadlessView::new(), MemoryStorage::new())
            .unwrap_err();
        assert!(matches!(err, OverlayError::MissingKey { .. }));

        let mount = OverlayMount::new("x")
            .with_item(PanelSpec::new("a"))
            .with_item(PanelSpec::new("a"));
        let err = Overlay::new(mount, OverlayOptions::default(), HeadlessView::new(), MemoryStorage::new())
            .unwrap_err();
        assert!(matches!(err, OverlayError::DuplicateKey { .. }));
    }

    #[test]
    fn show_without_previous_panel_is_instant() {
        let mut overlay = overlay_with(&["a", "b"], MemoryStorage::new());
        assert_eq!(overlay.show_content_item("b", ShowOptions::default()), ShowOutcome::Shown);
        assert!(overlay.view().scheduled().is_empty());
        assert_eq!(overlay.current_key().map(PanelKey::as_str), Some("b"));
        assert_eq!(overlay.current_index(), Some(1));
        assert!(overlay.view().panel_visible("b"));
    }

    #[test]
    fn animated_show_settles_to_one_panel() {
        let mut overlay = overlay_with(&["a", "b"], MemoryStorage::new());
        overlay.show_content_item("a", ShowOptions::instant());
        overlay.show_content_item("b", ShowOptions::default());

        assert_eq!(overlay.transition_phase(), TransitionPhase::SlidingOut);
        assert!(overlay.view().panel_visible("a"));
        assert!(overlay.view().panel_visible("b"));
        assert_eq!(overlay.view().slot("b"), Some(SlideSlot::Leading));
        assert_eq!(overlay.view().order()[0].as_str(), "b");

        run_scheduled(&mut overlay);
        assert_eq!(overlay.transition_phase(), TransitionPhase::Settled);
        assert_eq!(overlay.view().visible_panels(), vec![&PanelKey::new("b")]);
        assert_eq!(overlay.view().slot("a"), None);
        assert_eq!(overlay.view().slot("b"), None);
    }

    #[test]
    fn reshowing_the_incoming_panel_defers_its_theme_to_settle() {
        let mount = OverlayMount::new("renders")
            .with_item(PanelSpec::new("a"))
            .with_item(PanelSpec::new("b").with_theme(ColorizeOptions::color(ThemeColor::Danger)));
        let mut overlay = Overlay::new(
            mount,
            OverlayOptions::default().colorize(ColorizeOptions::color(ThemeColor::Primary)),
            HeadlessView::new(),
            MemoryStorage::new(),
        )
        .expect("valid mount");
        overlay.show_content_item("a", ShowOptions::instant());
        overlay.show_content_item("b", ShowOptions::default());
        let chrome = overlay.view().chrome().clone();
        let color = overlay.theme().and_then(Colorize::color);

        assert_eq!(
            overlay.show_content_item("b", ShowOptions::default()),
            ShowOutcome::AlreadyCurrent
        );
        assert_eq!(overlay.view().chrome(), &chrome);
        assert_eq!(overlay.theme().and_then(Colorize::color), color);
        assert_eq!(overlay.transition_phase(), TransitionPhase::SlidingOut);

        run_scheduled(&mut overlay);
        assert_eq!(overlay.theme().and_then(Colorize::color), Some(ThemeColor::Danger));
    }

    #[test]
    fn unknown_key_is_reported_not_fatal() {
        let mut overlay = overlay_with(&["a"], MemoryStorage::new());
        assert_eq!(overlay.show_content_item("zzz", ShowOptions::default()), ShowOutcome::Unknown);
        assert_eq!(overlay.current_key(), None);
    }

    #[test]
    fn showing_the_current_panel_only_rethemes() {
        let storage = MemoryStorage::new();
        let mount = OverlayMount::new("renders")
            .with_item(PanelSpec::new("a").with_theme(ColorizeOptions::color(ThemeColor::Danger)));
        let mut overlay = Overlay::new(
            mount,
            OverlayOptions::default().colorize(ColorizeOptions::color(ThemeColor::Primary)),
            HeadlessView::new(),
            storage.clone(),
        )
        .expect("valid mount");
        overlay.show_content_item("a", ShowOptions::instant());
        overlay.colorize(&ColorizeOptions::color(ThemeColor::Teal));
        let writes = storage.write_count();

        assert_eq!(
            overlay.show_content_item("a", ShowOptions::default()),
            ShowOutcome::AlreadyCurrent
        );
        assert_eq!(overlay.theme().and_then(Colorize::color), Some(ThemeColor::Danger));
        assert_eq!(storage.write_count(), writes);
    }

    #[test]
    fn hide_clears_state_and_storage() {
        let storage = MemoryStorage::new();
        let mut overlay = overlay_with(&["a"], storage.clone());
        overlay.show_overlay();
        overlay.show_content_item("a", ShowOptions::default());
        assert!(PersistedSelection::load(&storage).is_some());

        overlay.hide_overlay(HideOptions::default());
        assert!(!overlay.is_open());
        assert_eq!(overlay.current_key(), None);
        assert_eq!(overlay.current_index(), None);
        assert!(storage.is_empty());
        assert!(overlay.view().visible_panels().is_empty());
    }

    #[test]
    fn hide_with_preserve_keeps_storage() {
        let storage = MemoryStorage::new();
        let mut overlay = overlay_with(&["a"], storage.clone());
        overlay.show_overlay();
        overlay.show_content_item("a", ShowOptions::default());
        overlay.hide_overlay(HideOptions::default().preserve_storage(true));
        assert!(PersistedSelection::load(&storage).is_some());
    }

    #[test]
    fn hide_mid_transition_leaves_no_slots() {
        let mut overlay = overlay_with(&["a", "b"], MemoryStorage::new());
        overlay.show_content_item("a", ShowOptions::instant());
        overlay.show_content_item("b", ShowOptions::default());
        let scheduled = overlay.view_mut().take_scheduled();
        overlay.hide_overlay(HideOptions::default());

        for (ticket, _) in scheduled {
            assert!(!overlay.transition_step(ticket));
        }
        assert_eq!(overlay.view().slot("a"), None);
        assert_eq!(overlay.view().slot("b"), None);
        assert!(overlay.view().visible_panels().is_empty());
    }

    #[test]
    fn paging_wraps_and_sets_direction() {
        let mut overlay = overlay_with(&["a", "b", "c"], MemoryStorage::new());
        overlay.show_content_item("a", ShowOptions::instant());
        assert!(overlay.next_content_item(-1));
        assert_eq!(overlay.current_key().map(PanelKey::as_str), Some("c"));
        run_scheduled(&mut overlay);
        assert!(overlay.next_content_item(1));
        assert_eq!(overlay.current_index(), Some(0));
    }

    #[test]
    fn paging_onto_the_current_index_is_inert() {
        let storage = MemoryStorage::new();
        let mut overlay = overlay_with(&["a", "b"], storage.clone());
        overlay.show_content_item("a", ShowOptions::instant());
        let writes = storage.write_count();
        let mutations = overlay.view().mutation_count();

        assert!(!overlay.next_content_item(2));
        assert!(!overlay.next_content_item(-4));
        assert_eq!(storage.write_count(), writes);
        assert_eq!(overlay.view().mutation_count(), mutations);
    }

    #[test]
    fn paging_an_empty_overlay_does_nothing() {
        let mut overlay = overlay_with(&[], MemoryStorage::new());
        assert!(!overlay.next_content_item(1));
    }

    #[test]
    fn latest_key_tracks_additions() {
        let mut overlay = overlay_with(&["a"], MemoryStorage::new());
        overlay.add_content(PanelSpec::new("b")).expect("new key");
        assert_eq!(overlay.latest_key().map(PanelKey::as_str), Some("b"));
        assert_eq!(overlay.panel_count(), 2);
        assert!(overlay.add_content(PanelSpec::new("b")).is_err());
        assert_eq!(overlay.controls_id(), "renders-controls");
    }

    #[test]
    fn stale_restore_key_keeps_overlay_closed() {
        let mut storage = MemoryStorage::new();
        PersistedSelection {
            overlay_id: "renders".into(),
            key: "gone".into(),
        }
        .store(&mut storage);
        let overlay = overlay_with(&["a"], storage.clone());
        assert!(!overlay.is_open());
        assert_eq!(overlay.current_key(), None);
    }

    #[test]
    fn revert_before_colorize_is_noop() {
        let mount = OverlayMount::new("x");
        let mut overlay: TestOverlay = Overlay {
            id: mount.id,
            panels: PanelSet::new(),
            is_open: false,
            current_key: None,
            current_index: None,
            theme: None,
            transition: SlideTransition::new(),
            timings: TransitionConfig::default(),
            view: HeadlessView::new(),
            storage: MemoryStorage::new(),
        };
        overlay.revert_colorize();
        assert!(overlay.theme().is_none());
        assert!(overlay.hover_swap(true).is_none());
    }
}
