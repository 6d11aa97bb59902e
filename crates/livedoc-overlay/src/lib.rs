#![forbid(unsafe_code)]

//! Host-driven overlay state machine for the live documentation dashboard.
//!
//! An [`Overlay`] manages an ordered set of mutually exclusive content panels
//! bound to one mount point. It owns no DOM: every visible side effect is
//! routed through an [`OverlayView`], and the open/visible selection is
//! persisted through an [`OverlayStorage`] so that a full page reload can
//! restore it.
//!
//! Design goals:
//! - **Pure transitions**: paging, persistence, and theme bookkeeping are
//!   plain state updates that can be unit tested without a browser.
//! - **Host-driven time**: slide animations are an explicit state machine
//!   ([`SlideTransition`]) advanced by the host when its timers fire, and
//!   stale timers are ignored by ticket.
//! - **Remove-then-add theming**: [`Colorize`] always strips the previously
//!   derived classes before adding new ones, so repeated theme changes never
//!   leak classes.

pub mod colorize;
pub mod error;
pub mod overlay;
pub mod panel;
pub mod storage;
pub mod transition;
pub mod view;

pub use colorize::{
    ChromeClasses, ChromeDelta, ChromeTarget, ClassSet, Colorize, ColorizeOptions, HoverSwap,
    ThemeColor,
};
pub use error::{OverlayError, Region, UnknownColor};
pub use overlay::{
    HideOptions, Overlay, OverlayMount, OverlayOptions, PanelSpec, ShowOptions, ShowOutcome,
    controls_id,
};
pub use panel::{ContentPanel, PanelKey, PanelSet};
pub use storage::{
    MemoryStorage, OVERLAY_ID_KEY, OVERLAY_KEY_KEY, OverlayStorage, PersistedSelection,
};
pub use transition::{
    Interrupted, SlideDirection, SlideSlot, SlideTransition, TransitionConfig, TransitionPhase, TransitionStep,
    TransitionTicket,
};
pub use view::{HeadlessView, OverlayView};
