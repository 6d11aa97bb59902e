#![forbid(unsafe_code)]

//! Render notification banner pinned to the bottom of authoring pages.

use std::time::Duration;

use crate::event::RenderEvent;

/// Element id of the banner.
pub const BANNER_ID: &str = "quarto-render-notification";
/// Text shown before any render arrives.
pub const BANNER_EMPTY_TEXT: &str = "No renders for current application lifetime.";
/// How long the `new` class stays on after a live render.
pub const BANNER_NEW_FLASH: Duration = Duration::from_millis(1500);
/// Class marking a freshly updated banner.
pub const BANNER_NEW_CLASS: &str = "new";

/// Outcome class of the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerOutcome {
    Success,
    Failure,
}

impl BannerOutcome {
    /// Class name.
    pub fn class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Success => Self::Failure,
            Self::Failure => Self::Success,
        }
    }
}

/// "Last rendered `target` at `time` from changes in `origin`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerMessage {
    pub time: String,
    pub target: String,
    pub origin: String,
}

impl BannerMessage {
    fn from_event(event: &RenderEvent) -> Self {
        let or_none = |text: &str| {
            if text.is_empty() {
                "none".to_owned()
            } else {
                text.to_owned()
            }
        };
        Self {
            time: or_none(&event.time),
            target: or_none(&event.target),
            origin: or_none(&event.origin),
        }
    }
}

/// Changes the host applies to the banner element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerUpdate {
    pub message: BannerMessage,
    /// Class removed before `add`.
    pub remove: &'static str,
    pub add: &'static str,
    /// Add [`BANNER_NEW_CLASS`] for this long.
    pub flash: Option<Duration>,
}

/// Banner state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Banner {
    outcome: Option<BannerOutcome>,
    message: Option<BannerMessage>,
}

impl Banner {
    /// An empty banner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current outcome class.
    pub fn outcome(&self) -> Option<BannerOutcome> {
        self.outcome
    }

    /// Current message, `None` until the first render.
    pub fn message(&self) -> Option<&BannerMessage> {
        self.message.as_ref()
    }

    /// Show `event`. Only live events flash.
    pub fn show(&mut self, event: &RenderEvent, is_new: bool) -> BannerUpdate {
        let outcome = if event.failed() {
            BannerOutcome::Failure
        } else {
            BannerOutcome::Success
        };
        let message = BannerMessage::from_event(event);
        self.outcome = Some(outcome);
        self.message = Some(message.clone());
        BannerUpdate {
            message,
            remove: outcome.other().class(),
            add: outcome.class(),
            flash: is_new.then_some(BANNER_NEW_FLASH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn outcome_classes_replace_each_other() {
        let mut banner = Banner::new();
        let failed = RenderEvent {
            status_code: 1,
            time: "12:00".into(),
            ..RenderEvent::default()
        };
        let update = banner.show(&failed, true);
        assert_eq!((update.remove, update.add), ("success", "failure"));
        assert_eq!(update.flash, Some(BANNER_NEW_FLASH));
        assert_eq!(update.message.target, "none");

        let update = banner.show(&RenderEvent::default(), false);
        assert_eq!((update.remove, update.add), ("failure", "success"));
        assert_eq!(update.flash, None);
        assert_eq!(banner.outcome(), Some(BannerOutcome::Success));
    }
}
