#![forbid(unsafe_code)]

//! Errors of the browser frontend.

use livedoc_overlay::OverlayError;
use livedoc_session::{ConfigError, SessionError};

/// Failure while mounting or driving the dashboard in a page.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// A JS call threw or returned an unexpected value.
    #[error("javascript error: {0}")]
    Js(String),
    /// Markup the dashboard needs is absent.
    #[error("missing element `{selector}`")]
    MissingElement { selector: String },
    /// No `window` (not running in a browser main thread).
    #[error("no global window")]
    NoWindow,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
}

impl WebError {
    /// Missing element found by `selector`.
    pub fn missing(selector: impl Into<String>) -> Self {
        Self::MissingElement {
            selector: selector.into(),
        }
    }
}
