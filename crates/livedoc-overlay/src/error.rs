#![forbid(unsafe_code)]

//! Configuration errors raised while binding an overlay to its markup.
//!
//! Lookup misses (unknown panel keys, unknown colors) are not errors: they
//! are logged and surface as `None` / [`crate::ShowOutcome::Unknown`].

use std::fmt;

use crate::panel::PanelKey;

/// Required sub-region of an overlay mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// The `.overlay-content` wrapper holding the controls and the items.
    Content,
    /// The `.overlay-content-items` container the panels live in.
    Items,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("overlay content"),
            Self::Items => f.write_str("overlay content items"),
        }
    }
}

/// Fatal error while constructing or extending an overlay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    /// The mount point has no stable identifier.
    #[error("overlay missing required `id`")]
    MissingId,
    /// The mount point lacks a required sub-region.
    #[error("could not find {region} for `{overlay_id}`")]
    MissingRegion { overlay_id: String, region: Region },
    /// A content panel was registered without a key.
    #[error("content item of `{overlay_id}` has no key")]
    MissingKey { overlay_id: String },
    /// A content panel reused a key already present in the overlay.
    #[error("content key `{key}` is already registered with `{overlay_id}`")]
    DuplicateKey { overlay_id: String, key: PanelKey },
}

/// A color name that has no entry in the theme table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme color `{0}`")]
pub struct UnknownColor(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_overlay() {
        let err = OverlayError::MissingRegion {
            overlay_id: "quarto-live-renders".into(),
            region: Region::Items,
        };
        assert_eq!(
            err.to_string(),
            "could not find overlay content items for `quarto-live-renders`"
        );

        let err = OverlayError::DuplicateKey {
            overlay_id: "o".into(),
            key: PanelKey::new("a"),
        };
        assert_eq!(err.to_string(), "content key `a` is already registered with `o`");
    }
}
