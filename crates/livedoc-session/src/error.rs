#![forbid(unsafe_code)]

//! Session errors.
//!
//! A `null` payload is not an error: it is the server's "no data" signal and
//! decodes to `None`.

use std::fmt;

use livedoc_overlay::OverlayError;

/// Which socket a payload arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// `/api/dev/quarto`.
    Render,
    /// `/api/dev/log`.
    Log,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("render"),
            Self::Log => f.write_str("log"),
        }
    }
}

/// Failure while driving a live session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A message could not be decoded as a batch.
    #[error("malformed {stream} payload: {source}")]
    Decode {
        stream: Stream,
        #[source]
        source: serde_json::Error,
    },
    /// A request body could not be encoded.
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    /// Registering a panel with the overlay failed.
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    /// The socket rejected a send or close.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The host could not build or attach the panel of an event.
    #[error("panel {key} could not be placed: {reason}")]
    Placement { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_stream() {
        let source = serde_json::from_str::<u8>("{").unwrap_err();
        let err = SessionError::Decode {
            stream: Stream::Log,
            source,
        };
        assert!(err.to_string().starts_with("malformed log payload:"));
    }

    #[test]
    fn overlay_errors_pass_through() {
        let err = SessionError::from(OverlayError::MissingId);
        assert_eq!(err.to_string(), "overlay missing required `id`");
    }

    #[test]
    fn placement_error_names_the_panel() {
        let err = SessionError::Placement {
            key: "17".into(),
            reason: "no items region".into(),
        };
        assert_eq!(err.to_string(), "panel 17 could not be placed: no items region");
    }
}
