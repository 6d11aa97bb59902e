#![forbid(unsafe_code)]

//! Page-level configuration of the live dashboard.
//!
//! The site generator embeds one JSON document per page. Every field has a
//! default, so `{}` is a complete configuration. `"quarto": false` and
//! `"server": false` drop the corresponding section.

use std::collections::BTreeSet;
use std::time::Duration;

use livedoc_overlay::{ColorizeOptions, ThemeColor, TransitionConfig};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::render::RenderSessionConfig;
use crate::requests::RenderFilter;

/// Target wildcard that disables render filtering.
pub const ANY_TARGET: &str = "*";

/// Invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid live configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ============================================================================
// Sections
// ============================================================================

/// A plain element the page template creates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    pub identifier: String,
    pub classes: Vec<String>,
}

impl ElementConfig {
    fn new(identifier: &str, classes: &[&str]) -> Self {
        Self {
            identifier: identifier.to_owned(),
            classes: classes.iter().map(|&c| c.to_owned()).collect(),
        }
    }
}

/// An overlay mount and its construction theme.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub identifier: String,
    pub classes: Vec<String>,
    pub colorize: ColorizeOptions,
}

impl OverlayConfig {
    fn live(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_owned(),
            classes: vec!["live-overlay".to_owned()],
            colorize: ColorizeOptions::default(),
        }
    }
}

/// Render (quarto) section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuartoConfig {
    /// One panel per render event.
    pub renders: OverlayConfig,
    /// One panel per API response.
    pub responses: OverlayConfig,
    /// One panel per request form.
    pub inputs: OverlayConfig,
    /// Files to follow besides the page's own source.
    pub targets: Vec<String>,
    pub reload: bool,
    /// History items requested on connect.
    #[serde(alias = "count")]
    pub last: u32,
    pub table: ElementConfig,
    pub container: ElementConfig,
    pub include_logs: bool,
    /// Show the render banner and its controls.
    pub banner: bool,
}

impl Default for QuartoConfig {
    fn default() -> Self {
        let mut responses = OverlayConfig::live("quarto-live-responses");
        responses.colorize = ColorizeOptions::color(ThemeColor::Primary)
            .with_text(ThemeColor::Black)
            .with_text_hover(ThemeColor::White);
        Self {
            renders: OverlayConfig::live("quarto-live-renders"),
            responses,
            inputs: OverlayConfig::live("quarto-live-inputs"),
            targets: Vec::new(),
            reload: true,
            last: 1,
            table: ElementConfig::new(
                "live-quarto-renders-table",
                &["table", "table-borderless", "quarto", "p-2"],
            ),
            container: ElementConfig::new("live-quarto-renders-container", &["tab-pane", "fade"]),
            include_logs: false,
            banner: true,
        }
    }
}

impl QuartoConfig {
    /// The three overlays, in construction order.
    pub fn overlays(&self) -> [&OverlayConfig; 3] {
        [&self.renders, &self.responses, &self.inputs]
    }
}

/// Server-log section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    #[serde(alias = "count")]
    pub last: u32,
    pub table: ElementConfig,
    pub container: ElementConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            last: 1,
            table: ElementConfig::new(
                "live-server-log-table",
                &["table", "table-borderless", "terminal", "p-2"],
            ),
            container: ElementConfig::new("live-server-log-container", &["tab-pane", "fade"]),
        }
    }
}

/// Slide timings in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTimings {
    pub start_delay_ms: u64,
    pub settle_ms: u64,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        let defaults = TransitionConfig::default();
        Self {
            start_delay_ms: duration_ms(defaults.start_delay),
            settle_ms: duration_ms(defaults.settle_time),
        }
    }
}

impl From<TransitionTimings> for TransitionConfig {
    fn from(timings: TransitionTimings) -> Self {
        TransitionConfig::default()
            .start_delay(Duration::from_millis(timings.start_delay_ms))
            .settle_time(Duration::from_millis(timings.settle_ms))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Root
// ============================================================================

/// Configuration of the live dashboard on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    #[serde(deserialize_with = "falsy_as_none")]
    pub quarto: Option<QuartoConfig>,
    #[serde(deserialize_with = "falsy_as_none")]
    pub server: Option<ServerConfig>,
    pub include_quarto: bool,
    pub include_server: bool,
    /// Source file of the page, injected at render time.
    pub file_path: Option<String>,
    /// `EnvFilter` directive for browser logging.
    pub log_level: String,
    pub keepalive_ms: u64,
    pub transition: TransitionTimings,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            quarto: Some(QuartoConfig::default()),
            server: Some(ServerConfig::default()),
            include_quarto: true,
            include_server: false,
            file_path: None,
            log_level: "info".to_owned(),
            keepalive_ms: 1000,
            transition: TransitionTimings::default(),
        }
    }
}

impl LiveConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self = serde_json::from_str(raw)?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keepalive_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "keepalive_ms",
                reason: "must be positive".to_owned(),
            });
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_level",
                reason: "must not be empty".to_owned(),
            });
        }
        if let Some(quarto) = &self.quarto {
            let mut seen = BTreeSet::new();
            for overlay in quarto.overlays() {
                if overlay.identifier.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "quarto.overlays",
                        reason: "overlay identifier must not be empty".to_owned(),
                    });
                }
                if !seen.insert(overlay.identifier.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: "quarto.overlays",
                        reason: format!("duplicate overlay identifier `{}`", overlay.identifier),
                    });
                }
            }
        }
        Ok(())
    }

    /// Quarto section, when included.
    pub fn quarto(&self) -> Option<&QuartoConfig> {
        self.quarto.as_ref().filter(|_| self.include_quarto)
    }

    /// Server section, when included.
    pub fn server(&self) -> Option<&ServerConfig> {
        self.server.as_ref().filter(|_| self.include_server)
    }

    /// Keepalive ping interval.
    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms)
    }

    /// Filter sent by the render session: the page's source plus extra
    /// targets, or nothing when a target is [`ANY_TARGET`].
    pub fn render_filter(&self) -> Option<RenderFilter> {
        let extra = self.quarto.as_ref().map_or(&[][..], |q| q.targets.as_slice());
        if extra.iter().any(|t| t == ANY_TARGET) {
            return Some(RenderFilter::default());
        }
        let targets: Vec<String> = self.file_path.iter().chain(extra).cloned().collect();
        (!targets.is_empty()).then(|| RenderFilter::targets(targets))
    }

    /// Render session settings for the page at `page_path`.
    pub fn render_session(&self, page_path: &str) -> RenderSessionConfig {
        let mut config = RenderSessionConfig::new(page_path).keepalive(self.keepalive());
        if let Some(quarto) = &self.quarto {
            config = config.reload(quarto.reload).last(quarto.last);
        }
        if let Some(filter) = self.render_filter() {
            config = config.filter(filter);
        }
        config
    }
}

fn falsy_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(None),
        value => T::deserialize(value).map(Some).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_the_default() {
        let config = LiveConfig::from_json_str("{}").expect("defaults");
        assert_eq!(config, LiveConfig::default());
        let quarto = config.quarto().expect("included by default");
        assert_eq!(quarto.renders.identifier, "quarto-live-renders");
        assert_eq!(quarto.responses.colorize.color_text, Some(ThemeColor::Black));
        assert!(config.server().is_none());
    }

    #[test]
    fn false_sections_are_dropped() {
        let config = LiveConfig::from_json_str(r#"{"quarto": false, "include_server": true}"#)
            .expect("valid");
        assert_eq!(config.quarto, None);
        assert_eq!(config.server().map(|s| s.last), Some(1));
    }

    #[test]
    fn count_is_accepted_for_last() {
        let config =
            LiveConfig::from_json_str(r#"{"quarto": {"count": 5, "reload": false}}"#).expect("valid");
        let session = config.render_session("/posts/a/");
        assert_eq!(session.last, Some(5));
        assert!(!session.reload);
    }

    #[test]
    fn filter_follows_page_and_targets() {
        let mut config = LiveConfig {
            file_path: Some("blog/posts/a/index.qmd".into()),
            ..LiveConfig::default()
        };
        if let Some(quarto) = config.quarto.as_mut() {
            quarto.targets = vec!["blog/data.yaml".into()];
        }
        assert_eq!(
            config.render_filter(),
            Some(RenderFilter::targets(vec![
                "blog/posts/a/index.qmd".into(),
                "blog/data.yaml".into()
            ]))
        );

        if let Some(quarto) = config.quarto.as_mut() {
            quarto.targets.push(ANY_TARGET.into());
        }
        assert_eq!(config.render_filter(), Some(RenderFilter::default()));

        assert_eq!(LiveConfig::default().render_filter(), None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = LiveConfig::from_json_str(r#"{"keepalive_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "keepalive_ms", .. }));

        let err = LiveConfig::from_json_str(
            r#"{"quarto": {"inputs": {"identifier": "quarto-live-renders"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate overlay identifier"));

        assert!(matches!(
            LiveConfig::from_json_str("[").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn timings_convert() {
        let config: TransitionConfig = TransitionTimings {
            start_delay_ms: 0,
            settle_ms: 250,
        }
        .into();
        assert_eq!(config.settle_time, Duration::from_millis(250));
        assert_eq!(TransitionConfig::from(TransitionTimings::default()), TransitionConfig::default());
    }
}
