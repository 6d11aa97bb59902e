#![forbid(unsafe_code)]

//! `tracing` output for the browser console.
//!
//! A `fmt` layer renders each event as one line and hands it to an emit
//! function (in the browser: `console.log`). Filtering uses an `EnvFilter`
//! directive from the page configuration.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Unparseable directive | Falls back to `info`, then warns once installed |
//! | Subscriber already set | [`init`] returns `false` |

use std::io;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when the configured one does not parse.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Receives one formatted log line.
pub type Emit = fn(&str);

/// [`MakeWriter`] producing one [`LineWriter`] per event.
#[derive(Clone, Copy)]
pub struct ConsoleWriter {
    emit: Emit,
}

impl ConsoleWriter {
    pub fn new(emit: Emit) -> Self {
        Self { emit }
    }
}

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            emit: self.emit,
            buf: Vec::new(),
        }
    }
}

/// Buffers one formatted event and emits it when dropped.
pub struct LineWriter {
    emit: Emit,
    buf: Vec<u8>,
}

impl io::Write for LineWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end_matches('\n');
        if !line.is_empty() {
            (self.emit)(line);
        }
        self.buf.clear();
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

/// Parse `directive`, falling back to [`DEFAULT_DIRECTIVE`]. The second
/// value is the parse error, if any.
pub fn env_filter(directive: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_DIRECTIVE), Some(err.to_string())),
    }
}

/// Console subscriber filtered by `directive`.
pub fn subscriber(
    directive: &str,
    emit: Emit,
) -> (impl Subscriber + Send + Sync + use<>, Option<String>) {
    let (filter, rejected) = env_filter(directive);
    let layer = fmt::layer()
        .with_writer(ConsoleWriter::new(emit))
        .without_time()
        .with_ansi(false)
        .with_target(true);
    (tracing_subscriber::registry().with(layer).with(filter), rejected)
}

/// Install the console subscriber globally. Returns `false` when another
/// subscriber was already installed.
pub fn init(directive: &str, emit: Emit) -> bool {
    let (console, rejected) = subscriber(directive, emit);
    if console.try_init().is_err() {
        return false;
    }
    if let Some(err) = rejected {
        tracing::warn!(message = "logging.directive.rejected", directive, %err);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn capture(line: &str) {
        LINES.lock().expect("lines lock").push(line.to_owned());
    }

    fn drain() -> Vec<String> {
        std::mem::take(&mut *LINES.lock().expect("lines lock"))
    }

    // Both cases share the static sink, so they run in one test.
    #[test]
    fn events_become_single_lines_filtered_by_directive() {
        drain();
        let (console, rejected) = subscriber("warn", capture);
        assert!(rejected.is_none());
        tracing::subscriber::with_default(console, || {
            tracing::info!(message = "overlay.show", overlay_id = "x");
            tracing::warn!(message = "overlay.restore.failed", key = "7");
        });
        let lines = drain();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("overlay.restore.failed"));
        assert!(lines[0].contains("key=\"7\""));
        assert!(!lines[0].ends_with('\n'));

        let (console, rejected) = subscriber("livedoc=verbose", capture);
        assert!(rejected.is_some());
        tracing::subscriber::with_default(console, || {
            tracing::debug!("hidden");
            tracing::info!("shown");
        });
        let lines = drain();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("shown"));
    }

    #[test]
    fn valid_directives_parse() {
        let (_, rejected) = env_filter("livedoc_session=debug,info");
        assert!(rejected.is_none());
    }
}
