#![forbid(unsafe_code)]

//! Keepalive timer bound to one socket's lifecycle.
//!
//! The host owns the actual interval; this state machine decides when it may
//! exist and whether a tick should send anything.
//!
//! ```text
//! Connecting ──open──▶ Open ──halt──▶ Closing ──close──▶ Closed
//!                        └─────────────close──────────────┘
//! ```
//!
//! # Invariants
//!
//! - A [`KeepaliveToken`] is minted only by `on_open`, so no interval can
//!   start before the socket is confirmed open.
//! - Ticks send only while `Open` and only for the current token.
//! - `on_close` hands the token back so the host can clear its interval; no
//!   tick after close ever sends.

use std::time::Duration;

/// Literal ping sent on every keepalive tick.
pub const KEEPALIVE_MESSAGE: &str = "null";
/// Default ping interval.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of the socket as seen by the keepalive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketPhase {
    #[default]
    Connecting,
    Open,
    /// Close requested locally; waiting for the close event.
    Closing,
    Closed,
}

/// Identifies the interval started for one open socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeepaliveToken(u64);

impl KeepaliveToken {
    /// Raw value, for hosts that keep it next to a JS interval id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Keepalive state for one socket.
#[derive(Debug, Clone)]
pub struct Keepalive {
    phase: SocketPhase,
    interval: Duration,
    generation: u64,
    armed: Option<KeepaliveToken>,
}

impl Default for Keepalive {
    fn default() -> Self {
        Self::new(KEEPALIVE_INTERVAL)
    }
}

impl Keepalive {
    /// Create a keepalive ticking every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            phase: SocketPhase::Connecting,
            interval,
            generation: 0,
            armed: None,
        }
    }

    /// Socket phase.
    pub fn phase(&self) -> SocketPhase {
        self.phase
    }

    /// Ping interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Token of the running interval.
    pub fn armed(&self) -> Option<KeepaliveToken> {
        self.armed
    }

    /// The socket opened. Returns the token the host should start its
    /// interval with, or `None` when one is already running.
    pub fn on_open(&mut self) -> Option<KeepaliveToken> {
        if self.phase != SocketPhase::Connecting || self.armed.is_some() {
            tracing::debug!(message = "keepalive.open.ignored", phase = ?self.phase);
            return None;
        }
        self.phase = SocketPhase::Open;
        self.generation += 1;
        let token = KeepaliveToken(self.generation);
        self.armed = Some(token);
        tracing::trace!(message = "keepalive.armed", token = token.0);
        Some(token)
    }

    /// The interval for `token` fired. Returns the message to send, if any.
    pub fn on_tick(&self, token: KeepaliveToken) -> Option<&'static str> {
        (self.phase == SocketPhase::Open && self.armed == Some(token)).then_some(KEEPALIVE_MESSAGE)
    }

    /// Stop pinging ahead of a local close.
    pub fn halt(&mut self) {
        if self.phase == SocketPhase::Open || self.phase == SocketPhase::Connecting {
            self.phase = SocketPhase::Closing;
        }
    }

    /// The socket closed. Returns the token whose interval must be cleared.
    pub fn on_close(&mut self) -> Option<KeepaliveToken> {
        self.phase = SocketPhase::Closed;
        let token = self.armed.take();
        tracing::trace!(message = "keepalive.disarmed", token = ?token.map(KeepaliveToken::get));
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_before_open_send_nothing() {
        let keepalive = Keepalive::default();
        assert_eq!(keepalive.on_tick(KeepaliveToken(1)), None);
    }

    #[test]
    fn open_arms_once() {
        let mut keepalive = Keepalive::default();
        let token = keepalive.on_open().expect("first open arms");
        assert_eq!(keepalive.on_open(), None);
        assert_eq!(keepalive.on_tick(token), Some(KEEPALIVE_MESSAGE));
    }

    #[test]
    fn close_returns_token_and_silences_ticks() {
        let mut keepalive = Keepalive::default();
        let token = keepalive.on_open().expect("armed");
        assert_eq!(keepalive.on_close(), Some(token));
        assert_eq!(keepalive.on_tick(token), None);
        assert_eq!(keepalive.on_close(), None);
        assert_eq!(keepalive.phase(), SocketPhase::Closed);
    }

    #[test]
    fn halt_silences_but_keeps_token_for_close() {
        let mut keepalive = Keepalive::default();
        let token = keepalive.on_open().expect("armed");
        keepalive.halt();
        assert_eq!(keepalive.on_tick(token), None);
        assert_eq!(keepalive.phase(), SocketPhase::Closing);
        assert_eq!(keepalive.on_close(), Some(token));
    }

    #[test]
    fn closed_socket_never_rearms() {
        let mut keepalive = Keepalive::default();
        keepalive.on_close();
        assert_eq!(keepalive.on_open(), None);
    }
}
