#![forbid(unsafe_code)]

//! The socket as seen by a session.
//!
//! [`Connection`] pairs a [`Transport`] with its [`Keepalive`] so both
//! sessions share one lifecycle: the host forwards socket events
//! (`open`, interval ticks, `close`) and the connection decides what is sent.

use std::time::Duration;

use crate::error::SessionError;
use crate::keepalive::{Keepalive, KeepaliveToken, SocketPhase};

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// An open socket.
pub trait Transport {
    /// Send a text frame.
    fn send(&mut self, text: &str) -> Result<(), SessionError>;

    /// Close with `code`.
    fn close(&mut self, code: u16) -> Result<(), SessionError>;
}

/// Transport that records frames instead of sending them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingTransport {
    sent: Vec<String>,
    closed: Option<u16>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent so far.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Close code, once closed.
    pub fn closed(&self) -> Option<u16> {
        self.closed
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, text: &str) -> Result<(), SessionError> {
        if self.closed.is_some() {
            return Err(SessionError::Transport("socket is closed".into()));
        }
        self.sent.push(text.to_owned());
        Ok(())
    }

    fn close(&mut self, code: u16) -> Result<(), SessionError> {
        self.closed = Some(code);
        Ok(())
    }
}

/// A transport and its keepalive.
#[derive(Debug)]
pub struct Connection<T: Transport> {
    transport: T,
    keepalive: Keepalive,
}

impl<T: Transport> Connection<T> {
    /// Wrap `transport`, pinging every `interval` once open.
    pub fn new(transport: T, interval: Duration) -> Self {
        Self {
            transport,
            keepalive: Keepalive::new(interval),
        }
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Keepalive state.
    pub fn keepalive(&self) -> &Keepalive {
        &self.keepalive
    }

    /// Socket phase.
    pub fn phase(&self) -> SocketPhase {
        self.keepalive.phase()
    }

    /// Send `first` (if any), then arm the keepalive.
    pub fn on_open(&mut self, first: Option<&str>) -> Result<Option<KeepaliveToken>, SessionError> {
        if let Some(text) = first {
            self.transport.send(text)?;
        }
        Ok(self.keepalive.on_open())
    }

    /// Forward an interval tick.
    pub fn on_tick(&mut self, token: KeepaliveToken) -> Result<bool, SessionError> {
        match self.keepalive.on_tick(token) {
            Some(ping) => {
                self.transport.send(ping)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The socket closed. Returns the interval token to clear.
    pub fn on_close(&mut self) -> Option<KeepaliveToken> {
        self.keepalive.on_close()
    }

    /// Stop pinging and close with [`NORMAL_CLOSURE`].
    pub fn close_normally(&mut self) -> Result<(), SessionError> {
        self.keepalive.halt();
        self.transport.close(NORMAL_CLOSURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepalive::{KEEPALIVE_INTERVAL, KEEPALIVE_MESSAGE};

    #[test]
    fn open_sends_first_message_before_pings() {
        let mut conn = Connection::new(RecordingTransport::new(), KEEPALIVE_INTERVAL);
        let token = conn.on_open(Some("null")).expect("send").expect("armed");
        assert!(conn.on_tick(token).expect("ping"));
        assert_eq!(conn.transport().sent(), &["null".to_owned(), KEEPALIVE_MESSAGE.to_owned()]);
    }

    #[test]
    fn close_normally_stops_pings() {
        let mut conn = Connection::new(RecordingTransport::new(), KEEPALIVE_INTERVAL);
        let token = conn.on_open(None).expect("open").expect("armed");
        conn.close_normally().expect("close");
        assert!(!conn.on_tick(token).expect("silent"));
        assert_eq!(conn.transport().closed(), Some(NORMAL_CLOSURE));
        assert_eq!(conn.on_close(), Some(token));
    }
}
