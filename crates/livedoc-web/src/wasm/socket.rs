#![forbid(unsafe_code)]

//! WebSocket plumbing shared by the render and server-log sessions.
//!
//! A [`SocketClient`] is a session plus its sink. [`connect`] opens the
//! socket, forwards `open`/`message`/`close` to the client and owns the
//! keepalive interval the client asks for.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---|---|
//! | Socket cannot be constructed | `connect` returns the JS error |
//! | Message is not text | dropped with a warning |
//! | Client rejects a message | logged, the socket stays open |
//! | Socket closes | keepalive cleared; no reconnection |

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use livedoc_session::{
    KeepaliveToken, LogSession, LogSink, NORMAL_CLOSURE, RenderSession, RenderSink, SessionError,
    Transport,
};
use tracing::{debug, error, warn};
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use super::dom::{self, Interval, Listener};
use crate::error::WebError;
use crate::markup;

// ============================================================================
// Transport
// ============================================================================

/// [`Transport`] over a browser socket.
pub(crate) struct WsTransport {
    socket: WebSocket,
}

impl Transport for WsTransport {
    fn send(&mut self, text: &str) -> Result<(), SessionError> {
        self.socket
            .send_with_str(text)
            .map_err(|err| SessionError::Transport(format!("{err:?}")))
    }

    fn close(&mut self, code: u16) -> Result<(), SessionError> {
        self.socket
            .close_with_code(code)
            .map_err(|err| SessionError::Transport(format!("{err:?}")))
    }
}

// ============================================================================
// Clients
// ============================================================================

/// Socket events as a session sees them.
pub(crate) trait SocketClient {
    fn on_open(&mut self) -> Result<Option<KeepaliveToken>, SessionError>;
    fn on_tick(&mut self, token: KeepaliveToken) -> Result<bool, SessionError>;
    fn on_close(&mut self) -> Option<KeepaliveToken>;
    fn on_message(&mut self, text: &str) -> Result<(), SessionError>;
}

/// Render session bound to its sink.
pub(crate) struct RenderClient<S> {
    pub(crate) session: RenderSession<WsTransport>,
    pub(crate) sink: S,
}

impl<S: RenderSink> SocketClient for RenderClient<S> {
    fn on_open(&mut self) -> Result<Option<KeepaliveToken>, SessionError> {
        self.session.on_open()
    }

    fn on_tick(&mut self, token: KeepaliveToken) -> Result<bool, SessionError> {
        self.session.on_tick(token)
    }

    fn on_close(&mut self) -> Option<KeepaliveToken> {
        self.session.on_close()
    }

    fn on_message(&mut self, text: &str) -> Result<(), SessionError> {
        if let Some(report) = self.session.handle_message(text, &mut self.sink)? {
            debug!(
                message = "render.batch.handled",
                events = report.events,
                added = report.added,
                reloaded = report.reloaded,
            );
        }
        Ok(())
    }
}

/// Server-log session bound to its sink.
pub(crate) struct LogClient<S> {
    pub(crate) session: LogSession<WsTransport>,
    pub(crate) sink: S,
}

impl<S: LogSink> SocketClient for LogClient<S> {
    fn on_open(&mut self) -> Result<Option<KeepaliveToken>, SessionError> {
        self.session.on_open()
    }

    fn on_tick(&mut self, token: KeepaliveToken) -> Result<bool, SessionError> {
        self.session.on_tick(token)
    }

    fn on_close(&mut self) -> Option<KeepaliveToken> {
        self.session.on_close()
    }

    fn on_message(&mut self, text: &str) -> Result<(), SessionError> {
        self.session.handle_message(text, &mut self.sink).map(|_| ())
    }
}

// ============================================================================
// Driver
// ============================================================================

/// An open socket and the callbacks feeding its client. Dropping the driver
/// detaches the callbacks, clears the keepalive and closes the socket.
pub(crate) struct SocketDriver {
    socket: WebSocket,
    _keepalive: Rc<RefCell<Option<Interval>>>,
    _listeners: Vec<Listener>,
}

/// Open a socket to `path` on the page's origin and feed `build`'s client.
pub(crate) fn connect<C: SocketClient + 'static>(
    path: &str,
    period: Duration,
    build: impl FnOnce(WsTransport) -> C,
) -> Result<SocketDriver, WebError> {
    let location = dom::window()?.location();
    let url = markup::socket_url(
        &location.protocol().map_err(dom::js_error)?,
        &location.host().map_err(dom::js_error)?,
        path,
    );
    let socket = WebSocket::new(&url).map_err(dom::js_error)?;
    let client = Rc::new(RefCell::new(build(WsTransport {
        socket: socket.clone(),
    })));
    let keepalive: Rc<RefCell<Option<Interval>>> = Rc::default();

    let on_open = {
        let client = Rc::clone(&client);
        let keepalive = Rc::clone(&keepalive);
        let url = url.clone();
        move |_| {
            debug!(message = "socket.open", %url);
            let token = match client.borrow_mut().on_open() {
                Ok(Some(token)) => token,
                Ok(None) => return,
                Err(err) => {
                    error!(message = "socket.open.failed", %url, %err);
                    return;
                }
            };
            let weak = Rc::downgrade(&client);
            let tick = move || {
                let Some(client) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = client.borrow_mut().on_tick(token) {
                    warn!(message = "socket.keepalive.failed", %err);
                }
            };
            match Interval::new(period, tick) {
                Ok(interval) => *keepalive.borrow_mut() = Some(interval),
                Err(err) => error!(message = "socket.keepalive.unscheduled", %err),
            }
        }
    };

    let on_message = {
        let client = Rc::clone(&client);
        move |event: web_sys::Event| {
            let Some(text) = event
                .dyn_into::<MessageEvent>()
                .ok()
                .and_then(|event| event.data().as_string())
            else {
                warn!(message = "socket.message.not_text");
                return;
            };
            if let Err(err) = client.borrow_mut().on_message(&text) {
                warn!(message = "socket.message.rejected", %err);
            }
        }
    };

    let on_close = {
        let keepalive = Rc::clone(&keepalive);
        let url = url.clone();
        move |_| {
            client.borrow_mut().on_close();
            keepalive.borrow_mut().take();
            debug!(message = "socket.closed", %url);
        }
    };

    let listeners = vec![
        Listener::new(&socket, "open", on_open)?,
        Listener::new(&socket, "message", on_message)?,
        Listener::new(&socket, "close", on_close)?,
    ];
    Ok(SocketDriver {
        socket,
        _keepalive: keepalive,
        _listeners: listeners,
    })
}

impl Drop for SocketDriver {
    fn drop(&mut self) {
        let state = self.socket.ready_state();
        if state == WebSocket::CONNECTING || state == WebSocket::OPEN {
            if let Err(err) = self.socket.close_with_code(NORMAL_CLOSURE) {
                debug!(message = "socket.close.failed", url = %self.socket.url(), err = ?err);
            }
        }
    }
}
