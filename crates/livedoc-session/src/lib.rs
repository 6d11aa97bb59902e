#![forbid(unsafe_code)]

//! Live sessions of the documentation dashboard.
//!
//! Two sockets feed the dashboard while the development server runs: render
//! events (`/api/dev/quarto`) and server logs (`/api/dev/log`). This crate
//! holds everything about them that does not need a browser:
//!
//! - wire entities and batch decoding ([`event`]);
//! - the keepalive bound to each socket's lifecycle ([`keepalive`],
//!   [`transport`]);
//! - the render session state machine and its row/panel presentation
//!   ([`render`]);
//! - the server-log session and log-line formatting ([`server_log`]);
//! - REST bodies and response summaries ([`requests`]), the banner
//!   ([`banner`]) and its controls ([`controls`]);
//! - page configuration ([`config`]).
//!
//! Hosts forward socket events and implement [`RenderSink`] / [`LogSink`];
//! the sessions decide what is sent, shown and flashed.

pub mod banner;
pub mod config;
pub mod controls;
pub mod error;
pub mod event;
pub mod keepalive;
pub mod render;
pub mod requests;
pub mod server_log;
pub mod transport;

pub use banner::{BANNER_ID, Banner, BannerMessage, BannerOutcome, BannerUpdate};
pub use config::{ConfigError, ElementConfig, LiveConfig, OverlayConfig, QuartoConfig, ServerConfig};
pub use controls::{ControlAction, FormError, FormKind, LatestResponse};
pub use error::{SessionError, Stream};
pub use event::{Batch, LogBatch, LogEvent, RenderBatch, RenderEvent, RenderKind, RenderTrigger};
pub use keepalive::{KEEPALIVE_INTERVAL, KEEPALIVE_MESSAGE, Keepalive, KeepaliveToken, SocketPhase};
pub use render::{BatchPhase, BatchReport, RenderSession, RenderSessionConfig, RenderSink};
pub use requests::{
    ApiRequest, LastRequest, Method, RenderFilter, RenderRequest, RenderTarget, ResponseParts,
    ResponseSummary, TargetKind,
};
pub use server_log::{LogMessage, LogRow, LogSession, LogSink, MessageTone, RowHighlight};
pub use transport::{Connection, NORMAL_CLOSURE, RecordingTransport, Transport};
