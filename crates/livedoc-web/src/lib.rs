#![forbid(unsafe_code)]

//! Browser frontend of the live documentation dashboard.
//!
//! This crate provides [`LiveApp`], a `wasm-bindgen`-exported struct that
//! mounts the dashboard described by a page's
//! [`LiveConfig`](livedoc_session::LiveConfig): the renders, inputs and
//! responses overlays, the render and server-log sockets, their tables, the
//! banner and its controls.
//!
//! State machines live in `livedoc-overlay` and `livedoc-session`; this crate
//! only binds them to the DOM. The markup contract ([`markup`]) and console
//! logging ([`logging`]) compile natively and are tested off-target.

pub mod error;
pub mod logging;
pub mod markup;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::LiveApp;

pub use error::WebError;
