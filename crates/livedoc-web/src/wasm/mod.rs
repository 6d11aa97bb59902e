#![forbid(unsafe_code)]

//! `wasm-bindgen` exports.
//!
//! [`LiveApp`] owns every mounted component. Components own their listeners,
//! timers and sockets, so [`LiveApp::clear`] (or dropping the app) detaches
//! the whole dashboard. Only compiled on `wasm32` targets.

mod banner;
mod controls;
mod dom;
mod fetch;
mod overlay;
mod renders;
mod server_log;
mod socket;
mod storage;

use js_sys::Reflect;
use livedoc_overlay::TransitionConfig;
use livedoc_session::{LiveConfig, LogSession, RenderSession};
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Document;

use self::banner::BannerView;
use self::controls::Controls;
use self::overlay::MountedOverlay;
use self::renders::RenderDashboard;
use self::server_log::LogTable;
use self::socket::{LogClient, RenderClient, SocketDriver};
use crate::error::WebError;
use crate::logging;
use crate::markup::CONFIG_SCRIPT_ID;

fn console_call(method: &str, msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(function) = Reflect::get(&console, &method.into()) else {
        return;
    };
    let Ok(function) = function.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = function.call1(&console, &JsValue::from_str(msg));
}

fn console_error(msg: &str) {
    console_call("error", msg);
}

fn console_log(msg: &str) {
    console_call("log", msg);
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn to_js(err: WebError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// Dashboard
// ============================================================================

/// Everything mounted for one page. Field order is drop order: sockets
/// close before the components they feed go away.
struct Dashboard {
    _render_socket: Option<SocketDriver>,
    _log_socket: Option<SocketDriver>,
    _controls: Option<Controls>,
    _overlays: Vec<MountedOverlay>,
}

impl Dashboard {
    fn mount(config_json: Option<&str>) -> Result<Self, WebError> {
        let document = dom::document()?;
        let config = read_config(&document, config_json)?;
        if !logging::init(&config.log_level, console_log) {
            debug!(message = "logging.already_installed");
        }
        let page_path = dom::window()?.location().pathname().map_err(dom::js_error)?;

        let mut render_socket = None;
        let mut controls = None;
        let mut overlays = Vec::new();
        if let Some(quarto) = config.quarto() {
            let transition = TransitionConfig::from(config.transition);
            let renders = overlay::mount(&document, &quarto.renders, transition)?;
            let responses = overlay::mount(&document, &quarto.responses, transition)?;
            let inputs = overlay::mount(&document, &quarto.inputs, transition)?;

            let strip = Controls::mount(
                &document,
                renders.handle().clone(),
                responses.handle().clone(),
                inputs.handle().clone(),
                page_path.clone(),
            )?;
            let banner = if quarto.banner {
                Some(BannerView::mount(&document, Some(strip.element()))?)
            } else {
                None
            };
            let sink = RenderDashboard::new(
                &document,
                renders.handle().clone(),
                responses.handle().clone(),
                &quarto.table,
                &quarto.container,
                quarto.include_logs,
                banner,
                page_path.clone(),
            )?;

            let session_config = config.render_session(&page_path);
            let url = session_config.socket_url();
            render_socket = Some(socket::connect(&url, config.keepalive(), |transport| {
                RenderClient {
                    session: RenderSession::new(session_config, transport),
                    sink,
                }
            })?);
            controls = Some(strip);
            overlays = vec![renders, responses, inputs];
        }

        let mut log_socket = None;
        if let Some(server) = config.server() {
            let sink = LogTable::new(&document, server)?;
            let interval = config.keepalive();
            log_socket = Some(socket::connect(
                LogSession::<socket::WsTransport>::SOCKET_URL,
                interval,
                |transport| LogClient {
                    session: LogSession::with_interval(transport, interval),
                    sink,
                },
            )?);
        }

        info!(
            message = "dashboard.mounted",
            page = %page_path,
            quarto = config.quarto().is_some(),
            server = config.server().is_some(),
        );
        Ok(Self {
            _render_socket: render_socket,
            _log_socket: log_socket,
            _controls: controls,
            _overlays: overlays,
        })
    }
}

/// Config passed by the caller, else the page's config script, else the
/// defaults.
fn read_config(document: &Document, config_json: Option<&str>) -> Result<LiveConfig, WebError> {
    let raw = match config_json {
        Some(raw) => Some(raw.to_owned()),
        None => dom::by_id(document, CONFIG_SCRIPT_ID).and_then(|script| script.text_content()),
    };
    match raw.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => Ok(LiveConfig::from_json_str(&raw)?),
        None => Ok(LiveConfig::default()),
    }
}

// ============================================================================
// Export
// ============================================================================

/// Live dashboard of a documentation page.
#[wasm_bindgen]
pub struct LiveApp {
    dashboard: Option<Dashboard>,
}

#[wasm_bindgen]
impl LiveApp {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        install_panic_hook();
        Self { dashboard: None }
    }

    /// Mount the dashboard, replacing any mounted one. `config` is the JSON
    /// config; when omitted the `<script id="live-config">` element is read.
    pub fn mount(&mut self, config: Option<String>) -> Result<(), JsValue> {
        self.dashboard = None;
        self.dashboard = Some(Dashboard::mount(config.as_deref()).map_err(to_js)?);
        Ok(())
    }

    /// Detach listeners, timers and sockets.
    pub fn clear(&mut self) {
        self.dashboard = None;
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.dashboard.is_some()
    }
}

impl Default for LiveApp {
    fn default() -> Self {
        Self::new()
    }
}
