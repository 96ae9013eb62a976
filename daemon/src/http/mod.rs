//! JSON control surface: a `tiny_http` server with a
//! small pool of worker threads pulling from the same listener — the
//! documented way to use `tiny_http` across multiple threads, giving
//! several request-handling threads rather than one. Every write
//! endpoint goes through `ConfigStore`'s validate-then-publish path, so
//! the HTTP layer itself holds no domain invariants.

mod fixtures;
mod json;
mod presets;
mod settings;
mod status;
mod virtual_io;

use ::std::net::SocketAddr;
use ::std::sync::atomic::{AtomicBool, Ordering};
use ::std::sync::{Arc, Mutex};

use ::tiny_http::{Method, Request, Server};

use ::config::{ConfigStore, PersistPaths};

use crate::activation::ActivationOverride;
use crate::input::VirtualState;
use crate::logbuffer::LogRing;
use crate::runtime::RuntimeState;

const WORKER_THREADS: usize = 4;

pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub runtime: Arc<RuntimeState>,
    pub virtual_state: Arc<VirtualState>,
    pub activation: Arc<ActivationOverride>,
    pub log_ring: LogRing,
    pub persist_paths: PersistPaths,
    /// Client address with an unconfirmed `/api/restart` request pending.
    /// At most one restart confirmation is tracked per client session.
    restart_pending: Mutex<Option<SocketAddr>>,
    /// Flipped by a confirmed `/api/restart`; the control loop's run
    /// thread checks it once per tick and exits cleanly, then `main`
    /// exits the process so a process supervisor restarts it.
    pub running: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        config: Arc<ConfigStore>,
        runtime: Arc<RuntimeState>,
        virtual_state: Arc<VirtualState>,
        activation: Arc<ActivationOverride>,
        log_ring: LogRing,
        persist_paths: PersistPaths,
        running: Arc<AtomicBool>,
    ) -> Self {
        AppState {
            config,
            runtime,
            virtual_state,
            activation,
            log_ring,
            persist_paths,
            restart_pending: Mutex::new(None),
            running,
        }
    }

    /// Persists the current config snapshot after a successful mutation.
    /// A failure here is a `PersistenceError`: it's logged and the
    /// in-memory change stands — the next successful save reconciles it.
    fn persist(&self) {
        let snapshot = self.config.load();
        if let Err(e) = ::config::save_persisted(&self.persist_paths, &snapshot) {
            ::log::error!("persisting config failed: {}", e);
        }
    }
}

/// `running` is polled between requests (via a short `recv_timeout`
/// instead of the blocking `incoming_requests` iterator) so a confirmed
/// `/api/restart` or a process signal can stop every worker thread
/// without waiting on an idle connection.
pub fn serve(bind: &str, state: Arc<AppState>, running: Arc<AtomicBool>) -> ::anyhow::Result<()> {
    let server = Arc::new(Server::http(bind).map_err(|e| ::anyhow::anyhow!("binding HTTP server to {}: {}", bind, e))?);
    ::log::info!("HTTP control surface listening on {}", bind);

    let mut handles = Vec::with_capacity(WORKER_THREADS);
    for _ in 0..WORKER_THREADS {
        let server = server.clone();
        let state = state.clone();
        let running = running.clone();
        handles.push(::std::thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                match server.recv_timeout(::std::time::Duration::from_millis(200)) {
                    Ok(Some(request)) => handle(&state, request),
                    Ok(None) => continue,
                    Err(e) => {
                        ::log::warn!("HTTP accept failed: {}", e);
                        break;
                    }
                }
            }
        }));
    }
    for h in handles {
        let _ = h.join();
    }
    Ok(())
}

/// Manual method+path router: there is a short fixed list of routes, so
/// a match beats pulling in a routing framework.
fn handle(state: &AppState, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let remote: Option<SocketAddr> = *request.remote_addr();
    let path = url.split('?').next().unwrap_or(&url);
    let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (&method, segments.as_slice()) {
        (&Method::Get, ["api", "status"]) => status::get_status(state),
        (&Method::Get, ["api", "logs"]) => status::get_logs(state),
        (&Method::Get, ["api", "settings"]) => settings::get_settings(state),
        (&Method::Post, ["api", "settings"]) => settings::post_settings(state, &mut request),
        (&Method::Get, ["api", "fixtures"]) => fixtures::list(state),
        (&Method::Post, ["api", "fixtures"]) => fixtures::create(state, &mut request),
        (&Method::Post, ["api", "fixtures", "import"]) => fixtures::import(state, &mut request),
        (&Method::Post, ["api", "fixtures", "config"]) => fixtures::set_config(state, &mut request),
        (&Method::Patch, ["api", "fixtures", id]) => fixtures::patch(state, id, &mut request),
        (&Method::Delete, ["api", "fixtures", id]) => fixtures::delete(state, id),
        (&Method::Post, ["api", "activate"]) => status::activate(state),
        (&Method::Post, ["api", "release"]) => status::release(state),
        (&Method::Get, ["api", "virtual"]) => virtual_io::get_virtual(state),
        (&Method::Post, ["api", "virtual"]) => virtual_io::post_virtual(state, &mut request),
        (&Method::Post, ["api", "virtual", "press"]) => virtual_io::press(state, &mut request),
        (&Method::Post, ["api", "virtual", "release"]) => virtual_io::release(state, &mut request),
        (&Method::Get, ["api", "presets"]) => presets::list(state),
        (&Method::Post, ["api", "presets"]) => presets::create(state, &mut request),
        (&Method::Patch, ["api", "presets", id]) => presets::patch(state, id, &mut request),
        (&Method::Delete, ["api", "presets", id]) => presets::delete(state, id),
        (&Method::Post, ["api", "presets", id, "recall"]) => presets::recall(state, id),
        (&Method::Post, ["api", "preset-buttons"]) => presets::bind_button(state, &mut request),
        (&Method::Get, ["api", "network", "adapters"]) => status::network_adapters(),
        (&Method::Get, ["api", "usb", "devices"]) => status::usb_devices(),
        (&Method::Post, ["api", "restart"]) => status::restart(state, remote, &mut request),
        _ => json::not_found(format!("no route for {} {}", method_name(&method), path)),
    };

    if let Err(e) = request.respond(resp) {
        ::log::warn!("writing HTTP response failed: {}", e);
    }
}

fn method_name(m: &Method) -> &'static str {
    match m {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Patch => "PATCH",
        Method::Delete => "DELETE",
        Method::Put => "PUT",
        Method::Head => "HEAD",
        Method::Options => "OPTIONS",
        _ => "?",
    }
}

/// Reads and parses a JSON request body; callers map a parse failure to
/// a 400 response themselves so the error message stays specific to the
/// field being merged.
pub(crate) fn read_json_body<T: ::serde::de::DeserializeOwned>(request: &mut Request) -> Result<T, String> {
    let mut body = String::new();
    ::std::io::Read::read_to_string(request.as_reader(), &mut body).map_err(|e| e.to_string())?;
    ::serde_json::from_str(&body).map_err(|e| format!("invalid JSON body: {}", e))
}

pub(crate) fn read_text_body(request: &mut Request) -> Result<String, String> {
    let mut body = String::new();
    ::std::io::Read::read_to_string(request.as_reader(), &mut body).map_err(|e| e.to_string())?;
    Ok(body)
}

impl AppState {
    /// Implements the two-step `/api/restart` confirmation: the first
    /// call from a given client registers intent and returns without
    /// acting; a second confirmed call from the same client actually
    /// triggers the restart. A different client can't jump the queue
    /// while one confirmation is outstanding.
    pub(crate) fn request_restart(&self, remote: Option<SocketAddr>, confirm: bool) -> Result<bool, &'static str> {
        let mut pending = self.restart_pending.lock().unwrap();
        match (&*pending, confirm) {
            (_, true) if *pending == remote && remote.is_some() => {
                *pending = None;
                Ok(true)
            }
            (_, true) => Err("no matching restart confirmation is pending"),
            (Some(existing), false) if Some(*existing) != remote => {
                Err("a restart confirmation from another client is already pending")
            }
            (_, false) => {
                *pending = remote;
                Ok(false)
            }
        }
    }
}
