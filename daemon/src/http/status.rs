//! `/api/status`, `/api/logs`, `/api/activate`, `/api/release`,
//! `/api/network/adapters`, `/api/usb/devices` and `/api/restart`.
//! These handlers read `RuntimeState`/`LogRing` directly or nudge the
//! control loop via `ActivationOverride`; none of them touch `ConfigStore`.

use ::std::net::SocketAddr;
use ::tiny_http::Request;

use super::json::{self, HttpResponse};
use super::AppState;
use crate::netinfo;

pub fn get_status(state: &AppState) -> HttpResponse {
    let snapshot = state.runtime.load();
    json::json_ok(&*snapshot)
}

pub fn get_logs(state: &AppState) -> HttpResponse {
    json::text_ok(state.log_ring.render())
}

pub fn activate(state: &AppState) -> HttpResponse {
    state.activation.request_activate();
    json::no_content()
}

pub fn release(state: &AppState) -> HttpResponse {
    state.activation.request_release();
    json::no_content()
}

pub fn network_adapters() -> HttpResponse {
    json::json_ok(&netinfo::list_adapters())
}

pub fn usb_devices() -> HttpResponse {
    json::json_ok(&netinfo::list_input_devices())
}

/// Two-step confirmation: the body is `{"confirm": bool}`,
/// defaulting to `false` if absent or unparsable.
pub fn restart(state: &AppState, remote: Option<SocketAddr>, request: &mut Request) -> HttpResponse {
    let confirm = match super::read_text_body(request) {
        Ok(body) => ::serde_json::from_str::<::serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("confirm").and_then(|c| c.as_bool()))
            .unwrap_or(false),
        Err(_) => false,
    };

    match state.request_restart(remote, confirm) {
        Ok(true) => {
            ::log::warn!("restart confirmed via HTTP, shutting down control loop");
            state.running.store(false, ::std::sync::atomic::Ordering::SeqCst);
            json::json_ok(&::serde_json::json!({"restarting": true}))
        }
        Ok(false) => json::json_ok(&::serde_json::json!({"restarting": false, "confirmation_required": true})),
        Err(message) => json::bad_request(message),
    }
}
