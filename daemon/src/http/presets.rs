//! `/api/presets*` and `/api/preset-buttons`: capture,
//! rename, delete, recall, and button-binding for saved positions. Capture
//! and recall both read the live `RuntimeState` canonical axis values
//! rather than the raw input sample, so a preset records exactly what the
//! operator saw on `/api/status` at the moment of capture.

use ::serde_derive::Deserialize;
use ::tiny_http::Request;

use super::json::{self, HttpResponse};
use super::AppState;

pub fn list(state: &AppState) -> HttpResponse {
    let snapshot = state.config.load();
    json::json_ok(&*snapshot.presets)
}

#[derive(Deserialize, Default)]
struct PresetCreate {
    id: Option<String>,
    name: Option<String>,
}

/// Captures the current canonical pan/tilt/dim/zoom into a new preset.
/// Id and name are both optional; `ConfigStore::capture_preset`
/// assigns defaults for whichever is missing.
pub fn create(state: &AppState, request: &mut Request) -> HttpResponse {
    let body: PresetCreate = match super::read_json_body(request) {
        Ok(b) => b,
        Err(e) => return json::bad_request(e),
    };
    let runtime = state.runtime.load();
    match state.config.capture_preset(body.id, body.name, runtime.pan16, runtime.tilt16, runtime.dim8, runtime.zoom16) {
        Ok((_, preset)) => {
            state.persist();
            json::json_status(201, &preset)
        }
        Err(e) => json::error_response(&e),
    }
}

#[derive(Deserialize, Default)]
struct PresetPatch {
    name: Option<String>,
    /// If `true`, re-captures pan/tilt/dim/zoom from the current
    /// `RuntimeState` instead of just renaming.
    #[serde(default)]
    recapture: bool,
}

pub fn patch(state: &AppState, id: &str, request: &mut Request) -> HttpResponse {
    let body: PresetPatch = match super::read_json_body(request) {
        Ok(b) => b,
        Err(e) => return json::bad_request(e),
    };
    let use_current = if body.recapture {
        let runtime = state.runtime.load();
        Some((runtime.pan16, runtime.tilt16, runtime.dim8, runtime.zoom16))
    } else {
        None
    };
    match state.config.update_preset(id, use_current, body.name) {
        Ok(snapshot) => {
            state.persist();
            match snapshot.presets.iter().find(|p| p.id == id) {
                Some(preset) => json::json_ok(preset),
                None => json::not_found(format!("preset {} not found", id)),
            }
        }
        Err(e) => json::error_response(&e),
    }
}

pub fn delete(state: &AppState, id: &str) -> HttpResponse {
    match state.config.delete_preset(id) {
        Ok(_) => {
            state.persist();
            json::no_content()
        }
        Err(e) => json::error_response(&e),
    }
}

/// Recall is momentary and input-driven in the
/// control loop; this endpoint only reports whether the preset exists, it
/// doesn't itself hold it active. Holding a preset from the UI goes
/// through the virtual button press/release pair instead, the same path
/// a physical recall button uses.
pub fn recall(state: &AppState, id: &str) -> HttpResponse {
    let snapshot = state.config.load();
    match snapshot.presets.iter().find(|p| p.id == id) {
        Some(preset) => json::json_ok(preset),
        None => json::not_found(format!("preset {} not found", id)),
    }
}

#[derive(Deserialize)]
struct BindButton {
    button: u32,
    /// Empty string disassociates the button.
    #[serde(default)]
    preset_id: String,
}

pub fn bind_button(state: &AppState, request: &mut Request) -> HttpResponse {
    let body: BindButton = match super::read_json_body(request) {
        Ok(b) => b,
        Err(e) => return json::bad_request(e),
    };
    match state.config.bind_preset_button(body.button, &body.preset_id) {
        Ok(snapshot) => {
            state.persist();
            json::json_ok(&*snapshot.bindings)
        }
        Err(e) => json::error_response(&e),
    }
}
