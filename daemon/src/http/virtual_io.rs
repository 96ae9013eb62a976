//! `/api/virtual*`: the on-screen joystick used when no
//! HOTAS hardware is attached. `POST /api/virtual` writes continuous axis
//! values; `press`/`release` deliver discrete button edges, mirroring how
//! a physical device's digital inputs arrive one at a time rather than as
//! a polled bitmap.

use ::serde_derive::{Deserialize, Serialize};
use ::tiny_http::Request;

use super::json::{self, HttpResponse};
use super::AppState;

#[derive(Serialize)]
struct VirtualStatus {
    enabled: bool,
    axes: [f32; 4],
}

pub fn get_virtual(state: &AppState) -> HttpResponse {
    let sample = state.virtual_state.sample();
    json::json_ok(&VirtualStatus {
        enabled: state.virtual_state.is_enabled(),
        axes: sample.axes,
    })
}

#[derive(Deserialize, Default)]
struct VirtualAxes {
    enabled: Option<bool>,
    x: Option<f32>,
    y: Option<f32>,
    throttle: Option<f32>,
    #[serde(rename = "zaxis")]
    z: Option<f32>,
}

pub fn post_virtual(state: &AppState, request: &mut Request) -> HttpResponse {
    let body: VirtualAxes = match super::read_json_body(request) {
        Ok(b) => b,
        Err(e) => return json::bad_request(e),
    };
    if let Some(enabled) = body.enabled {
        state.virtual_state.set_enabled(enabled);
    }
    let current = state.virtual_state.sample();
    state.virtual_state.write_axes(
        body.x.unwrap_or(current.axes[0]),
        body.y.unwrap_or(current.axes[1]),
        body.throttle.unwrap_or(current.axes[2]),
        body.z.unwrap_or(current.axes[3]),
    );
    json::no_content()
}

#[derive(Deserialize)]
struct ButtonIndex {
    index: u32,
}

pub fn press(state: &AppState, request: &mut Request) -> HttpResponse {
    let body: ButtonIndex = match super::read_json_body(request) {
        Ok(b) => b,
        Err(e) => return json::bad_request(e),
    };
    state.virtual_state.press(body.index);
    json::no_content()
}

/// On release, the zoom axis is re-centered to 0:
/// unlike a physical z-axis, which springs back to center on its own, the
/// on-screen control has no return spring, so the UI release edge has to
/// do it explicitly.
pub fn release(state: &AppState, request: &mut Request) -> HttpResponse {
    let body: ButtonIndex = match super::read_json_body(request) {
        Ok(b) => b,
        Err(e) => return json::bad_request(e),
    };
    state.virtual_state.release(body.index);
    let current = state.virtual_state.sample();
    state.virtual_state.write_axes(current.axes[0], current.axes[1], current.axes[2], 0.0);
    json::no_content()
}
