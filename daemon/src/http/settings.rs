//! `/api/settings`: `GET` returns the current settings document,
//! `POST` merges a partial JSON body onto it field-by-field and validates
//! the merged result before publishing — a PATCH in spirit, `POST` in
//! name.

use ::serde_derive::Deserialize;
use ::std::net::Ipv4Addr;
use ::tiny_http::Request;

use ::config::{ButtonAssignments, GpioPins, UniverseResolution, ZoomAxisSource};

use super::json::{self, HttpResponse};
use super::AppState;

pub fn get_settings(state: &AppState) -> HttpResponse {
    let snapshot = state.config.load();
    json::json_ok(&*snapshot.settings)
}

/// Every field optional; an absent field leaves the corresponding live
/// setting untouched.
#[derive(Deserialize, Default)]
struct SettingsPatch {
    frame_rate_hz: Option<u32>,
    deadzone: Option<f32>,
    expo: Option<f32>,
    fine_mode_gain: Option<f32>,
    throttle_invert: Option<bool>,
    sacn_priority: Option<u8>,
    sacn_bind_addresses: Option<Vec<Ipv4Addr>>,
    universe_resolution: Option<UniverseResolution>,
    unicast_destinations: Option<::std::collections::HashMap<u16, Ipv4Addr>>,
    gpio: Option<GpioPins>,
    buttons: Option<ButtonAssignments>,
    zoom_axis_source: Option<ZoomAxisSource>,
    multi_universe_enabled: Option<bool>,
}

pub fn post_settings(state: &AppState, request: &mut Request) -> HttpResponse {
    let patch: SettingsPatch = match super::read_json_body(request) {
        Ok(p) => p,
        Err(e) => return json::bad_request(e),
    };

    let mut settings = (*state.config.load().settings).clone();
    if let Some(v) = patch.frame_rate_hz {
        settings.frame_rate_hz = v;
    }
    if let Some(v) = patch.deadzone {
        settings.deadzone = v;
    }
    if let Some(v) = patch.expo {
        settings.expo = v;
    }
    if let Some(v) = patch.fine_mode_gain {
        settings.fine_mode_gain = v;
    }
    if let Some(v) = patch.throttle_invert {
        settings.throttle_invert = v;
    }
    if let Some(v) = patch.sacn_priority {
        settings.sacn_priority = v;
    }
    if let Some(v) = patch.sacn_bind_addresses {
        settings.sacn_bind_addresses = v;
    }
    if let Some(v) = patch.universe_resolution {
        settings.universe_resolution = v;
    }
    if let Some(v) = patch.unicast_destinations {
        settings.unicast_destinations = v;
    }
    if let Some(v) = patch.gpio {
        settings.gpio = v;
    }
    if let Some(v) = patch.buttons {
        settings.buttons = v;
    }
    if let Some(v) = patch.zoom_axis_source {
        settings.zoom_axis_source = v;
    }
    if let Some(v) = patch.multi_universe_enabled {
        settings.multi_universe_enabled = v;
    }

    match state.config.apply_settings(settings) {
        Ok(snapshot) => {
            state.persist();
            json::json_ok(&*snapshot.settings)
        }
        Err(e) => json::error_response(&e),
    }
}
