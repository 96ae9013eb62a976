//! `/api/fixtures*`: CRUD over the fixture list plus the
//! CSV bulk-import endpoint and the `multi_universe_enabled` UI-gate
//! setter grouped under `/api/fixtures/config`.

use ::serde_derive::{Deserialize, Serialize};
use ::tiny_http::Request;

use ::config::Fixture;

use super::json::{self, HttpResponse};
use super::AppState;

#[derive(Serialize)]
struct FixturesResponse<'a> {
    fixtures: &'a [Fixture],
    multi_universe_enabled: bool,
}

pub fn list(state: &AppState) -> HttpResponse {
    let snapshot = state.config.load();
    json::json_ok(&FixturesResponse {
        fixtures: &snapshot.fixtures,
        multi_universe_enabled: snapshot.settings.multi_universe_enabled,
    })
}

pub fn create(state: &AppState, request: &mut Request) -> HttpResponse {
    let fixture: Fixture = match super::read_json_body(request) {
        Ok(f) => f,
        Err(e) => return json::bad_request(e),
    };
    match state.config.create_fixture(fixture) {
        Ok(snapshot) => {
            state.persist();
            json::json_status(201, &*snapshot.fixtures)
        }
        Err(e) => json::error_response(&e),
    }
}

/// Body is the raw CSV document (the fixture CSV schema), replacing
/// the whole fixture list atomically.
pub fn import(state: &AppState, request: &mut Request) -> HttpResponse {
    let text = match super::read_text_body(request) {
        Ok(t) => t,
        Err(e) => return json::bad_request(e),
    };
    let fixtures = match ::config::csv_schema::parse(&text) {
        Ok(f) => f,
        Err(e) => return json::error_response(&e),
    };
    match state.config.replace_fixtures(fixtures) {
        Ok(snapshot) => {
            state.persist();
            json::json_ok(&*snapshot.fixtures)
        }
        Err(e) => json::error_response(&e),
    }
}

#[derive(Deserialize)]
struct FixturesConfigPatch {
    multi_universe_enabled: bool,
}

pub fn set_config(state: &AppState, request: &mut Request) -> HttpResponse {
    let patch: FixturesConfigPatch = match super::read_json_body(request) {
        Ok(p) => p,
        Err(e) => return json::bad_request(e),
    };
    let mut settings = (*state.config.load().settings).clone();
    settings.multi_universe_enabled = patch.multi_universe_enabled;
    match state.config.apply_settings(settings) {
        Ok(snapshot) => {
            state.persist();
            json::json_ok(&*snapshot.settings)
        }
        Err(e) => json::error_response(&e),
    }
}

/// Partial update; every field optional so a caller can PATCH e.g. just
/// `invert_pan` without resending the whole fixture.
#[derive(Deserialize, Default)]
struct FixturePatch {
    enabled: Option<bool>,
    universe: Option<u16>,
    start_addr: Option<u16>,
    pan_coarse: Option<u16>,
    pan_fine: Option<u16>,
    tilt_coarse: Option<u16>,
    tilt_fine: Option<u16>,
    dimmer: Option<u16>,
    zoom: Option<u16>,
    zoom_fine: Option<u16>,
    color_temp_channel: Option<u16>,
    color_temp_value: Option<u8>,
    invert_pan: Option<bool>,
    invert_tilt: Option<bool>,
    pan_bias: Option<i16>,
    tilt_bias: Option<i16>,
    status_led_slot: Option<u32>,
}

pub fn patch(state: &AppState, id: &str, request: &mut Request) -> HttpResponse {
    let patch: FixturePatch = match super::read_json_body(request) {
        Ok(p) => p,
        Err(e) => return json::bad_request(e),
    };
    let result = state.config.update_fixture(id, |f| {
        if let Some(v) = patch.enabled {
            f.enabled = v;
        }
        if let Some(v) = patch.universe {
            f.universe = v;
        }
        if let Some(v) = patch.start_addr {
            f.start_addr = v;
        }
        if let Some(v) = patch.pan_coarse {
            f.pan_coarse = v;
        }
        if let Some(v) = patch.pan_fine {
            f.pan_fine = v;
        }
        if let Some(v) = patch.tilt_coarse {
            f.tilt_coarse = v;
        }
        if let Some(v) = patch.tilt_fine {
            f.tilt_fine = v;
        }
        if let Some(v) = patch.dimmer {
            f.dimmer = v;
        }
        if let Some(v) = patch.zoom {
            f.zoom = v;
        }
        if let Some(v) = patch.zoom_fine {
            f.zoom_fine = v;
        }
        if let Some(v) = patch.color_temp_channel {
            f.color_temp_channel = v;
        }
        if let Some(v) = patch.color_temp_value {
            f.color_temp_value = v;
        }
        if let Some(v) = patch.invert_pan {
            f.invert_pan = v;
        }
        if let Some(v) = patch.invert_tilt {
            f.invert_tilt = v;
        }
        if let Some(v) = patch.pan_bias {
            f.pan_bias = v;
        }
        if let Some(v) = patch.tilt_bias {
            f.tilt_bias = v;
        }
        if let Some(v) = patch.status_led_slot {
            f.status_led_slot = v;
        }
    });
    match result {
        Ok(snapshot) => {
            state.persist();
            json::json_ok(&*snapshot.fixtures)
        }
        Err(e) => json::error_response(&e),
    }
}

pub fn delete(state: &AppState, id: &str) -> HttpResponse {
    match state.config.delete_fixture(id) {
        Ok(_) => {
            state.persist();
            json::no_content()
        }
        Err(e) => json::error_response(&e),
    }
}
