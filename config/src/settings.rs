use ::serde_derive::{Deserialize, Serialize};
use ::std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// How a universe's destination address is chosen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniverseResolution {
    Multicast,
    Unicast,
}

/// Which raw axis feeds the zoom channel while zoom-mod is held.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomAxisSource {
    ZAxis,
    YAxis,
}

impl Default for ZoomAxisSource {
    fn default() -> Self {
        ZoomAxisSource::ZAxis
    }
}

/// Semantic button assignments. Each field holds a
/// joystick button index, or `None` if that action has no binding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonAssignments {
    pub activate: Option<u32>,
    pub release: Option<u32>,
    pub flash_10: Option<u32>,
    pub dim_off: Option<u32>,
    pub fine_mode: Option<u32>,
    pub zoom_mod: Option<u32>,
}

impl ButtonAssignments {
    /// All semantic-action indices currently assigned, for the
    /// admission-time overlap check against preset bindings.
    pub fn assigned_indices(&self) -> Vec<u32> {
        [
            self.activate,
            self.release,
            self.flash_10,
            self.dim_off,
            self.fine_mode,
            self.zoom_mod,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioPins {
    pub power_led: u32,
    pub error_led: u32,
}

impl Default for GpioPins {
    fn default() -> Self {
        GpioPins {
            power_led: 0,
            error_led: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub frame_rate_hz: u32,
    pub deadzone: f32,
    pub expo: f32,
    pub fine_mode_gain: f32,
    pub throttle_invert: bool,
    pub sacn_priority: u8,
    pub sacn_bind_addresses: Vec<Ipv4Addr>,
    pub universe_resolution: UniverseResolution,
    /// Explicit unicast destination per universe, only consulted when
    /// `universe_resolution == Unicast`.
    pub unicast_destinations: ::std::collections::HashMap<u16, Ipv4Addr>,
    pub gpio: GpioPins,
    pub buttons: ButtonAssignments,
    pub zoom_axis_source: ZoomAxisSource,
    /// UI-only gate for showing per-universe controls in `/api/fixtures`
    /// response and `/api/fixtures/config`. The core always
    /// supports multiple universes regardless of this flag's value.
    pub multi_universe_enabled: bool,
    /// 16-byte stable Component Identifier. Generated once on
    /// first start if absent from the persisted document.
    pub cid: [u8; 16],
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            frame_rate_hz: 40,
            deadzone: 0.08,
            expo: 0.35,
            fine_mode_gain: 0.20,
            throttle_invert: false,
            sacn_priority: 150,
            sacn_bind_addresses: Vec::new(),
            universe_resolution: UniverseResolution::Multicast,
            unicast_destinations: Default::default(),
            gpio: GpioPins::default(),
            buttons: ButtonAssignments::default(),
            zoom_axis_source: ZoomAxisSource::default(),
            multi_universe_enabled: true,
            cid: generate_cid(),
        }
    }
}

pub fn generate_cid() -> [u8; 16] {
    use ::rand::RngCore;
    let mut cid = [0u8; 16];
    ::rand::thread_rng().fill_bytes(&mut cid);
    cid
}

impl Settings {
    /// Validates field ranges and returns a normalized copy.
    /// Unknown/out-of-range values fail closed rather than silently
    /// clamping, except where clamping is expected explicitly
    /// (deadzone/expo/gain are clamped into range by the HTTP layer before
    /// this is called; here we just check the invariant holds).
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.deadzone) {
            return Err(Error::validation("deadzone must be in 0..=0.5"));
        }
        if !(0.0..=1.0).contains(&self.expo) {
            return Err(Error::validation("expo must be in 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.fine_mode_gain) {
            return Err(Error::validation("fine_mode_gain must be in 0..=1"));
        }
        if self.sacn_priority > 200 {
            return Err(Error::validation("sacn_priority must be in 0..=200"));
        }
        if self.frame_rate_hz == 0 || self.frame_rate_hz > 120 {
            return Err(Error::validation("frame_rate_hz must be in 1..=120"));
        }
        let assigned = self.buttons.assigned_indices();
        let mut seen = ::std::collections::HashSet::new();
        for idx in &assigned {
            if !seen.insert(idx) {
                return Err(Error::validation(format!(
                    "button index {} assigned to more than one semantic action",
                    idx
                )));
            }
        }
        Ok(())
    }
}
