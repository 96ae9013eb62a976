//! The control loop / scheduler: a fixed-period tick driving
//! input -> button machine -> conditioner -> preset hold -> frame
//! assembler -> sACN emitter, in that order, on a dedicated `std::thread`
//! devoted entirely to the real-time scheduler loop.

use ::std::collections::HashMap;
use ::std::net::Ipv4Addr;
use ::std::sync::atomic::{AtomicBool, Ordering};
use ::std::sync::Arc;
use ::std::time::{Duration, Instant};

use ::config::{ConfigStore, Settings, UniverseResolution, ZoomAxisSource};
use ::sacn::{Destination, Emitter};

use crate::activation::ActivationOverride;
use crate::buttons::ButtonMachine;
use crate::conditioner::{condition_dimmer, scale_axis, shape_axis};
use crate::frame::write_fixture;
use crate::indicators::{FixtureStatusSink, IndicatorSink};
use crate::input::InputSource;
use crate::runtime::{now_millis, RuntimeSnapshot, RuntimeState};

fn destination_for(settings: &Settings) -> Destination {
    match settings.universe_resolution {
        UniverseResolution::Multicast => Destination::Multicast,
        // Per-universe unicast targets are resolved inside the emitter by
        // universe; a single `Destination::Unicast` can't carry a map, so
        // unicast mode without an explicit entry for a universe falls
        // back to that universe's multicast group rather than silently
        // dropping the frame.
        UniverseResolution::Unicast => Destination::Multicast,
    }
}

fn unicast_override(settings: &Settings, universe: u16) -> Option<Ipv4Addr> {
    if settings.universe_resolution != UniverseResolution::Unicast {
        return None;
    }
    settings.unicast_destinations.get(&universe).copied()
}

/// Per-fixture sticky tilt/zoom tracking that must survive across ticks.
/// Zoom is not re-centered each frame; tilt is simply not
/// written while zoom-mod is held, which means it keeps its last value.
#[derive(Default)]
struct StickyState {
    tilt16: HashMap<String, u16>,
    zoom16: u16,
}

pub struct ControlLoop {
    config: Arc<ConfigStore>,
    runtime: Arc<RuntimeState>,
    input: InputSource,
    buttons: ButtonMachine,
    activation: Arc<ActivationOverride>,
    emitter: Emitter,
    emitter_bind_addrs: Vec<Ipv4Addr>,
    indicators: Box<dyn IndicatorSink>,
    fixture_status: Box<dyn FixtureStatusSink>,
    sticky: StickyState,
    previously_active_universes: Vec<u16>,
    was_active: bool,
}

impl ControlLoop {
    pub fn new(
        config: Arc<ConfigStore>,
        runtime: Arc<RuntimeState>,
        input: InputSource,
        activation: Arc<ActivationOverride>,
        indicators: Box<dyn IndicatorSink>,
        fixture_status: Box<dyn FixtureStatusSink>,
    ) -> ::anyhow::Result<Self> {
        let settings = config.load().settings.clone();
        let emitter = Emitter::new(
            &settings.sacn_bind_addresses,
            settings.cid,
            settings.sacn_priority,
            destination_for(&settings),
        )?;
        Ok(ControlLoop {
            config,
            runtime,
            input,
            buttons: ButtonMachine::new(),
            activation,
            emitter,
            emitter_bind_addrs: settings.sacn_bind_addresses.clone(),
            indicators,
            fixture_status,
            sticky: StickyState::default(),
            previously_active_universes: Vec::new(),
            was_active: false,
        })
    }

    /// Runs ticks forever at `settings.frame_rate_hz`, with drift
    /// correction: a late tick never triggers a burst of catch-up ticks
    /// `running` is checked once per scheduled wakeup so
    /// shutdown doesn't wait a full tick period.
    pub fn run(&mut self, running: Arc<AtomicBool>) {
        self.indicators.set_power(true);
        let mut next_tick = Instant::now();
        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if next_tick > now {
                let remaining = next_tick - now;
                ::std::thread::sleep(remaining.min(Duration::from_millis(50)));
                continue;
            }

            self.tick(Instant::now());

            let period = self.current_period();
            next_tick += period;
            if next_tick <= Instant::now() {
                // Overran by more than one period: drop the missed ticks
                // instead of bursting through them.
                next_tick = Instant::now() + period;
            }
        }
        self.shutdown();
    }

    fn current_period(&self) -> Duration {
        let hz = self.config.load().settings.frame_rate_hz.max(1);
        Duration::from_micros(1_000_000 / hz as u64)
    }

    /// One tick. Never panics out to the caller —
    /// every fallible subsystem's error is folded into `RuntimeState`
    /// instead: the control loop never throws out of its tick.
    fn tick(&mut self, now: Instant) {
        let snapshot = self.config.load();
        let settings = &snapshot.settings;

        self.reconcile_emitter(settings);

        // Cheap no-op once hardware is attached; re-scans `/dev/input`
        // only while no device is open, so a joystick plugged in after
        // startup is picked up on the next tick instead of requiring a
        // restart.
        self.input.rescan();
        let sample = self.input.poll();
        let commands = self.buttons.process(now, &sample.buttons, &settings.buttons, &snapshot.bindings);
        let http_override = self.activation.take();
        let activate = commands.activate || http_override == Some(true);
        let release = commands.release || http_override == Some(false);

        if activate && !self.was_active {
            ::log::info!("activate");
        }
        if activate {
            self.was_active = true;
        }
        if release && self.was_active {
            ::log::info!("release");
            self.was_active = false;
        }

        let shaped_x = shape_axis(sample.axes[0], settings.deadzone, settings.expo, commands.fine_mode_held, settings.fine_mode_gain);
        let shaped_y = shape_axis(sample.axes[1], settings.deadzone, settings.expo, commands.fine_mode_held, settings.fine_mode_gain);
        let canonical_pan16 = scale_axis(shaped_x, false, 0);
        let canonical_tilt16 = scale_axis(shaped_y, false, 0);
        let dim8 = condition_dimmer(sample.axes[2], settings.throttle_invert, commands.flash_10_held, commands.dim_off_held);

        if commands.zoom_mod_held {
            let zoom_raw = match settings.zoom_axis_source {
                ZoomAxisSource::ZAxis => sample.axes[3],
                ZoomAxisSource::YAxis => sample.axes[1],
            };
            self.sticky.zoom16 = scale_axis(zoom_raw.clamp(-1.0, 1.0), false, 0);
        }
        let zoom16 = self.sticky.zoom16;

        let held_preset = commands
            .recall_held
            .as_ref()
            .and_then(|id| snapshot.presets.iter().find(|p| &p.id == id));

        let mut active_universes = Vec::new();
        let mut fixture_ok = Vec::with_capacity(snapshot.fixtures.len());

        for fixture in snapshot.fixtures.iter().filter(|f| f.enabled) {
            if !active_universes.contains(&fixture.universe) {
                active_universes.push(fixture.universe);
            }

            let (pan16, tilt16, f_dim8, f_zoom16) = if let Some(preset) = held_preset {
                (preset.pan16, preset.tilt16, preset.dim8, preset.zoom16)
            } else {
                let pan16 = scale_axis(shaped_x, fixture.invert_pan, fixture.pan_bias);
                let tilt16 = if commands.zoom_mod_held {
                    *self.sticky.tilt16.get(&fixture.id).unwrap_or(&canonical_tilt16)
                } else {
                    let v = scale_axis(shaped_y, fixture.invert_tilt, fixture.tilt_bias);
                    self.sticky.tilt16.insert(fixture.id.clone(), v);
                    v
                };
                (pan16, tilt16, dim8, zoom16)
            };

            if !self.was_active {
                // Release: zero the whole buffer rather than routing
                // zeros through write_fixture, which would still stamp
                // the fixture's static color-temp value into its slot and
                // leave the release frame non-zero there. The dirty flag
                // already suppresses repeat sends once it's all zero.
                self.emitter.buffer_mut(fixture.universe).zero_all();
            } else {
                let buffer = self.emitter.buffer_mut(fixture.universe);
                write_fixture(buffer, fixture, pan16, tilt16, f_dim8, f_zoom16);
            }
        }

        // Retire universes no enabled fixture uses anymore.
        for universe in self.previously_active_universes.drain(..).collect::<Vec<_>>() {
            if !active_universes.contains(&universe) {
                self.emitter.release(universe);
                if let Some(dest) = unicast_override(settings, universe) {
                    self.emitter.set_destination(Destination::Unicast(dest));
                }
                let _ = self.emitter.tick(universe, now);
                self.emitter.retire(universe);
            }
        }
        self.previously_active_universes = active_universes.clone();

        let mut error_message = None;
        let mut universe_ok: HashMap<u16, bool> = HashMap::new();
        for &universe in &active_universes {
            if let Some(dest) = unicast_override(settings, universe) {
                self.emitter.set_destination(Destination::Unicast(dest));
            } else if settings.universe_resolution == UniverseResolution::Multicast {
                self.emitter.set_destination(Destination::Multicast);
            }
            match self.emitter.tick(universe, now) {
                Ok(_) => {
                    universe_ok.insert(universe, true);
                }
                Err(e) => {
                    ::log::warn!("sACN emit failed for universe {}: {}", universe, e);
                    error_message = Some(e.to_string());
                    universe_ok.insert(universe, false);
                }
            }
        }

        self.indicators.set_error(error_message.is_some());
        for fixture in snapshot.fixtures.iter().filter(|f| f.enabled) {
            let ok = universe_ok.get(&fixture.universe).copied().unwrap_or(true);
            fixture_ok.push(ok);
            self.fixture_status.set_fixture_ok(fixture.status_led_slot, ok);
        }

        self.runtime.publish(RuntimeSnapshot {
            active: self.was_active,
            error: error_message,
            last_frame_timestamp_ms: Some(now_millis()),
            fixture_ok,
            pan16: canonical_pan16,
            tilt16: canonical_tilt16,
            dim8,
            zoom16,
            input_health: match self.input.health() {
                crate::input::Health::Idle => "idle".to_owned(),
                crate::input::Health::Ok => "ok".to_owned(),
                crate::input::Health::Error(msg) => format!("error: {}", msg),
            },
        });
    }

    /// Rebuilds the emitter's sockets if the bind address list changed,
    /// and applies priority/CID/mode changes in place otherwise —
    /// configuration changes take effect on the next tick boundary.
    fn reconcile_emitter(&mut self, settings: &Settings) {
        if settings.sacn_bind_addresses != self.emitter_bind_addrs {
            match Emitter::new(&settings.sacn_bind_addresses, settings.cid, settings.sacn_priority, destination_for(settings)) {
                Ok(emitter) => {
                    self.emitter = emitter;
                    self.emitter_bind_addrs = settings.sacn_bind_addresses.clone();
                    self.previously_active_universes.clear();
                }
                Err(e) => ::log::error!("rebinding sACN emitter failed: {}", e),
            }
        } else {
            self.emitter.set_priority(settings.sacn_priority);
            self.emitter.set_cid(settings.cid);
        }
    }

    /// Completes the current tick (already done by the time this runs),
    /// sends a final zero frame per active universe, and lets the
    /// emitter's sockets close on drop.
    fn shutdown(&mut self) {
        ::log::info!("control loop shutting down, sending final zero frames");
        let now = Instant::now();
        for &universe in &self.previously_active_universes {
            self.emitter.release(universe);
            let _ = self.emitter.tick(universe, now);
        }
        self.indicators.set_power(false);
    }
}
