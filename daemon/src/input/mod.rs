//! Input source: a pull `poll()` API over either a physical
//! HOTAS device or a virtual override written by the HTTP surface. The
//! two are a tagged variant behind one object rather than a trait with
//! two impls — the swap between them
//! has to be atomic and the virtual writer needs a handle independent of
//! whichever variant is live, so a shared `VirtualState` plus an
//! `enabled` flag is simpler than dynamic dispatch.

use ::std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use ::std::sync::Arc;

use crate::evdev;

pub const MAX_BUTTONS: usize = evdev::MAX_BUTTONS;

/// Axis ordering convention: 0=pan(x), 1=tilt(y), 2=throttle,
/// 3=z-axis/zoom.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSample {
    pub axes: [f32; 4],
    pub buttons: [bool; MAX_BUTTONS],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Health {
    /// No hardware device and virtual input is off.
    Idle,
    Ok,
    Error(String),
}

/// Shared, lock-free holder for the virtual joystick's last-written state.
/// HTTP handlers write into it; `InputSource::poll` reads it when virtual
/// mode is enabled. Axis floats are bit-cast into `AtomicU32` so reads and
/// writes never tear.
pub struct VirtualState {
    enabled: AtomicBool,
    axes: [AtomicU32; 4],
    buttons: AtomicU32,
}

impl Default for VirtualState {
    fn default() -> Self {
        VirtualState {
            enabled: AtomicBool::new(false),
            axes: [
                AtomicU32::new(0f32.to_bits()),
                AtomicU32::new(0f32.to_bits()),
                AtomicU32::new(0f32.to_bits()),
                AtomicU32::new(0f32.to_bits()),
            ],
            buttons: AtomicU32::new(0),
        }
    }
}

impl VirtualState {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn write_axes(&self, x: f32, y: f32, throttle: f32, zaxis: f32) {
        self.axes[0].store(x.to_bits(), Ordering::Relaxed);
        self.axes[1].store(y.to_bits(), Ordering::Relaxed);
        self.axes[2].store(throttle.to_bits(), Ordering::Relaxed);
        self.axes[3].store(zaxis.to_bits(), Ordering::Relaxed);
    }

    /// Virtual button edges arrive one at a time via `/api/virtual/press`
    /// and `/api/virtual/release`, unlike hardware which is read as a full
    /// bitmap each poll.
    pub fn press(&self, index: u32) {
        if (index as usize) < MAX_BUTTONS {
            self.buttons.fetch_or(1 << index, Ordering::Relaxed);
        }
    }

    pub fn release(&self, index: u32) {
        if (index as usize) < MAX_BUTTONS {
            self.buttons.fetch_and(!(1 << index), Ordering::Relaxed);
        }
    }

    pub fn sample(&self) -> InputSample {
        let mut axes = [0f32; 4];
        for i in 0..4 {
            axes[i] = f32::from_bits(self.axes[i].load(Ordering::Relaxed));
        }
        let bits = self.buttons.load(Ordering::Relaxed);
        let mut buttons = [false; MAX_BUTTONS];
        for (i, b) in buttons.iter_mut().enumerate() {
            *b = bits & (1 << i) != 0;
        }
        InputSample { axes, buttons }
    }
}

/// Wraps an optional hardware device plus the virtual override. Missing
/// hardware is not fatal: `poll` just returns zeroed axes and
/// `health()` reports `Idle` until a device shows up or virtual mode is
/// turned on.
pub struct InputSource {
    hardware: Option<evdev::Device>,
    virtual_state: Arc<VirtualState>,
}

impl InputSource {
    pub fn new(virtual_state: Arc<VirtualState>) -> Self {
        InputSource {
            hardware: None,
            virtual_state,
        }
    }

    /// Re-scans `/dev/input` for a joystick-looking device if none is
    /// currently open. A no-op once a device is attached, so the control
    /// loop can call it once per tick without a slow enumeration ever
    /// delaying a frame.
    pub fn rescan(&mut self) {
        if self.hardware.is_some() {
            return;
        }
        if let Ok(mut found) = evdev::enumerate() {
            if !found.is_empty() {
                self.hardware = Some(found.remove(0));
            }
        }
    }

    pub fn poll(&mut self) -> InputSample {
        if self.virtual_state.is_enabled() {
            return self.virtual_state.sample();
        }
        match &mut self.hardware {
            Some(dev) => {
                if dev.sync_state().is_err() {
                    self.hardware = None;
                    return InputSample::default();
                }
                let mut axes = [0f32; 4];
                axes[0] = dev.axis(evdev::abs_code::ABS_X);
                axes[1] = dev.axis(evdev::abs_code::ABS_Y);
                axes[2] = dev.axis(evdev::abs_code::ABS_THROTTLE);
                axes[3] = dev.axis(evdev::abs_code::ABS_Z);
                let mut buttons = [false; MAX_BUTTONS];
                for (i, b) in buttons.iter_mut().enumerate() {
                    *b = dev.button(i);
                }
                InputSample { axes, buttons }
            }
            None => InputSample::default(),
        }
    }

    pub fn health(&self) -> Health {
        if self.virtual_state.is_enabled() {
            Health::Ok
        } else if self.hardware.is_some() {
            Health::Ok
        } else {
            Health::Idle
        }
    }

    pub fn hardware_name(&self) -> Option<String> {
        self.hardware.as_ref().map(|d| d.name().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_state_round_trips_axes() {
        let vs = VirtualState::default();
        vs.write_axes(0.5, -0.25, 1.0, -1.0);
        let sample = vs.sample();
        assert_eq!(sample.axes, [0.5, -0.25, 1.0, -1.0]);
    }

    #[test]
    fn virtual_button_press_and_release() {
        let vs = VirtualState::default();
        vs.press(3);
        assert!(vs.sample().buttons[3]);
        vs.release(3);
        assert!(!vs.sample().buttons[3]);
    }

    #[test]
    fn poll_with_no_hardware_and_virtual_off_is_idle() {
        let vs = Arc::new(VirtualState::default());
        let source = InputSource::new(vs);
        assert_eq!(source.health(), Health::Idle);
    }
}
