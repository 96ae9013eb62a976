//! A narrow slice of Linux's evdev ABI, enough to enumerate and poll a
//! HOTAS-style joystick: absolute axes (`EV_ABS`) and buttons (`EV_KEY`).
//!
//! Unlike a typical evdev client this module never reads the device's
//! event ring buffer. `InputSource::poll` is a pull API (see
//! `crate::input`), so `Device::sync_state` re-reads the kernel's current
//! idea of every axis and key directly via `EVIOCGABS`/`EVIOCGKEY` on each
//! call. That ioctl round-trip doesn't block and never falls behind a
//! full ring buffer the way event-stream reading can.

#![allow(non_camel_case_types)]

pub mod raw;

use ::anyhow::Result;
use ::bitflags::bitflags;
use ::fixedbitset::FixedBitSet;
use ::std::ffi::CStr;
use ::std::fs::{File, OpenOptions};
use ::std::os::unix::io::{AsRawFd, RawFd};
use ::std::path::Path;

use raw::*;

macro_rules! do_ioctl {
    ($name:ident($($arg:expr),+)) => {{
        unsafe { raw::$name($($arg,)+) }?
    }};
}

macro_rules! do_ioctl_buf {
    ($buf:ident, $name:ident, $fd:expr) => {{
        unsafe {
            let blen = $buf.len();
            let len = raw::$name($fd, &mut $buf[..])?;
            if len >= 0 {
                $buf[blen - 1] = 0;
                Some(CStr::from_ptr(&mut $buf[0] as *mut u8 as *mut _).to_owned())
            } else {
                None
            }
        }
    }};
}

bitflags! {
    /// Event types a device can report, as a bitset indexed by `EV_*`.
    pub struct Types: u32 {
        const KEY = 1 << 0x01;
        const ABSOLUTE = 1 << 0x03;
    }
}

/// Axis codes relevant to a HOTAS-style joystick (`linux/input-event-codes.h`).
#[allow(dead_code)]
pub mod abs_code {
    pub const ABS_X: u32 = 0x00;
    pub const ABS_Y: u32 = 0x01;
    pub const ABS_Z: u32 = 0x02;
    pub const ABS_RX: u32 = 0x03;
    pub const ABS_RY: u32 = 0x04;
    pub const ABS_RZ: u32 = 0x05;
    pub const ABS_THROTTLE: u32 = 0x06;
    pub const ABS_MAX: u32 = 0x3f;
}

/// Button codes: the joystick button range starts at `BTN_JOYSTICK`.
pub const BTN_JOYSTICK_BASE: u32 = 0x120;
pub const MAX_BUTTONS: usize = 32;

#[derive(Clone, Debug, Default)]
pub struct DeviceState {
    /// Indexed by raw `ABS_*` code, `None` if the device doesn't report it.
    pub abs_vals: Vec<Option<input_absinfo>>,
    /// Set = button pressed, indexed by `code - BTN_JOYSTICK_BASE`.
    pub key_vals: FixedBitSet,
}

pub struct Device {
    file: File,
    ty: Types,
    name: String,
    id: input_id,
    abs_bits: u64,
    state: DeviceState,
}

impl AsRawFd for Device {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Device {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_id(&self) -> input_id {
        self.id
    }

    pub fn events_supported(&self) -> Types {
        self.ty
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Looks like a joystick if it has at least one absolute axis and at
    /// least one button in the joystick/gamepad button range.
    pub fn looks_like_joystick(&self) -> bool {
        self.ty.contains(Types::ABSOLUTE) && self.abs_bits != 0
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Device> {
        let file = OpenOptions::new()
            .read(true)
            .write(false)
            .create(false)
            .open(path.as_ref())?;
        let fd = file.as_raw_fd();

        let mut bits: u32 = 0;
        do_ioctl!(eviocgbit(fd, 0, 4, &mut bits as *mut u32 as *mut u8));
        let ty = Types::from_bits_truncate(bits);

        let mut buf = [0u8; 256];
        let name = do_ioctl_buf!(buf, eviocgname, fd)
            .map(|c| c.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut id: input_id = unsafe { ::std::mem::zeroed() };
        do_ioctl!(eviocgid(fd, &mut id));

        let mut abs_bits: u64 = 0;
        if ty.contains(Types::ABSOLUTE) {
            do_ioctl!(eviocgbit(
                fd,
                Types::ABSOLUTE.bits().trailing_zeros(),
                8,
                &mut abs_bits as *mut u64 as *mut u8
            ));
        }

        let mut abs_vals = vec![None; (abs_code::ABS_MAX + 1) as usize];
        for code in 0..=abs_code::ABS_MAX {
            if abs_bits & (1u64 << code) != 0 {
                let mut info = input_absinfo::default();
                do_ioctl!(eviocgabs(fd, code, &mut info));
                abs_vals[code as usize] = Some(info);
            }
        }

        let mut dev = Device {
            file,
            ty,
            name,
            id,
            abs_bits,
            state: DeviceState {
                abs_vals,
                key_vals: FixedBitSet::with_capacity(MAX_BUTTONS),
            },
        };
        dev.sync_state()?;
        Ok(dev)
    }

    /// Re-reads every supported absolute axis and the joystick button
    /// bitmap from the kernel. Cheap (a handful of ioctls), never blocks.
    pub fn sync_state(&mut self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        for code in 0..=abs_code::ABS_MAX {
            if self.abs_bits & (1u64 << code) != 0 {
                let mut info = input_absinfo::default();
                do_ioctl!(eviocgabs(fd, code, &mut info));
                self.state.abs_vals[code as usize] = Some(info);
            }
        }
        if self.ty.contains(Types::KEY) {
            let mut raw_key_vals = [0u8; 96]; // covers codes 0..767
            do_ioctl!(eviocgkey(fd, &mut raw_key_vals[..]));
            for i in 0..MAX_BUTTONS {
                let code = BTN_JOYSTICK_BASE as usize + i;
                let byte = code / 8;
                let bit = code % 8;
                let down = byte < raw_key_vals.len() && raw_key_vals[byte] & (1 << bit) != 0;
                self.state.key_vals.set(i, down);
            }
        }
        Ok(())
    }

    /// Normalized value of `abs_code` in `[-1.0, 1.0]`, or `0.0` if the
    /// device doesn't report that axis.
    pub fn axis(&self, abs_code: u32) -> f32 {
        match self.state.abs_vals.get(abs_code as usize).and_then(|v| *v) {
            Some(info) if info.maximum > info.minimum => {
                let span = (info.maximum - info.minimum) as f32;
                let mid = (info.maximum as f32 + info.minimum as f32) / 2.0;
                ((info.value as f32 - mid) / (span / 2.0)).clamp(-1.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn button(&self, index: usize) -> bool {
        self.state.key_vals.contains(index)
    }
}

/// Crawls `/dev/input` for evdev nodes that look like a joystick.
/// Never bubbles up per-device open errors; a device this process has no
/// permission to open, or that isn't evdev at all, is silently skipped.
pub fn enumerate() -> Result<Vec<Device>> {
    let mut out = Vec::new();
    let entries = match ::std::fs::read_dir("/dev/input") {
        Ok(e) => e,
        Err(_) => return Ok(out),
    };
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }
        if let Ok(dev) = Device::open(&path) {
            if dev.looks_like_joystick() {
                out.push(dev);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absinfo(min: i32, max: i32, value: i32) -> input_absinfo {
        input_absinfo {
            value,
            minimum: min,
            maximum: max,
            fuzz: 0,
            flat: 0,
            resolution: 0,
        }
    }

    #[test]
    fn axis_normalizes_centered_range_to_zero() {
        let info = absinfo(-32768, 32767, 0);
        let span = (info.maximum - info.minimum) as f32;
        let mid = (info.maximum as f32 + info.minimum as f32) / 2.0;
        let norm = (info.value as f32 - mid) / (span / 2.0);
        assert!(norm.abs() < 1e-6);
    }

    #[test]
    fn axis_normalizes_extremes_to_plus_minus_one() {
        let info = absinfo(0, 255, 255);
        let span = (info.maximum - info.minimum) as f32;
        let mid = (info.maximum as f32 + info.minimum as f32) / 2.0;
        let norm = ((info.value as f32 - mid) / (span / 2.0)).clamp(-1.0, 1.0);
        assert!((norm - 1.0).abs() < 1e-6);
    }
}
