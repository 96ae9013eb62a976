//! Raw ioctl bindings for the subset of the Linux evdev ABI the joystick
//! input source needs: capability bits, absolute-axis info, and the
//! current key (button) bitmap. Force-feedback, LED, switch and sound
//! ioctls live on `/dev/input/eventN` too but nothing in this daemon drives
//! them, so they are not bound here.

use ::nix::{convert_ioctl_res, ioctl_read, ioctl_read_buf, request_code_read};

ioctl_read!(eviocgid, b'E', 0x02, input_id);
ioctl_read!(eviocgversion, b'E', 0x01, ::libc::c_int);

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct input_id {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct input_absinfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

impl ::std::default::Default for input_absinfo {
    fn default() -> Self {
        unsafe { ::std::mem::zeroed() }
    }
}

ioctl_read_buf!(eviocgname, b'E', 0x06, u8);
ioctl_read_buf!(eviocgphys, b'E', 0x07, u8);
ioctl_read_buf!(eviocguniq, b'E', 0x08, u8);
ioctl_read_buf!(eviocgprop, b'E', 0x09, u8);
ioctl_read_buf!(eviocgkey, b'E', 0x18, u8);

/// `EVIOCGBIT(ev, len)`: query which codes of event type `ev` the device
/// supports (ev=0 queries the set of supported event types themselves).
pub unsafe fn eviocgbit(
    fd: ::libc::c_int,
    ev: u32,
    len: ::libc::c_int,
    buf: *mut u8,
) -> ::nix::Result<i32> {
    convert_ioctl_res!(::nix::libc::ioctl(
        fd,
        request_code_read!(b'E', 0x20 + ev, len) as ::libc::c_ulong,
        buf
    ))
}

/// `EVIOCGABS(abs)`: query the current value, range and fuzz of one
/// absolute axis.
pub unsafe fn eviocgabs(
    fd: ::libc::c_int,
    abs: u32,
    buf: *mut input_absinfo,
) -> ::nix::Result<i32> {
    convert_ioctl_res!(::nix::libc::ioctl(
        fd,
        request_code_read!(b'E', 0x40 + abs, ::std::mem::size_of::<input_absinfo>())
            as ::libc::c_ulong,
        buf
    ))
}
