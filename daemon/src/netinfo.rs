//! `GET /api/network/adapters` and `GET /api/usb/devices`:
//! enumeration of the two external collaborators treated as
//! out of scope for the core ("USB/HID device enumeration... abstracted
//! as 'list input devices'"). USB device listing reuses
//! `crate::evdev::enumerate`; network adapters use `nix::ifaddrs`, which
//! is already pulled in for the evdev ioctl bindings' dependency (`nix`).

use ::serde_derive::Serialize;
use ::std::net::Ipv4Addr;

use crate::evdev;

#[derive(Clone, Debug, Serialize)]
pub struct AdapterInfo {
    pub name: String,
    pub address: Ipv4Addr,
}

/// Lists every local IPv4 adapter address, deduplicated by (name,
/// address). Loopback is included; the operator can still choose not to
/// bind to it from the settings UI.
pub fn list_adapters() -> Vec<AdapterInfo> {
    let mut out = Vec::new();
    let addrs = match ::nix::ifaddrs::getifaddrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            ::log::warn!("enumerating network adapters failed: {}", e);
            return out;
        }
    };
    for ifaddr in addrs {
        let std_addr = match ifaddr.address {
            Some(::nix::sys::socket::SockAddr::Inet(inet)) => inet.to_std(),
            _ => continue,
        };
        if let ::std::net::SocketAddr::V4(v4) = std_addr {
            out.push(AdapterInfo {
                name: ifaddr.interface_name,
                address: *v4.ip(),
            });
        }
    }
    out
}

#[derive(Clone, Debug, Serialize)]
pub struct UsbDeviceInfo {
    pub name: String,
    pub vendor: u16,
    pub product: u16,
}

/// Lists `/dev/input/event*` nodes that look like a joystick (
/// `/api/usb/devices`), independent of which one (if any) is currently
/// open as the live hardware input source.
pub fn list_input_devices() -> Vec<UsbDeviceInfo> {
    evdev::enumerate()
        .unwrap_or_default()
        .into_iter()
        .map(|dev| {
            let id = dev.input_id();
            UsbDeviceInfo {
                name: dev.name().to_owned(),
                vendor: id.vendor,
                product: id.product,
            }
        })
        .collect()
}
