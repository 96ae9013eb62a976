//! Sends the assembled DMX frames out as E1.31 over UDP. One
//! `Emitter` owns a socket per configured bind address (multi-NIC
//! fanout duplicates every packet across all of them) and the
//! per-universe sequence counters that `UniverseBuffer` hands out.

use ::std::collections::HashMap;
use ::std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use ::std::time::{Duration, Instant};

use crate::buffer::UniverseBuffer;
use crate::packet::build_data_packet;

pub const E131_PORT: u16 = 5568;
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// The well-known multicast group for a universe: 239.255.(hi).(lo).
    Multicast,
    Unicast(Ipv4Addr),
}

impl Destination {
    fn addr(self, universe: u16) -> Ipv4Addr {
        match self {
            Destination::Multicast => {
                let [hi, lo] = universe.to_be_bytes();
                Ipv4Addr::new(239, 255, hi, lo)
            }
            Destination::Unicast(addr) => addr,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("binding sACN socket to {addr}: {source}")]
    Bind {
        addr: Ipv4Addr,
        #[source]
        source: ::std::io::Error,
    },
    #[error("sending sACN packet to {addr}: {source}")]
    Send {
        addr: ::std::net::SocketAddr,
        #[source]
        source: ::std::io::Error,
    },
}

pub type Result<T> = ::std::result::Result<T, Error>;

struct UniverseState {
    buffer: UniverseBuffer,
    last_sent: Option<Instant>,
}

/// Transmits one universe's current frame on every tick the frame is
/// dirty, and otherwise at least once per second to keep the rig's sACN
/// merge from timing the source out.
pub struct Emitter {
    sockets: Vec<UdpSocket>,
    cid: [u8; 16],
    priority: u8,
    destination: Destination,
    universes: HashMap<u16, UniverseState>,
}

impl Emitter {
    /// `bind_addrs` is the set of local interface addresses to duplicate
    /// every packet across (multi-NIC fanout). An empty slice binds a
    /// single socket to `0.0.0.0`.
    pub fn new(bind_addrs: &[Ipv4Addr], cid: [u8; 16], priority: u8, destination: Destination) -> Result<Self> {
        let addrs: Vec<Ipv4Addr> = if bind_addrs.is_empty() {
            vec![Ipv4Addr::UNSPECIFIED]
        } else {
            bind_addrs.to_vec()
        };
        let mut sockets = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let socket = UdpSocket::bind(SocketAddrV4::new(addr, 0))
                .map_err(|source| Error::Bind { addr, source })?;
            socket.set_nonblocking(true).map_err(|source| Error::Bind { addr, source })?;
            sockets.push(socket);
        }
        Ok(Emitter {
            sockets,
            cid,
            priority,
            destination,
            universes: HashMap::new(),
        })
    }

    /// Applies a settings change that doesn't require re-binding sockets
    /// (priority, CID, multicast/unicast mode). Bind-address changes need
    /// a fresh `Emitter` instead, since they change which sockets exist.
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority;
    }

    pub fn set_cid(&mut self, cid: [u8; 16]) {
        self.cid = cid;
    }

    pub fn set_destination(&mut self, destination: Destination) {
        self.destination = destination;
    }

    fn state_for(&mut self, universe: u16) -> &mut UniverseState {
        self.universes.entry(universe).or_insert_with(|| UniverseState {
            buffer: UniverseBuffer::new(),
            last_sent: None,
        })
    }

    /// Gives the caller mutable access to a universe's slot buffer, for
    /// the frame assembler to write channel values into ahead of `tick`.
    pub fn buffer_mut(&mut self, universe: u16) -> &mut UniverseBuffer {
        &mut self.state_for(universe).buffer
    }

    /// Zeroes a universe's buffer and forces an immediate send on the
    /// next `tick` (release / dim-off).
    pub fn release(&mut self, universe: u16) {
        self.state_for(universe).buffer.zero_all();
    }

    /// Called once per control-loop iteration for every universe backing
    /// an enabled fixture. Sends immediately if the buffer is dirty,
    /// otherwise sends a keepalive once `KEEPALIVE_INTERVAL` has elapsed
    /// since the last send. Returns whether a packet actually went out.
    pub fn tick(&mut self, universe: u16, now: Instant) -> Result<bool> {
        let priority = self.priority;
        let cid = self.cid;
        let destination = self.destination;
        let state = self.state_for(universe);

        let due = match state.last_sent {
            None => true,
            Some(last) => now.duration_since(last) >= KEEPALIVE_INTERVAL,
        };
        if !state.buffer.is_dirty() && !due {
            return Ok(false);
        }

        let sequence = state.buffer.next_sequence();
        let packet = build_data_packet(&cid, priority, sequence, universe, state.buffer.as_bytes());
        state.buffer.clear_dirty();
        state.last_sent = Some(now);

        let dest_addr = ::std::net::SocketAddr::V4(SocketAddrV4::new(destination.addr(universe), E131_PORT));
        let mut first_error = None;
        for socket in &self.sockets {
            if let Err(source) = socket.send_to(&packet, dest_addr) {
                // Best-effort: one NIC failing to send must not stop the
                // others, but the caller still hears about it.
                ::log::warn!("sACN send to {} via {:?} failed: {}", dest_addr, socket.local_addr(), source);
                if first_error.is_none() {
                    first_error = Some(Error::Send { addr: dest_addr, source });
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    pub fn active_universes(&self) -> impl Iterator<Item = u16> + '_ {
        self.universes.keys().copied()
    }

    /// Drops a universe's buffer and sequence counter entirely: the
    /// buffer persists until no enabled fixture uses a universe, then it
    /// is retired. Call after `release` + a final `tick` have sent the
    /// all-zero frame.
    pub fn retire(&mut self, universe: u16) {
        self.universes.remove(&universe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multicast_address_derives_from_universe() {
        assert_eq!(Destination::Multicast.addr(1), Ipv4Addr::new(239, 255, 0, 1));
        assert_eq!(Destination::Multicast.addr(63999), Ipv4Addr::new(239, 255, 249, 255));
    }

    #[test]
    fn unicast_destination_ignores_universe() {
        let addr = Ipv4Addr::new(10, 0, 0, 5);
        assert_eq!(Destination::Unicast(addr).addr(1), addr);
        assert_eq!(Destination::Unicast(addr).addr(2), addr);
    }

    #[test]
    fn tick_sends_once_then_waits_for_keepalive() {
        let mut emitter = Emitter::new(&[], [0u8; 16], 150, Destination::Multicast).unwrap();
        emitter.buffer_mut(1).set_slot(1, 42);
        let t0 = Instant::now();
        assert!(emitter.tick(1, t0).unwrap(), "dirty frame must send immediately");
        assert!(!emitter.tick(1, t0).unwrap(), "clean frame before keepalive interval must not send");
        let t1 = t0 + Duration::from_secs(2);
        assert!(emitter.tick(1, t1).unwrap(), "keepalive must fire after the interval elapses");
    }

    #[test]
    fn release_forces_next_tick_to_send() {
        let mut emitter = Emitter::new(&[], [0u8; 16], 150, Destination::Multicast).unwrap();
        let t0 = Instant::now();
        emitter.buffer_mut(1).set_slot(1, 42);
        emitter.tick(1, t0).unwrap();
        emitter.release(1);
        assert!(emitter.tick(1, t0).unwrap(), "release must force an immediate send");
        assert_eq!(emitter.buffer_mut(1).slot(1), 0);
    }
}
