//! ANSI E1.31 ("sACN") DMX-over-UDP: per-universe 512-byte buffers, the
//! bit-exact root/framing/DMP packet layout, and the UDP
//! emitter that walks the active universes once per control-loop tick.

mod buffer;
mod emitter;
mod packet;

pub use buffer::UniverseBuffer;
pub use emitter::{Destination, Emitter, Error, Result, E131_PORT};
pub use packet::{build_data_packet, SOURCE_NAME, VECTOR_DMP_SET_PROPERTY, VECTOR_E131_DATA_PACKET,
    VECTOR_ROOT_E131_DATA};
