//! Bit-exact E1.31 DMP data packet layout. Every field below is
//! named and ordered the way the wire format lays it out; nothing here is
//! generic PDU machinery, because there is exactly one packet shape this
//! emitter ever sends.

use ::byteorder::{BigEndian, WriteBytesExt};
use ::std::io::Write;

pub const ACN_PID: &[u8; 12] = b"ASC-E1.17\0\0\0";
pub const VECTOR_ROOT_E131_DATA: u32 = 0x0000_0004;
pub const VECTOR_E131_DATA_PACKET: u32 = 0x0000_0002;
pub const VECTOR_DMP_SET_PROPERTY: u8 = 0x02;
pub const SOURCE_NAME: &str = "FollowSpot";
const SOURCE_NAME_FIELD_LEN: usize = 64;

fn flags_and_length(length: u16) -> u16 {
    debug_assert!(length <= 0x0FFF, "PDU length must fit in 12 bits");
    (0x7 << 12) | (length & 0x0FFF)
}

/// Builds one complete E1.31 DMP data packet (root + framing + DMP PDUs)
/// addressed to `universe`, ready to hand to a UDP socket. `dmx` holds DMX
/// slots 1..=512 at indices 0..512 (slot 1 first).
pub fn build_data_packet(
    cid: &[u8; 16],
    priority: u8,
    sequence: u8,
    universe: u16,
    dmx: &[u8; 512],
) -> Vec<u8> {
    const DMP_LEN: u16 = 2 + 1 + 1 + 2 + 2 + 2 + 1 + 512; // 523
    const FRAMING_LEN: u16 = 2 + 4 + SOURCE_NAME_FIELD_LEN as u16 + 1 + 2 + 1 + 1 + 2 + DMP_LEN; // 600
    const ROOT_LEN: u16 = 2 + 4 + 16 + FRAMING_LEN; // 622

    let mut buf = Vec::with_capacity(2 + 2 + 12 + ROOT_LEN as usize);

    // Root layer preamble (not part of the PDU length accounting).
    buf.write_u16::<BigEndian>(0x0010).unwrap(); // preamble size
    buf.write_u16::<BigEndian>(0x0000).unwrap(); // postamble size
    buf.write_all(ACN_PID).unwrap();

    // Root PDU.
    buf.write_u16::<BigEndian>(flags_and_length(ROOT_LEN)).unwrap();
    buf.write_u32::<BigEndian>(VECTOR_ROOT_E131_DATA).unwrap();
    buf.write_all(cid).unwrap();

    // E1.31 framing PDU.
    buf.write_u16::<BigEndian>(flags_and_length(FRAMING_LEN)).unwrap();
    buf.write_u32::<BigEndian>(VECTOR_E131_DATA_PACKET).unwrap();
    let mut source_name = [0u8; SOURCE_NAME_FIELD_LEN];
    let name_bytes = SOURCE_NAME.as_bytes();
    source_name[..name_bytes.len()].copy_from_slice(name_bytes);
    buf.write_all(&source_name).unwrap();
    buf.write_u8(priority).unwrap();
    buf.write_u16::<BigEndian>(0).unwrap(); // synchronization_address
    buf.write_u8(sequence).unwrap();
    buf.write_u8(0).unwrap(); // options: Stream_Terminated always clear
    buf.write_u16::<BigEndian>(universe).unwrap();

    // DMP PDU.
    buf.write_u16::<BigEndian>(flags_and_length(DMP_LEN)).unwrap();
    buf.write_u8(VECTOR_DMP_SET_PROPERTY).unwrap();
    buf.write_u8(0xA1).unwrap(); // address_type_and_data_type
    buf.write_u16::<BigEndian>(0x0000).unwrap(); // first_property_address
    buf.write_u16::<BigEndian>(0x0001).unwrap(); // address_increment
    buf.write_u16::<BigEndian>(0x0201).unwrap(); // property_value_count (513)
    buf.write_u8(0x00).unwrap(); // DMX start code
    buf.write_all(dmx).unwrap();

    debug_assert_eq!(buf.len(), 2 + 2 + 12 + ROOT_LEN as usize);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_is_638_bytes() {
        let cid = [0u8; 16];
        let dmx = [0u8; 512];
        let pkt = build_data_packet(&cid, 150, 0, 1, &dmx);
        assert_eq!(pkt.len(), 638);
    }

    #[test]
    fn scenario_1_basic_frame_bytes() {
        // basic frame: pan=0x8000, tilt=0x8000, dim=255 in slots 1..5
        let cid = [0u8; 16];
        let mut dmx = [0u8; 512];
        dmx[0] = 0x80; // pan coarse, slot 1
        dmx[1] = 0x00; // pan fine, slot 2
        dmx[2] = 0x80; // tilt coarse, slot 3
        dmx[3] = 0x00; // tilt fine, slot 4
        dmx[4] = 0xFF; // dimmer, slot 5
        let pkt = build_data_packet(&cid, 150, 0, 1, &dmx);
        // DMX payload starts after preamble(2)+postamble(2)+ACN_PID(12)+
        // root flags_len(2)+vector(4)+cid(16)+framing flags_len(2)+
        // vector(4)+source_name(64)+priority(1)+sync(2)+seq(1)+opts(1)+
        // universe(2)+dmp flags_len(2)+vector(1)+addr_type(1)+
        // first_addr(2)+addr_incr(2)+prop_count(2)+start_code(1) = 126
        let dmx_start = 126;
        assert_eq!(&pkt[dmx_start..dmx_start + 5], &[0x80, 0x00, 0x80, 0x00, 0xFF]);
    }

    #[test]
    fn sequence_number_is_encoded_at_fixed_offset() {
        let cid = [0u8; 16];
        let dmx = [0u8; 512];
        let pkt = build_data_packet(&cid, 150, 42, 7, &dmx);
        // seq offset: 2+2+12 + 2+4+16 + 2+4+64+1+2 = 111
        assert_eq!(pkt[111], 42);
    }

    #[test]
    fn universe_is_big_endian_at_fixed_offset() {
        let cid = [0u8; 16];
        let dmx = [0u8; 512];
        let pkt = build_data_packet(&cid, 150, 0, 0x1234, &dmx);
        // universe offset: seq offset(111) + 1(seq) + 1(options) = 113
        assert_eq!(&pkt[113..115], &[0x12, 0x34]);
    }
}
