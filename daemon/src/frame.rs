//! Frame assembler: packs one fixture's resolved
//! (pan16, tilt16, dim8, zoom16) into its universe's DMX slots. A channel
//! offset of `0` means unused and must be left untouched — the assembler
//! never infers overlap, that's an admission-time concern (`Fixture::validate`).

use ::config::Fixture;
use ::sacn::UniverseBuffer;

/// Writes `fixture`'s resolved channel values into `buffer` at its
/// configured offsets. Coarse/fine pairs are the MSB/LSB of the 16-bit
/// value; a zero offset on either half skips that byte independently, so
/// a fixture can wire up only the coarse channel if it wants 8-bit
/// resolution.
pub fn write_fixture(buffer: &mut UniverseBuffer, fixture: &Fixture, pan16: u16, tilt16: u16, dim8: u8, zoom16: u16) {
    write_pair(buffer, fixture, fixture.pan_coarse, fixture.pan_fine, pan16);
    write_pair(buffer, fixture, fixture.tilt_coarse, fixture.tilt_fine, tilt16);
    write_pair(buffer, fixture, fixture.zoom, fixture.zoom_fine, zoom16);

    if let Some(slot) = fixture.slot_for_offset(fixture.dimmer) {
        buffer.set_slot(slot, dim8);
    }
    if let Some(slot) = fixture.slot_for_offset(fixture.color_temp_channel) {
        buffer.set_slot(slot, fixture.color_temp_value);
    }
}

fn write_pair(buffer: &mut UniverseBuffer, fixture: &Fixture, coarse_offset: u16, fine_offset: u16, value16: u16) {
    if let Some(slot) = fixture.slot_for_offset(coarse_offset) {
        buffer.set_slot(slot, (value16 >> 8) as u8);
    }
    if let Some(slot) = fixture.slot_for_offset(fine_offset) {
        buffer.set_slot(slot, (value16 & 0xFF) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Fixture {
        Fixture {
            id: "F1".into(),
            enabled: true,
            universe: 1,
            start_addr: 1,
            pan_coarse: 1,
            pan_fine: 2,
            tilt_coarse: 3,
            tilt_fine: 4,
            dimmer: 5,
            zoom: 0,
            zoom_fine: 0,
            color_temp_channel: 0,
            color_temp_value: 0,
            invert_pan: false,
            invert_tilt: false,
            pan_bias: 0,
            tilt_bias: 0,
            status_led_slot: 0,
        }
    }

    #[test]
    fn scenario_1_basic_frame_bytes() {
        let mut buffer = UniverseBuffer::new();
        write_fixture(&mut buffer, &fixture(), 0x8000, 0x8000, 0xFF, 0);
        assert_eq!(&buffer.as_bytes()[0..5], &[0x80, 0x00, 0x80, 0x00, 0xFF]);
    }

    #[test]
    fn zero_offset_channel_is_left_untouched() {
        let mut buffer = UniverseBuffer::new();
        buffer.set_slot(6, 0xAB); // slot the fixture doesn't own
        write_fixture(&mut buffer, &fixture(), 0, 0, 0, 0x1234);
        assert_eq!(buffer.slot(6), 0xAB, "zoom offset=0 must not touch any slot");
    }

    #[test]
    fn color_temp_is_static_when_offset_assigned() {
        let mut f = fixture();
        f.color_temp_channel = 6;
        f.color_temp_value = 200;
        let mut buffer = UniverseBuffer::new();
        write_fixture(&mut buffer, &f, 0, 0, 0, 0);
        assert_eq!(buffer.slot(6), 200);
    }
}
