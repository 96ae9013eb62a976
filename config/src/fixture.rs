use ::serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of fixtures the admission check allows — enforced as
/// a hard admission check rather than an advisory UI-only limit, see
/// DESIGN.md.
pub const MAX_FIXTURES: usize = 6;

/// A channel offset relative to `Fixture::start_addr`. `0` means "this
/// channel isn't wired up on this fixture".
pub type ChannelOffset = u16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub enabled: bool,
    pub universe: u16,
    pub start_addr: u16,
    pub pan_coarse: ChannelOffset,
    pub pan_fine: ChannelOffset,
    pub tilt_coarse: ChannelOffset,
    pub tilt_fine: ChannelOffset,
    pub dimmer: ChannelOffset,
    pub zoom: ChannelOffset,
    pub zoom_fine: ChannelOffset,
    pub color_temp_channel: ChannelOffset,
    pub color_temp_value: u8,
    pub invert_pan: bool,
    pub invert_tilt: bool,
    pub pan_bias: i16,
    pub tilt_bias: i16,
    /// 0 = none, else 1..N indexing into the fixture-status LED sink.
    pub status_led_slot: u32,
}

impl Fixture {
    /// All non-zero channel offsets configured on this fixture.
    fn nonzero_offsets(&self) -> impl Iterator<Item = ChannelOffset> {
        [
            self.pan_coarse,
            self.pan_fine,
            self.tilt_coarse,
            self.tilt_fine,
            self.dimmer,
            self.zoom,
            self.zoom_fine,
            self.color_temp_channel,
        ]
        .into_iter()
        .filter(|&o| o > 0)
    }

    /// Validates the channel-range invariant: for every assigned channel
    /// offset k>0, `start_addr + k - 1 <= 512`.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("fixture id must not be empty"));
        }
        if !(1..=63999).contains(&self.universe) {
            return Err(Error::validation("universe must be in 1..=63999"));
        }
        if !(1..=512).contains(&self.start_addr) {
            return Err(Error::validation("start_addr must be in 1..=512"));
        }
        for offset in self.nonzero_offsets() {
            let last_slot = self.start_addr as u32 + offset as u32 - 1;
            if last_slot < 1 || last_slot > 512 {
                return Err(Error::validation(format!(
                    "fixture {}: channel offset {} puts slot {} out of range 1..=512",
                    self.id, offset, last_slot
                )));
            }
        }
        Ok(())
    }

    /// The DMX slot (1..=512) a given non-zero offset resolves to.
    pub fn slot_for_offset(&self, offset: ChannelOffset) -> Option<u16> {
        if offset == 0 {
            return None;
        }
        Some(self.start_addr + offset - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fixture() -> Fixture {
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
    fn valid_fixture_passes() {
        assert!(base_fixture().validate().is_ok());
    }

    #[test]
    fn out_of_range_offset_rejected() {
        let mut f = base_fixture();
        f.start_addr = 510;
        f.dimmer = 10; // 510 + 10 - 1 = 519, out of range
        assert!(f.validate().is_err());
    }

    #[test]
    fn zero_offset_is_unused_and_not_checked() {
        let mut f = base_fixture();
        f.start_addr = 511;
        f.zoom = 0; // unused, must not be checked even though 511+0 would be nonsensical
        assert!(f.validate().is_ok());
    }

    #[test]
    fn empty_id_rejected() {
        let mut f = base_fixture();
        f.id = "".into();
        assert!(f.validate().is_err());
    }
}
