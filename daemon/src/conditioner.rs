//! Pure axis-conditioning math. Split into `shape_axis` (steps
//! 1-4: clamp, deadzone, expo, fine-mode gain — settings-only, no fixture
//! knowledge) and `scale_axis` (steps 5-6: per-fixture invert/bias then
//! 16-bit integration). The frame assembler calls `shape_axis` once per
//! tick and `scale_axis` once per fixture, since invert/bias are
//! per-fixture but the rest of the pipeline is shared.

/// Steps 1-4 of the conditioning algorithm. Returns a signed value in
/// `[-1.0, 1.0]`.
pub fn shape_axis(raw: f32, deadzone: f32, expo: f32, fine_mode: bool, fine_gain: f32) -> f32 {
    let raw = raw.clamp(-1.0, 1.0);
    let deadzoned = if raw.abs() < deadzone {
        0.0
    } else {
        raw.signum() * (raw.abs() - deadzone) / (1.0 - deadzone)
    };
    let exponent = 1.0 + 2.0 * expo;
    let shaped = deadzoned.signum() * deadzoned.abs().powf(exponent);
    if fine_mode {
        shaped * fine_gain
    } else {
        shaped
    }
}

/// Steps 5-6: per-fixture invert and bias, then scale `[-1, 1]` to
/// `[0, 65535]` with 32768 as center.
pub fn scale_axis(shaped: f32, invert: bool, bias: i16) -> u16 {
    let signed = if invert { -shaped } else { shaped };
    let centered = 32768.0 + (signed * 32767.0).round();
    let centered = centered.clamp(0.0, 65535.0) as i32;
    (centered + bias as i32).clamp(0, 65535) as u16
}

/// Throttle axis mapped linearly to an 8-bit dimmer, with the flash-10 and
/// dim-off overrides. `dim_off` wins over `flash_10` when
/// both are held — an explicit "go dark" command should never be masked
/// by a flash.
pub fn condition_dimmer(throttle: f32, invert: bool, flash_10: bool, dim_off: bool) -> u8 {
    if dim_off {
        return 0;
    }
    if flash_10 {
        return (0.10 * 255.0).round() as u8; // 26
    }
    let t = if invert { -throttle } else { throttle }.clamp(-1.0, 1.0);
    (((t + 1.0) / 2.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_1_basic_frame() {
        // axes x=0,y=0,throttle=+1 -> pan16=tilt16=0x8000, dim8=255
        let shaped = shape_axis(0.0, 0.08, 0.35, false, 0.20);
        assert_eq!(scale_axis(shaped, false, 0), 0x8000);
        assert_eq!(condition_dimmer(1.0, false, false, false), 0xFF);
    }

    #[test]
    fn scenario_2_deadzone_below_threshold_centers() {
        let shaped = shape_axis(0.05, 0.08, 0.0, false, 0.20);
        assert_eq!(scale_axis(shaped, false, 0), 0x8000);
    }

    #[test]
    fn scenario_2_deadzone_above_threshold_matches_worked_example() {
        let shaped = shape_axis(0.10, 0.08, 0.0, false, 0.20);
        assert_eq!(scale_axis(shaped, false, 0), 33480);
    }

    #[test]
    fn scenario_3_flash_10_forces_dimmer_26() {
        assert_eq!(condition_dimmer(-1.0, false, true, false), 26);
    }

    #[test]
    fn dim_off_wins_over_flash_10() {
        assert_eq!(condition_dimmer(1.0, false, true, true), 0);
    }

    #[test]
    fn fine_mode_scales_down_shaped_value() {
        let normal = shape_axis(1.0, 0.0, 0.0, false, 0.20);
        let fine = shape_axis(1.0, 0.0, 0.0, true, 0.20);
        assert!((fine - normal * 0.20).abs() < 1e-6);
    }

    #[test]
    fn invert_flips_sign_before_scaling() {
        let shaped = shape_axis(1.0, 0.0, 0.0, false, 0.20);
        assert_eq!(scale_axis(shaped, false, 0), 65535);
        assert_eq!(scale_axis(shaped, true, 0), 0);
    }

    #[test]
    fn bias_applied_after_scaling_and_clamped() {
        let shaped = shape_axis(1.0, 0.0, 0.0, false, 0.20);
        assert_eq!(scale_axis(shaped, false, 1000), 65535); // clamps, doesn't wrap
        let shaped_neg = shape_axis(-1.0, 0.0, 0.0, false, 0.20);
        assert_eq!(scale_axis(shaped_neg, false, -1000), 0);
    }
}
