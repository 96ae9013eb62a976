//! Status indicator sinks: power/error LEDs plus one
//! fixture-status LED per `Fixture::status_led_slot`. GPIO pin driving
//! itself is treated as an external collaborator;
//! what lives here is the trait boundary plus the no-op implementation
//! every non-Raspberry-Pi host actually runs.

/// Power + error LEDs. Power is on for the process lifetime; error
/// tracks `RuntimeState.error`.
pub trait IndicatorSink: Send {
    fn set_power(&mut self, on: bool);
    fn set_error(&mut self, on: bool);
}

/// One LED per fixture slot, driven from the emitter's per-fixture health
///. Slot numbering matches `Fixture::status_led_slot` (0 =
/// none, so slot indices here start at 1).
pub trait FixtureStatusSink: Send {
    fn set_fixture_ok(&mut self, slot: u32, ok: bool);
}

/// No GPIO hardware attached: logs transitions at debug level instead of
/// driving pins. This is what every dev machine and CI run uses; a real
/// Pi deployment would substitute a sysfs- or rppal-backed sink behind
/// the same trait, but wiring that up is outside this core.
pub struct LoggingIndicators {
    power: Option<bool>,
    error: Option<bool>,
}

impl LoggingIndicators {
    pub fn new() -> Self {
        LoggingIndicators { power: None, error: None }
    }
}

impl IndicatorSink for LoggingIndicators {
    fn set_power(&mut self, on: bool) {
        if self.power != Some(on) {
            ::log::debug!("indicator power led -> {}", on);
            self.power = Some(on);
        }
    }

    fn set_error(&mut self, on: bool) {
        if self.error != Some(on) {
            ::log::debug!("indicator error led -> {}", on);
            self.error = Some(on);
        }
    }
}

pub struct LoggingFixtureStatus {
    last: ::std::collections::HashMap<u32, bool>,
}

impl LoggingFixtureStatus {
    pub fn new() -> Self {
        LoggingFixtureStatus { last: ::std::collections::HashMap::new() }
    }
}

impl FixtureStatusSink for LoggingFixtureStatus {
    fn set_fixture_ok(&mut self, slot: u32, ok: bool) {
        if slot == 0 {
            return;
        }
        if self.last.get(&slot) != Some(&ok) {
            ::log::debug!("fixture status led {} -> {}", slot, ok);
            self.last.insert(slot, ok);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_status_ignores_slot_zero() {
        let mut sink = LoggingFixtureStatus::new();
        sink.set_fixture_ok(0, true);
        assert!(sink.last.is_empty());
    }

    #[test]
    fn fixture_status_tracks_per_slot_last_value() {
        let mut sink = LoggingFixtureStatus::new();
        sink.set_fixture_ok(2, true);
        assert_eq!(sink.last.get(&2), Some(&true));
        sink.set_fixture_ok(2, false);
        assert_eq!(sink.last.get(&2), Some(&false));
    }
}
