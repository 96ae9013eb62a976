//! Button-event state machine: debounces raw button state,
//! tracks which buttons are currently held, and resolves the semantic
//! commands (activate/release/flash-10/dim-off/fine-mode/zoom-mod) plus
//! the currently-held preset recall, if any.

use ::std::time::{Duration, Instant};

use ::config::{ButtonAssignments, ButtonBinding};

use crate::input::MAX_BUTTONS;

const DEBOUNCE: Duration = Duration::from_millis(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Pressed,
    Released,
}

/// Per-button debounced level plus the timestamp of its last accepted
/// edge, so a second physical transition within `DEBOUNCE` of the first
/// is absorbed rather than re-triggering the action.
struct ButtonTracker {
    down: [bool; MAX_BUTTONS],
    last_edge: [Option<Instant>; MAX_BUTTONS],
}

impl ButtonTracker {
    fn new() -> Self {
        ButtonTracker {
            down: [false; MAX_BUTTONS],
            last_edge: [None; MAX_BUTTONS],
        }
    }

    fn update(&mut self, now: Instant, index: usize, physically_down: bool) -> Option<Edge> {
        if physically_down == self.down[index] {
            return None;
        }
        if let Some(last) = self.last_edge[index] {
            if now.duration_since(last) < DEBOUNCE {
                return None;
            }
        }
        self.down[index] = physically_down;
        self.last_edge[index] = Some(now);
        Some(if physically_down { Edge::Pressed } else { Edge::Released })
    }

    fn is_down(&self, index: u32) -> bool {
        self.down.get(index as usize).copied().unwrap_or(false)
    }
}

/// This tick's resolved commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commands {
    pub activate: bool,
    pub release: bool,
    pub flash_10_held: bool,
    pub dim_off_held: bool,
    pub fine_mode_held: bool,
    pub zoom_mod_held: bool,
    /// The preset id currently held by a recall button, if any. Persists
    /// across ticks for as long as the button stays down.
    pub recall_held: Option<String>,
}

pub struct ButtonMachine {
    tracker: ButtonTracker,
    held_preset: Option<String>,
}

impl ButtonMachine {
    pub fn new() -> Self {
        ButtonMachine {
            tracker: ButtonTracker::new(),
            held_preset: None,
        }
    }

    /// Feeds this tick's raw button levels through the debouncer and
    /// resolves the semantic commands against the current (snapshot-pinned)
    /// assignments and preset bindings.
    pub fn process(
        &mut self,
        now: Instant,
        buttons: &[bool; MAX_BUTTONS],
        assignments: &ButtonAssignments,
        bindings: &[ButtonBinding],
    ) -> Commands {
        let mut activate = false;
        let mut release = false;

        for i in 0..MAX_BUTTONS {
            let edge = match self.tracker.update(now, i, buttons[i]) {
                Some(edge) => edge,
                None => continue,
            };
            let idx = i as u32;
            if edge == Edge::Pressed && assignments.activate == Some(idx) {
                activate = true;
            }
            if edge == Edge::Pressed && assignments.release == Some(idx) {
                release = true;
            }
            if let Some(binding) = bindings.iter().find(|b| b.button == idx) {
                match edge {
                    Edge::Pressed => self.held_preset = Some(binding.preset_id.clone()),
                    Edge::Released => {
                        if self.held_preset.as_deref() == Some(binding.preset_id.as_str()) {
                            self.held_preset = None;
                        }
                    }
                }
            }
        }

        Commands {
            activate,
            release,
            flash_10_held: assignments.flash_10.map(|b| self.tracker.is_down(b)).unwrap_or(false),
            dim_off_held: assignments.dim_off.map(|b| self.tracker.is_down(b)).unwrap_or(false),
            fine_mode_held: assignments.fine_mode.map(|b| self.tracker.is_down(b)).unwrap_or(false),
            zoom_mod_held: assignments.zoom_mod.map(|b| self.tracker.is_down(b)).unwrap_or(false),
            recall_held: self.held_preset.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buttons_with(indices: &[usize]) -> [bool; MAX_BUTTONS] {
        let mut b = [false; MAX_BUTTONS];
        for &i in indices {
            b[i] = true;
        }
        b
    }

    #[test]
    fn activate_fires_on_press_not_hold() {
        let mut machine = ButtonMachine::new();
        let mut assignments = ButtonAssignments::default();
        assignments.activate = Some(0);
        let t0 = Instant::now();

        let cmds = machine.process(t0, &buttons_with(&[0]), &assignments, &[]);
        assert!(cmds.activate);

        let t1 = t0 + Duration::from_millis(100);
        let cmds = machine.process(t1, &buttons_with(&[0]), &assignments, &[]);
        assert!(!cmds.activate, "holding the button must not re-fire activate");
    }

    #[test]
    fn debounce_collapses_bounce_within_5ms() {
        let mut machine = ButtonMachine::new();
        let assignments = ButtonAssignments::default();
        let t0 = Instant::now();

        machine.process(t0, &buttons_with(&[0]), &assignments, &[]);
        assert!(machine.tracker.is_down(0));

        // Released then re-pressed within the debounce window: both edges
        // must be absorbed, leaving the button considered still down.
        let t1 = t0 + Duration::from_millis(2);
        machine.process(t1, &buttons_with(&[]), &assignments, &[]);
        assert!(machine.tracker.is_down(0), "release within debounce window must be ignored");
    }

    #[test]
    fn recall_hold_tracks_binding_and_clears_on_release() {
        let mut machine = ButtonMachine::new();
        let assignments = ButtonAssignments::default();
        let bindings = vec![ButtonBinding { button: 5, preset_id: "preset-1".into() }];
        let t0 = Instant::now();

        let cmds = machine.process(t0, &buttons_with(&[5]), &assignments, &bindings);
        assert_eq!(cmds.recall_held.as_deref(), Some("preset-1"));

        let t1 = t0 + Duration::from_millis(100);
        let cmds = machine.process(t1, &buttons_with(&[]), &assignments, &bindings);
        assert_eq!(cmds.recall_held, None);
    }

    #[test]
    fn modifier_buttons_report_held_not_edge() {
        let mut machine = ButtonMachine::new();
        let mut assignments = ButtonAssignments::default();
        assignments.fine_mode = Some(2);
        let t0 = Instant::now();
        machine.process(t0, &buttons_with(&[2]), &assignments, &[]);
        let t1 = t0 + Duration::from_millis(50);
        let cmds = machine.process(t1, &buttons_with(&[2]), &assignments, &[]);
        assert!(cmds.fine_mode_held);
    }
}
