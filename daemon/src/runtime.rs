//! RuntimeState: the handful of fields the control loop
//! writes every tick and the HTTP surface reads under a short lock. Same
//! snapshot-publication shape as `config::ConfigStore` — single writer,
//! lock-free readers via `ArcSwap` — because the HTTP status endpoint
//! polls this far more often than the config store changes.

use ::arc_swap::ArcSwap;
use ::serde_derive::Serialize;
use ::std::sync::Arc;
use ::std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, Serialize)]
pub struct RuntimeSnapshot {
    pub active: bool,
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch, so the HTTP surface can render
    /// it without needing `Instant`'s process-relative clock.
    pub last_frame_timestamp_ms: Option<u128>,
    /// Indexed by fixture slot order in the current config snapshot.
    pub fixture_ok: Vec<bool>,
    pub pan16: u16,
    pub tilt16: u16,
    pub dim8: u8,
    pub zoom16: u16,
    pub input_health: String,
}

impl Default for RuntimeSnapshot {
    fn default() -> Self {
        RuntimeSnapshot {
            active: false,
            error: None,
            last_frame_timestamp_ms: None,
            fixture_ok: Vec::new(),
            pan16: 0x8000,
            tilt16: 0x8000,
            dim8: 0,
            zoom16: 0,
            input_health: "idle".to_owned(),
        }
    }
}

pub struct RuntimeState {
    current: ArcSwap<RuntimeSnapshot>,
}

impl RuntimeState {
    pub fn new() -> Self {
        RuntimeState {
            current: ArcSwap::from_pointee(RuntimeSnapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<RuntimeSnapshot> {
        self.current.load_full()
    }

    /// Called once per tick by the control loop with the freshly computed
    /// state. The control loop is the only writer, so no lock is needed
    /// beyond the atomic swap itself.
    pub fn publish(&self, snapshot: RuntimeSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_reports_idle_and_inactive() {
        let rt = RuntimeState::new();
        let snap = rt.load();
        assert!(!snap.active);
        assert_eq!(snap.input_health, "idle");
    }

    #[test]
    fn publish_replaces_snapshot() {
        let rt = RuntimeState::new();
        let mut snap = (*rt.load()).clone();
        snap.active = true;
        rt.publish(snap);
        assert!(rt.load().active);
    }
}
