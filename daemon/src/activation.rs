//! `POST /api/activate` / `POST /api/release` reach the control
//! loop the same way the virtual joystick's button edges do: a lock-free
//! holder the HTTP handler writes into and the control loop drains once
//! per tick, so an HTTP-triggered activate/release is indistinguishable
//! from a physical button press by the time it reaches `RuntimeState`
//!.

use ::std::sync::atomic::{AtomicU8, Ordering};

const NONE: u8 = 0;
const ACTIVATE: u8 = 1;
const RELEASE: u8 = 2;

pub struct ActivationOverride {
    pending: AtomicU8,
}

impl ActivationOverride {
    pub fn new() -> Self {
        ActivationOverride { pending: AtomicU8::new(NONE) }
    }

    pub fn request_activate(&self) {
        self.pending.store(ACTIVATE, Ordering::Relaxed);
    }

    pub fn request_release(&self) {
        self.pending.store(RELEASE, Ordering::Relaxed);
    }

    /// Drains the pending request, if any. `Some(true)` = activate,
    /// `Some(false)` = release.
    pub fn take(&self) -> Option<bool> {
        match self.pending.swap(NONE, Ordering::Relaxed) {
            ACTIVATE => Some(true),
            RELEASE => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_pending_request() {
        let ov = ActivationOverride::new();
        ov.request_activate();
        assert_eq!(ov.take(), Some(true));
        assert_eq!(ov.take(), None);
    }

    #[test]
    fn release_overrides_earlier_activate() {
        let ov = ActivationOverride::new();
        ov.request_activate();
        ov.request_release();
        assert_eq!(ov.take(), Some(false));
    }
}
