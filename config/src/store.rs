use ::arc_swap::ArcSwap;
use ::std::sync::mpsc;
use ::std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::fixture::{Fixture, MAX_FIXTURES};
use crate::preset::{ButtonBinding, Preset};
use crate::settings::Settings;

/// An immutable point-in-time view of everything the Config Store owns.
/// The control loop loads one of these at the start of a tick
/// and uses it for the entire tick, so a concurrent HTTP write can never
/// produce torn reads within one frame.
#[derive(Clone, Debug, Default)]
pub struct ConfigSnapshot {
    pub settings: Arc<Settings>,
    pub fixtures: Arc<Vec<Fixture>>,
    pub presets: Arc<Vec<Preset>>,
    pub bindings: Arc<Vec<ButtonBinding>>,
}

/// The single authoritative record of settings, fixtures, presets and
/// button bindings. Writers take the internal mutex
/// only long enough to validate and publish a new snapshot; readers never
/// block on it — they just load the current `Arc<ConfigSnapshot>`.
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
    /// Serializes writers so two concurrent HTTP requests can't race each
    /// other's read-validate-swap cycle; `current` itself stays lock-free
    /// for readers.
    write_lock: Mutex<()>,
    subscribers: Mutex<Vec<mpsc::Sender<()>>>,
    next_preset_seq: Mutex<u64>,
}

impl ConfigStore {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        ConfigStore {
            current: ArcSwap::from_pointee(snapshot),
            write_lock: Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
            next_preset_seq: Mutex::new(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ConfigSnapshot {
            settings: Arc::new(Settings::default()),
            fixtures: Arc::new(Vec::new()),
            presets: Arc::new(Vec::new()),
            bindings: Arc::new(Vec::new()),
        })
    }

    /// Loads the current snapshot. Cheap: an atomic pointer load plus a
    /// refcount bump.
    pub fn load(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Registers a change subscriber; it receives a `()` ping after every
    /// successful apply. Used by nothing load-bearing in this daemon today
    /// (the control loop just re-loads the snapshot each tick), but kept
    /// as the hook the HTTP layer's `/api/status` long-poll could use.
    pub fn subscribe(&self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    fn publish(&self, snapshot: ConfigSnapshot) {
        self.current.store(Arc::new(snapshot));
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|tx| tx.send(()).is_ok());
    }

    /// Replaces Settings wholesale after validating it.
    pub fn apply_settings(&self, settings: Settings) -> Result<Arc<ConfigSnapshot>> {
        settings.validate()?;
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        next.settings = Arc::new(settings);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    /// Creates a new fixture, enforcing the uniqueness, range and fixture
    /// count invariants.
    pub fn create_fixture(&self, fixture: Fixture) -> Result<Arc<ConfigSnapshot>> {
        fixture.validate()?;
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        if next.fixtures.iter().any(|f| f.id == fixture.id) {
            return Err(Error::validation(format!(
                "fixture id {} already exists",
                fixture.id
            )));
        }
        if next.fixtures.len() >= MAX_FIXTURES {
            return Err(Error::validation(format!(
                "at most {} fixtures are allowed",
                MAX_FIXTURES
            )));
        }
        let mut fixtures = (*next.fixtures).clone();
        fixtures.push(fixture);
        next.fixtures = Arc::new(fixtures);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    /// Applies a partial update to an existing fixture via `patch`, which
    /// receives a mutable clone of the current fixture to edit in place.
    pub fn update_fixture(
        &self,
        id: &str,
        patch: impl FnOnce(&mut Fixture),
    ) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        let mut fixtures = (*next.fixtures).clone();
        let slot = fixtures
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| Error::not_found(format!("fixture {} not found", id)))?;
        let mut candidate = slot.clone();
        patch(&mut candidate);
        candidate.validate()?;
        *slot = candidate;
        next.fixtures = Arc::new(fixtures);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    pub fn delete_fixture(&self, id: &str) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        let mut fixtures = (*next.fixtures).clone();
        let before = fixtures.len();
        fixtures.retain(|f| f.id != id);
        if fixtures.len() == before {
            return Err(Error::not_found(format!("fixture {} not found", id)));
        }
        next.fixtures = Arc::new(fixtures);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    /// Captures a preset; if `name` is absent, assigns `Preset N` with the
    /// smallest unused integer suffix.
    pub fn capture_preset(
        &self,
        id: Option<String>,
        name: Option<String>,
        pan16: u16,
        tilt16: u16,
        dim8: u8,
        zoom16: u16,
    ) -> Result<(Arc<ConfigSnapshot>, Preset)> {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        let mut presets = (*next.presets).clone();

        let id = match id {
            Some(id) if !id.trim().is_empty() => id,
            _ => self.next_preset_id(),
        };
        if presets.iter().any(|p| p.id == id) {
            return Err(Error::validation(format!("preset id {} already exists", id)));
        }
        let name = name.unwrap_or_else(|| self.next_default_name(&presets));
        let preset = Preset {
            id,
            name,
            pan16,
            tilt16,
            dim8,
            zoom16,
        };
        presets.push(preset.clone());
        next.presets = Arc::new(presets);
        self.publish(next.clone());
        Ok((Arc::new(next), preset))
    }

    pub fn update_preset(
        &self,
        id: &str,
        use_current: Option<(u16, u16, u8, u16)>,
        name: Option<String>,
    ) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        let mut presets = (*next.presets).clone();
        let preset = presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found(format!("preset {} not found", id)))?;
        if let Some((pan16, tilt16, dim8, zoom16)) = use_current {
            preset.pan16 = pan16;
            preset.tilt16 = tilt16;
            preset.dim8 = dim8;
            preset.zoom16 = zoom16;
        }
        if let Some(name) = name {
            preset.name = name;
        }
        next.presets = Arc::new(presets);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    /// Deletes a preset and cascades the deletion to any button binding
    /// pointing to it.
    pub fn delete_preset(&self, id: &str) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        let mut presets = (*next.presets).clone();
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() == before {
            return Err(Error::not_found(format!("preset {} not found", id)));
        }
        next.presets = Arc::new(presets);
        let mut bindings = (*next.bindings).clone();
        bindings.retain(|b| b.preset_id != id);
        next.bindings = Arc::new(bindings);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    /// Binds or unbinds a button to a preset id. `preset_id = ""`
    /// disassociates. Rejects a button that collides with a semantic
    /// action index.
    pub fn bind_preset_button(&self, button: u32, preset_id: &str) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        if next.settings.buttons.assigned_indices().contains(&button) {
            return Err(Error::validation(format!(
                "button {} is already a semantic action",
                button
            )));
        }
        let mut bindings: Vec<ButtonBinding> =
            (*next.bindings).iter().filter(|b| b.button != button).cloned().collect();
        if !preset_id.is_empty() {
            if !next.presets.iter().any(|p| p.id == preset_id) {
                return Err(Error::not_found(format!("preset {} not found", preset_id)));
            }
            bindings.push(ButtonBinding {
                button,
                preset_id: preset_id.to_owned(),
            });
        }
        next.bindings = Arc::new(bindings);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }

    fn next_preset_id(&self) -> String {
        let mut seq = self.next_preset_seq.lock().unwrap();
        let current = self.current.load();
        loop {
            let candidate = format!("preset-{}", *seq);
            *seq += 1;
            if !current.presets.iter().any(|p| p.id == candidate) {
                return candidate;
            }
        }
    }

    fn next_default_name(&self, existing: &[Preset]) -> String {
        let mut n = 1usize;
        loop {
            let candidate = format!("Preset {}", n);
            if !existing.iter().any(|p| p.name == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Replaces the fixture list wholesale (used by CSV bulk import and by
    /// config-file load at startup). Every fixture is validated and ids
    /// must be unique; the whole batch is rejected together on any
    /// violation so a bad import can't leave a partially-applied list.
    pub fn replace_fixtures(&self, fixtures: Vec<Fixture>) -> Result<Arc<ConfigSnapshot>> {
        if fixtures.len() > MAX_FIXTURES {
            return Err(Error::validation(format!(
                "at most {} fixtures are allowed",
                MAX_FIXTURES
            )));
        }
        let mut seen = ::std::collections::HashSet::new();
        for f in &fixtures {
            f.validate()?;
            if !seen.insert(f.id.clone()) {
                return Err(Error::validation(format!("duplicate fixture id {}", f.id)));
            }
        }
        let _guard = self.write_lock.lock().unwrap();
        let mut next = (**self.current.load()).clone();
        next.fixtures = Arc::new(fixtures);
        self.publish(next.clone());
        Ok(Arc::new(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;

    fn fixture(id: &str, universe: u16) -> Fixture {
        Fixture {
            id: id.into(),
            enabled: true,
            universe,
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
    fn admission_rejects_duplicate_ids() {
        let store = ConfigStore::with_defaults();
        store.create_fixture(fixture("F1", 1)).unwrap();
        assert!(store.create_fixture(fixture("F1", 2)).is_err());
    }

    #[test]
    fn admission_rejects_over_limit() {
        let store = ConfigStore::with_defaults();
        for i in 0..MAX_FIXTURES {
            store.create_fixture(fixture(&format!("F{}", i), 1)).unwrap();
        }
        assert!(store.create_fixture(fixture("F-over", 1)).is_err());
    }

    #[test]
    fn delete_preset_cascades_to_binding() {
        let store = ConfigStore::with_defaults();
        let (_, preset) = store
            .capture_preset(Some("p1".into()), None, 0, 0, 0, 0)
            .unwrap();
        store.bind_preset_button(10, &preset.id).unwrap();
        let snap = store.delete_preset(&preset.id).unwrap();
        assert!(snap.bindings.is_empty());
    }

    #[test]
    fn bind_rejects_semantic_action_collision() {
        let store = ConfigStore::with_defaults();
        let mut settings = (*store.load().settings).clone();
        settings.buttons.activate = Some(5);
        store.apply_settings(settings).unwrap();
        let (_, preset) = store
            .capture_preset(Some("p1".into()), None, 0, 0, 0, 0)
            .unwrap();
        assert!(store.bind_preset_button(5, &preset.id).is_err());
    }

    #[test]
    fn snapshot_is_stable_during_concurrent_apply() {
        let store = ConfigStore::with_defaults();
        let snap_before = store.load();
        store.create_fixture(fixture("F1", 1)).unwrap();
        assert!(snap_before.fixtures.is_empty());
        assert_eq!(store.load().fixtures.len(), 1);
    }
}
