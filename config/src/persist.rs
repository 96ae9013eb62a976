//! On-disk persistence: a JSON document holding the full
//! config store plus a CSV backup of just the fixture list. JSON is
//! written with the classic temp-file + rename dance so a crash mid-write
//! never leaves a half-written `config.json` behind; the CSV backup is a
//! convenience export and is overwritten in place.

use ::serde_derive::{Deserialize, Serialize};
use ::std::fs;
use ::std::path::{Path, PathBuf};

use crate::csv;
use crate::error::{Error, Result};
use crate::fixture::Fixture;
use crate::preset::{ButtonBinding, Preset};
use crate::settings::Settings;
use crate::store::ConfigSnapshot;

#[derive(Serialize, Deserialize)]
struct ConfigDocument {
    settings: Settings,
    fixtures: Vec<Fixture>,
    presets: Vec<Preset>,
    bindings: Vec<ButtonBinding>,
}

fn io_err(context: &str, e: impl ::std::fmt::Display) -> Error {
    Error::Persistence(format!("{}: {}", context, e))
}

pub struct Paths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl Paths {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Paths {
            json: dir.join("config.json"),
            csv: dir.join("fixtures.csv"),
        }
    }
}

/// Writes `config.json` (atomic replace) and `fixtures.csv` (plain
/// overwrite) from the given snapshot. A failure here is a
/// `PersistenceError`: the caller keeps the in-memory state and the next
/// successful save will reconcile.
pub fn save(paths: &Paths, snapshot: &ConfigSnapshot) -> Result<()> {
    let doc = ConfigDocument {
        settings: (*snapshot.settings).clone(),
        fixtures: (*snapshot.fixtures).clone(),
        presets: (*snapshot.presets).clone(),
        bindings: (*snapshot.bindings).clone(),
    };
    let json = ::serde_json::to_string_pretty(&doc)
        .map_err(|e| io_err("serializing config document", e))?;

    let tmp = paths.json.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).map_err(|e| io_err("writing temp config file", e))?;
    fs::rename(&tmp, &paths.json).map_err(|e| io_err("renaming temp config file", e))?;

    let csv_text = csv::write(&doc.fixtures);
    fs::write(&paths.csv, csv_text.as_bytes()).map_err(|e| io_err("writing fixtures.csv", e))?;
    Ok(())
}

/// Loads the persisted config document: try the JSON
/// document first; if it's missing or empty and a CSV backup exists,
/// rebuild the fixture list from CSV and fall back to default Settings /
/// empty Presets / Bindings.
pub fn load(paths: &Paths) -> Result<ConfigSnapshot> {
    match fs::read_to_string(&paths.json) {
        Ok(text) if !text.trim().is_empty() => {
            let doc: ConfigDocument =
                ::serde_json::from_str(&text).map_err(|e| io_err("parsing config.json", e))?;
            Ok(ConfigSnapshot {
                settings: doc.settings.into(),
                fixtures: doc.fixtures.into(),
                presets: doc.presets.into(),
                bindings: doc.bindings.into(),
            })
        }
        _ => load_from_csv_or_defaults(paths),
    }
}

fn load_from_csv_or_defaults(paths: &Paths) -> Result<ConfigSnapshot> {
    let fixtures = match fs::read_to_string(&paths.csv) {
        Ok(text) if !text.trim().is_empty() => csv::parse(&text)?,
        _ => Vec::new(),
    };
    Ok(ConfigSnapshot {
        settings: Settings::default().into(),
        fixtures: fixtures.into(),
        presets: Vec::new().into(),
        bindings: Vec::new().into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::std::sync::Arc;

    fn snapshot_with_one_fixture() -> ConfigSnapshot {
        let fixture = Fixture {
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
        };
        ConfigSnapshot {
            settings: Arc::new(Settings::default()),
            fixtures: Arc::new(vec![fixture]),
            presets: Arc::new(Vec::new()),
            bindings: Arc::new(Vec::new()),
        }
    }

    #[test]
    fn json_round_trips() {
        let dir = ::std::env::temp_dir().join(format!("followspot-test-{}-json", ::std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let paths = Paths::new(&dir);
        let snap = snapshot_with_one_fixture();
        save(&paths, &snap).unwrap();
        let loaded = load(&paths).unwrap();
        assert_eq!(loaded.fixtures.len(), 1);
        assert_eq!(loaded.fixtures[0].id, "F1");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_json_falls_back_to_csv() {
        let dir = ::std::env::temp_dir().join(format!("followspot-test-{}-csv-fallback", ::std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let paths = Paths::new(&dir);
        fs::remove_file(&paths.json).ok();
        fs::write(&paths.csv, csv::write(&snapshot_with_one_fixture().fixtures)).unwrap();
        let loaded = load(&paths).unwrap();
        assert_eq!(loaded.fixtures.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }
}
