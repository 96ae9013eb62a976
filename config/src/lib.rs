//! The authoritative in-memory record of Settings, Fixtures, Presets and
//! button Bindings, plus its on-disk persistence. Everything the HTTP
//! surface and the control loop share about "what is the rig configured
//! to do right now" lives here, behind the snapshot discipline in
//! `store`.

mod csv;
mod error;
mod fixture;
mod persist;
mod preset;
mod settings;
mod store;

pub use error::{Error, Result};
pub use fixture::{ChannelOffset, Fixture, MAX_FIXTURES};
pub use persist::{load as load_persisted, save as save_persisted, Paths as PersistPaths};
pub use preset::{ButtonBinding, Preset};
pub use settings::{ButtonAssignments, GpioPins, Settings, UniverseResolution, ZoomAxisSource};
pub use store::{ConfigSnapshot, ConfigStore};

pub mod csv_schema {
    pub use crate::csv::{parse, write};
}
