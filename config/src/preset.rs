use ::serde_derive::{Deserialize, Serialize};

/// A captured position snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub pan16: u16,
    pub tilt16: u16,
    pub dim8: u8,
    pub zoom16: u16,
}

/// Button index -> preset id. Bindings are disjoint from the semantic
/// action indices in `Settings::buttons`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonBinding {
    pub button: u32,
    pub preset_id: String,
}
