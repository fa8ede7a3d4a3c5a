// src/materials/mod.rs
pub mod presets;
pub mod synthesizer;

pub use presets::{find_preset, TexturePreset, PRESETS};
pub use synthesizer::{DepthBias, Material, MaterialSynthesizer, PresetMaps};
