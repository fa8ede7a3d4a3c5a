// src/materials/presets.rs
//! Built-in texture presets.
//!
//! A preset names its maps and may pin roughness/metalness to values that
//! suit the surface (wood grain is never metallic).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturePreset {
    pub name: &'static str,
    pub diffuse: &'static str,
    pub normal: Option<&'static str>,
    pub roughness_map: Option<&'static str>,
    /// Replaces the slider value when set.
    pub roughness: Option<f32>,
    /// Replaces the slider value when set.
    pub metalness: Option<f32>,
}

impl TexturePreset {
    /// Every map URL, diffuse first.
    pub fn urls(&self) -> Vec<&'static str> {
        std::iter::once(self.diffuse)
            .chain(self.normal)
            .chain(self.roughness_map)
            .collect()
    }
}

pub const PRESETS: &[TexturePreset] = &[
    TexturePreset {
        name: "oak",
        diffuse: "textures/oak/diffuse.jpg",
        normal: Some("textures/oak/normal.jpg"),
        roughness_map: Some("textures/oak/roughness.jpg"),
        roughness: Some(0.7),
        metalness: Some(0.0),
    },
    TexturePreset {
        name: "walnut",
        diffuse: "textures/walnut/diffuse.jpg",
        normal: Some("textures/walnut/normal.jpg"),
        roughness_map: Some("textures/walnut/roughness.jpg"),
        roughness: Some(0.65),
        metalness: Some(0.0),
    },
    TexturePreset {
        name: "marble",
        diffuse: "textures/marble/diffuse.jpg",
        normal: Some("textures/marble/normal.jpg"),
        roughness_map: None,
        roughness: Some(0.15),
        metalness: Some(0.0),
    },
    TexturePreset {
        name: "brushed_metal",
        diffuse: "textures/brushed_metal/diffuse.jpg",
        normal: Some("textures/brushed_metal/normal.jpg"),
        roughness_map: Some("textures/brushed_metal/roughness.jpg"),
        roughness: Some(0.3),
        metalness: Some(0.9),
    },
    TexturePreset {
        name: "carbon_fiber",
        diffuse: "textures/carbon_fiber/diffuse.jpg",
        normal: Some("textures/carbon_fiber/normal.jpg"),
        roughness_map: None,
        roughness: Some(0.35),
        metalness: Some(0.2),
    },
    TexturePreset {
        name: "concrete",
        diffuse: "textures/concrete/diffuse.jpg",
        normal: Some("textures/concrete/normal.jpg"),
        roughness_map: Some("textures/concrete/roughness.jpg"),
        roughness: Some(0.9),
        metalness: Some(0.0),
    },
    TexturePreset {
        name: "fabric",
        diffuse: "textures/fabric/diffuse.jpg",
        normal: Some("textures/fabric/normal.jpg"),
        roughness_map: None,
        roughness: Some(0.85),
        metalness: Some(0.0),
    },
    TexturePreset {
        name: "leather",
        diffuse: "textures/leather/diffuse.jpg",
        normal: Some("textures/leather/normal.jpg"),
        roughness_map: Some("textures/leather/roughness.jpg"),
        roughness: None,
        metalness: Some(0.0),
    },
];

pub fn find_preset(name: &str) -> Option<&'static TexturePreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
