// src/config.rs
//! Parameter set consumed by the model pipeline.
//!
//! Everything the UI panels can change lives here. All structs deserialize
//! with defaults, so partial JSON documents are valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::context::Context;
use crate::error::Result;
use crate::geometry::extrude::MAX_BEVEL_SEGMENTS;

/// Extrusion and spread parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    pub depth: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: u32,
    /// Hole inset, in percent (0..=100).
    pub spread: f32,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            depth: 20.0,
            bevel_enabled: true,
            bevel_thickness: 1.0,
            bevel_size: 0.5,
            bevel_segments: 4,
            spread: 0.0,
        }
    }
}

/// Slider-driven physical material settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    /// `#rrggbb`; when set, every shape uses this color.
    pub color_override: Option<String>,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub transmission: f32,
    pub env_map_intensity: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            color_override: None,
            roughness: 0.3,
            metalness: 0.5,
            clearcoat: 0.0,
            transmission: 0.0,
            env_map_intensity: 1.0,
        }
    }
}

impl MaterialSettings {
    pub fn override_color(&self) -> Option<Rgb> {
        self.color_override.as_deref().and_then(Rgb::parse)
    }
}

/// Texture preset selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub enabled: bool,
    pub preset: String,
    /// 1.0 keeps the texture's natural coloring, 0.0 tints fully to the flat color.
    pub intensity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            preset: "oak".to_string(),
            intensity: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Complete parameter set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub geometry: GeometryParams,
    pub material: MaterialSettings,
    pub texture: TextureSettings,
    /// Emit interior holes and contained cut-out paths as translucent hole shapes.
    pub hole_detection: bool,
}

impl ModelParams {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: ModelParams = serde_json::from_str(json).context("invalid model parameters")?;
        Ok(params.clamped())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Pulls every numeric field into its valid range.
    pub fn clamped(mut self) -> Self {
        let g = &mut self.geometry;
        g.depth = finite_or(g.depth, 20.0).max(0.01);
        g.bevel_thickness = finite_or(g.bevel_thickness, 0.0).max(0.0);
        g.bevel_size = finite_or(g.bevel_size, 0.0).max(0.0);
        g.spread = finite_or(g.spread, 0.0).clamp(0.0, 100.0);
        g.bevel_segments = g.bevel_segments.min(MAX_BEVEL_SEGMENTS);

        let m = &mut self.material;
        m.roughness = unit(m.roughness);
        m.metalness = unit(m.metalness);
        m.clearcoat = unit(m.clearcoat);
        m.transmission = unit(m.transmission);
        m.env_map_intensity = finite_or(m.env_map_intensity, 1.0).max(0.0);

        let t = &mut self.texture;
        t.intensity = unit(t.intensity);
        t.scale_x = finite_or(t.scale_x, 1.0).max(0.01);
        t.scale_y = finite_or(t.scale_y, 1.0).max(0.01);
        self
    }
}

#[inline]
fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

#[inline]
fn unit(v: f32) -> f32 {
    finite_or(v, 0.0).clamp(0.0, 1.0)
}

/// Budget for the shared texture cache.
#[derive(Debug, Clone, Copy)]
pub struct TextureCacheConfig {
    pub max_bytes: u64,
    /// Charged for entries whose dimensions are unknown.
    pub fallback_entry_bytes: u64,
}

impl Default for TextureCacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,          // 100MB
            fallback_entry_bytes: 4 * 1024 * 1024, // 4MB
        }
    }
}

/// Timing knobs for the resource lifecycle manager.
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig {
    /// Debounce window for `schedule_cleanup`.
    pub cleanup_delay: Duration,
    pub memory_poll_interval: Duration,
    /// Used/limit ratio that counts as memory pressure.
    pub memory_threshold: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_millis(100),
            memory_poll_interval: Duration::from_secs(10),
            memory_threshold: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let params = ModelParams::from_json_str(
            r##"{ "geometry": { "depth": 5 }, "material": { "color_override": "#ff0000" } }"##,
        )
        .unwrap();
        assert_eq!(params.geometry.depth, 5.0);
        assert_eq!(params.geometry.bevel_segments, 4);
        assert_eq!(params.material.override_color(), Some(Rgb::new(255, 0, 0)));
        assert!(!params.texture.enabled);
    }

    #[test]
    fn test_clamping() {
        let mut params = ModelParams::default();
        params.material.roughness = 3.0;
        params.material.metalness = f32::NAN;
        params.geometry.spread = 250.0;
        params.texture.intensity = -1.0;
        let params = params.clamped();
        assert_eq!(params.material.roughness, 1.0);
        assert_eq!(params.material.metalness, 0.0);
        assert_eq!(params.geometry.spread, 100.0);
        assert_eq!(params.texture.intensity, 0.0);
    }

    #[test]
    fn test_huge_bevel_segments_are_capped() {
        let params = ModelParams::from_json_str(r#"{ "geometry": { "bevel_segments": 4000000000 } }"#).unwrap();
        assert_eq!(params.geometry.bevel_segments, MAX_BEVEL_SEGMENTS);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ModelParams::from_json_str("{ nope").is_err());
    }

    #[test]
    fn test_default_budgets() {
        assert_eq!(TextureCacheConfig::default().max_bytes, 104_857_600);
        assert_eq!(ResourceConfig::default().memory_threshold, 0.8);
    }
}
