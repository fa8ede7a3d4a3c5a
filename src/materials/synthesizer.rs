// src/materials/synthesizer.rs
//! Physically based material synthesis with a fingerprint cache.
//!
//! `get_material` maps (shape color, hole flag) plus the current settings to
//! a `Material`. Every parameter that influences the result is part of the
//! fingerprint, so equal fingerprints always yield the same `Arc`.
//! Texture state changes drop the whole cache: a material's texture
//! bindings are fixed at creation.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

use super::presets::{find_preset, TexturePreset};
use crate::color::Rgb;
use crate::config::{MaterialSettings, TextureSettings};
use crate::error::Result;
use crate::pbr_materials::{self, flags, GpuMaterial, MaterialParams, MaterialViews};
use crate::resource_manager::{
    Disposable, DisposeFlag, GpuResident, GpuSlot, Handle, ResourceKind, ResourceManager,
};
use crate::texture::{SamplingParams, Texture};

pub const DEFAULT_IOR: f32 = 1.4;
pub const TRANSMISSION_IOR: f32 = 1.5;
pub const TRANSMISSION_THICKNESS: f32 = 0.5;
pub const ATTENUATION_DISTANCE: f32 = 1.0;
pub const HOLE_OPACITY: f32 = 0.5;
pub const SHEEN_STRENGTH: f32 = 0.5;
pub const ANISOTROPY_STRENGTH: f32 = 0.5;
pub const CLEARCOAT_ROUGHNESS: f32 = 0.1;

/// Polygon offset applied to hole materials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    pub constant: i32,
    pub slope_scale: f32,
}

impl DepthBias {
    pub const HOLE: DepthBias = DepthBias {
        constant: -1,
        slope_scale: -1.0,
    };

    pub fn to_wgpu(self) -> wgpu::DepthBiasState {
        wgpu::DepthBiasState {
            constant: self.constant,
            slope_scale: self.slope_scale,
            clamp: 0.0,
        }
    }
}

/// Texture maps loaded for one preset.
#[derive(Debug, Clone, Default)]
pub struct PresetMaps {
    pub diffuse: Option<Texture>,
    pub normal: Option<Texture>,
    pub roughness: Option<Texture>,
}

impl PresetMaps {
    pub fn is_empty(&self) -> bool {
        self.diffuse.is_none() && self.normal.is_none() && self.roughness.is_none()
    }

    /// Whether any map's pixels were freed by a resource sweep.
    pub fn any_disposed(&self) -> bool {
        [&self.diffuse, &self.normal, &self.roughness]
            .into_iter()
            .flatten()
            .any(|t| t.data().is_disposed())
    }
}

/// A synthesized material. Texture maps reference shared pixels; the
/// material owns only its GPU parameter block.
pub struct Material {
    fingerprint: u64,
    params: MaterialParams,
    map: Option<Texture>,
    normal_map: Option<Texture>,
    roughness_map: Option<Texture>,
    transparent: bool,
    depth_write: bool,
    depth_bias: Option<DepthBias>,
    gpu: GpuSlot<GpuMaterial>,
    disposed: DisposeFlag,
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .field("base_color", &self.params.base_color)
            .field("map", &self.map.as_ref().map(|t| t.label()))
            .field("transparent", &self.transparent)
            .field("disposed", &self.disposed.is_set())
            .finish()
    }
}

impl Material {
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn params(&self) -> &MaterialParams {
        &self.params
    }

    pub fn base_color(&self) -> Rgb {
        let [r, g, b, _] = self.params.base_color;
        Rgb::from_f32([r, g, b])
    }

    pub fn opacity(&self) -> f32 {
        self.params.opacity()
    }

    pub fn map(&self) -> Option<&Texture> {
        self.map.as_ref()
    }

    pub fn normal_map(&self) -> Option<&Texture> {
        self.normal_map.as_ref()
    }

    pub fn roughness_map(&self) -> Option<&Texture> {
        self.roughness_map.as_ref()
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn depth_write(&self) -> bool {
        self.depth_write
    }

    pub fn depth_bias(&self) -> Option<DepthBias> {
        self.depth_bias
    }

    pub fn is_resident(&self) -> bool {
        self.gpu.is_resident()
    }

    /// Uploads referenced textures and creates the bind group. Returns
    /// `true` when GPU objects were created.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        fallback: &wgpu::TextureView,
    ) -> Result<bool> {
        crate::ensure!(
            !self.disposed.is_set(),
            "material {:016x} used after disposal",
            self.fingerprint
        );
        if self.gpu.is_resident() {
            return Ok(false);
        }

        let maps = [&self.map, &self.normal_map, &self.roughness_map];
        for texture in maps.into_iter().flatten() {
            texture.data().upload(device, queue, texture.sampling.srgb)?;
        }

        let base = self.map.as_ref().and_then(|t| t.data().gpu());
        let normal = self.normal_map.as_ref().and_then(|t| t.data().gpu());
        let rough = self.roughness_map.as_ref().and_then(|t| t.data().gpu());
        let sampling = self.map.as_ref().map(|t| t.sampling).unwrap_or_default();

        let gpu = pbr_materials::create_gpu_material(
            device,
            layout,
            &format!("material_{:016x}", self.fingerprint),
            &self.params,
            MaterialViews {
                base_color: base.as_deref().map(|g| &g.view),
                normal: normal.as_deref().map(|g| &g.view),
                roughness: rough.as_deref().map(|g| &g.view),
            },
            fallback,
            &sampling,
        );
        drop((base, normal, rough));
        self.gpu.set(gpu);
        Ok(true)
    }
}

impl Disposable for Material {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Material
    }

    /// Frees the parameter block; shared texture pixels stay with the cache.
    fn dispose(&self) -> Result<()> {
        self.disposed.mark("material")?;
        self.gpu.release();
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_set()
    }
}

impl GpuResident for Material {
    fn release_gpu(&self) {
        self.gpu.release();
    }
}

struct CachedMaterial {
    material: Arc<Material>,
    handle: Option<Handle>,
}

/// Memoizing material factory.
pub struct MaterialSynthesizer {
    settings: MaterialSettings,
    texture: TextureSettings,
    /// Loaded maps and the preset they were loaded for.
    maps: Option<(String, PresetMaps)>,
    cache: HashMap<u64, CachedMaterial>,
    tracker: Option<Arc<ResourceManager>>,
}

impl fmt::Debug for MaterialSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialSynthesizer")
            .field("settings", &self.settings)
            .field("texture", &self.texture)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl MaterialSynthesizer {
    pub fn new(settings: MaterialSettings, texture: TextureSettings) -> Self {
        Self {
            settings,
            texture,
            maps: None,
            cache: HashMap::new(),
            tracker: None,
        }
    }

    /// New materials are registered with `tracker`.
    pub fn with_tracker(mut self, tracker: Arc<ResourceManager>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn material_settings(&self) -> &MaterialSettings {
        &self.settings
    }

    pub fn texture_settings(&self) -> &TextureSettings {
        &self.texture
    }

    /// Slider changes only alter fingerprints; cached entries stay valid.
    pub fn set_material_settings(&mut self, settings: MaterialSettings) {
        self.settings = settings;
    }

    /// Returns `true` when the change invalidated the cache.
    pub fn set_texture_settings(&mut self, texture: TextureSettings) -> bool {
        let invalidates = texture.enabled != self.texture.enabled
            || texture.preset != self.texture.preset
            || texture.scale_x != self.texture.scale_x
            || texture.scale_y != self.texture.scale_y;
        self.texture = texture;
        if invalidates {
            self.clear();
        }
        invalidates
    }

    /// Installs (or removes) the maps loaded for `preset` and drops the cache.
    pub fn set_texture_maps(&mut self, preset: &str, maps: Option<PresetMaps>) {
        self.maps = maps.map(|m| (preset.to_string(), m));
        self.clear();
    }

    /// Forgets maps whose pixels were freed, so materials fall back to flat
    /// color until fresh maps are installed. Returns `true` if any were dropped.
    pub fn drop_disposed_maps(&mut self) -> bool {
        let stale = self.maps.as_ref().is_some_and(|(_, m)| m.any_disposed());
        if stale {
            log::warn!("Texture maps were released; materials fall back to flat color");
            self.maps = None;
            self.clear();
        }
        stale
    }

    pub fn has_texture_maps(&self) -> bool {
        self.current_maps().is_some()
    }

    /// Maps for the current preset, if any were loaded.
    fn current_maps(&self) -> Option<&PresetMaps> {
        match &self.maps {
            Some((preset, maps)) if preset.eq_ignore_ascii_case(&self.texture.preset) => Some(maps),
            _ => None,
        }
    }

    fn active_preset(&self) -> Option<&'static TexturePreset> {
        if self.texture.enabled {
            find_preset(&self.texture.preset)
        } else {
            None
        }
    }

    fn textures_loaded(&self) -> bool {
        self.active_preset().is_some()
            && self.current_maps().is_some_and(|m| m.diffuse.is_some())
    }

    /// Override color when one is set, else the shape's own color.
    fn resolve_color(&self, color: Rgb) -> Rgb {
        self.settings.override_color().unwrap_or(color)
    }

    /// Hash over every parameter that affects the synthesized material.
    pub fn fingerprint(&self, color: Rgb, is_hole: bool) -> u64 {
        let s = &self.settings;
        let t = &self.texture;
        let mut key = String::with_capacity(96);
        let _ = write!(
            key,
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.resolve_color(color),
            s.roughness,
            s.metalness,
            s.clearcoat,
            s.transmission,
            s.env_map_intensity,
            t.enabled,
            t.preset,
            t.intensity,
            t.scale_x,
            t.scale_y,
            is_hole,
            self.textures_loaded(),
        );
        xxh3_64(key.as_bytes())
    }

    /// Memoized material lookup. A cached entry that was disposed elsewhere
    /// is rebuilt.
    pub fn get_material(&mut self, color: Rgb, is_hole: bool) -> Arc<Material> {
        self.drop_disposed_maps();
        let fingerprint = self.fingerprint(color, is_hole);
        if let Some(existing) = self.cache.get(&fingerprint) {
            if !existing.material.is_disposed() {
                return Arc::clone(&existing.material);
            }
        }
        if let Some(stale) = self.cache.remove(&fingerprint) {
            self.untrack(&stale);
        }

        let material = Arc::new(self.synthesize(fingerprint, color, is_hole));
        let handle = self.tracker.as_ref().map(|t| t.track(&material));
        self.cache.insert(
            fingerprint,
            CachedMaterial {
                material: Arc::clone(&material),
                handle,
            },
        );
        material
    }

    fn untrack(&self, entry: &CachedMaterial) {
        if let (Some(tracker), Some(handle)) = (&self.tracker, entry.handle) {
            tracker.untrack(handle);
        }
    }

    fn synthesize(&self, fingerprint: u64, color: Rgb, is_hole: bool) -> Material {
        let s = &self.settings;
        let t = &self.texture;
        let preset = self.active_preset();
        let maps = if self.textures_loaded() {
            self.current_maps()
        } else {
            None
        };

        let mut base = self.resolve_color(color);
        if maps.is_some() {
            base = Rgb::WHITE.lerp(base, 1.0 - t.intensity);
        }

        let roughness = preset.and_then(|p| p.roughness).filter(|_| maps.is_some()).unwrap_or(s.roughness);
        let metalness = preset.and_then(|p| p.metalness).filter(|_| maps.is_some()).unwrap_or(s.metalness);

        let [r, g, b] = base.to_f32();
        let mut params = MaterialParams {
            base_color: [r, g, b, 1.0],
            uv_scale: [t.scale_x, t.scale_y],
            metallic: metalness,
            roughness,
            clearcoat: s.clearcoat,
            clearcoat_roughness: CLEARCOAT_ROUGHNESS,
            transmission: s.transmission,
            ior: DEFAULT_IOR,
            env_map_intensity: s.env_map_intensity,
            ..MaterialParams::default()
        };
        let mut transparent = false;

        if s.transmission > 0.0 {
            params.ior = TRANSMISSION_IOR;
            params.thickness = TRANSMISSION_THICKNESS;
            params.attenuation_color = [1.0, 1.0, 1.0, ATTENUATION_DISTANCE];
            params.flags |= flags::TRANSMISSION;
            transparent = true;
        }

        if metalness < 0.3 && roughness > 0.6 {
            params.sheen_color = [r, g, b, SHEEN_STRENGTH];
            params.sheen_roughness = roughness;
            params.flags |= flags::SHEEN;
        }
        if metalness > 0.7 && roughness < 0.4 {
            params.anisotropy = ANISOTROPY_STRENGTH;
            params.flags |= flags::ANISOTROPY;
        }

        let (mut depth_write, mut depth_bias) = (true, None);
        if is_hole {
            params.base_color[3] = HOLE_OPACITY;
            params.flags |= flags::HOLE;
            transparent = true;
            depth_write = false;
            depth_bias = Some(DepthBias::HOLE);
        }
        if transparent {
            params.flags |= flags::TRANSPARENT;
        }

        let sampled = |texture: &Option<Texture>, srgb: bool| {
            texture.as_ref().map(|tex| {
                tex.with_sampling(SamplingParams {
                    repeat: [t.scale_x, t.scale_y],
                    srgb,
                    ..tex.sampling
                })
            })
        };
        let (map, normal_map, roughness_map) = match maps {
            Some(m) => (sampled(&m.diffuse, true), sampled(&m.normal, false), sampled(&m.roughness, false)),
            None => (None, None, None),
        };
        if map.is_some() {
            params.flags |= flags::BASE_COLOR_TEX;
        }
        if normal_map.is_some() {
            params.flags |= flags::NORMAL_TEX;
        }
        if roughness_map.is_some() {
            params.flags |= flags::ROUGHNESS_TEX;
        }

        log::debug!(
            "Synthesized material {:016x} (base {}, hole {}, textured {})",
            fingerprint,
            base,
            is_hole,
            map.is_some()
        );

        Material {
            fingerprint,
            params,
            map,
            normal_map,
            roughness_map,
            transparent,
            depth_write,
            depth_bias,
            gpu: GpuSlot::new(),
            disposed: DisposeFlag::new(),
        }
    }

    /// Disposes every cached material and empties the cache.
    pub fn clear(&mut self) {
        let count = self.cache.len();
        let entries: Vec<CachedMaterial> = self.cache.drain().map(|(_, e)| e).collect();
        for entry in &entries {
            self.untrack(entry);
            if !entry.material.is_disposed() {
                let _ = entry.material.dispose();
            }
        }
        if count > 0 {
            log::debug!("Material cache cleared ({} disposed)", count);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Drop for MaterialSynthesizer {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::texture::TextureData;

    fn synth() -> MaterialSynthesizer {
        MaterialSynthesizer::new(MaterialSettings::default(), TextureSettings::default())
    }

    fn oak_maps() -> PresetMaps {
        let data = Arc::new(TextureData::solid("textures/oak/diffuse.jpg", [180, 130, 80, 255]));
        PresetMaps {
            diffuse: Some(Texture::new(data, SamplingParams::default())),
            normal: None,
            roughness: None,
        }
    }

    #[test]
    fn test_same_fingerprint_same_instance() {
        let mut s = synth();
        let a = s.get_material(Rgb::new(10, 20, 30), false);
        let b = s.get_material(Rgb::new(10, 20, 30), false);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(s.len(), 1);

        let hole = s.get_material(Rgb::new(10, 20, 30), true);
        let other = s.get_material(Rgb::new(10, 20, 31), false);
        assert!(!Arc::ptr_eq(&a, &hole));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_each_slider_changes_fingerprint() {
        let mut s = synth();
        let color = Rgb::new(1, 2, 3);
        let base = s.fingerprint(color, false);
        let tweaks: [fn(&mut MaterialSettings); 5] = [
            |m| m.roughness = 0.9,
            |m| m.metalness = 0.1,
            |m| m.clearcoat = 0.4,
            |m| m.transmission = 0.2,
            |m| m.env_map_intensity = 2.0,
        ];
        for tweak in tweaks {
            let mut settings = MaterialSettings::default();
            tweak(&mut settings);
            s.set_material_settings(settings);
            assert_ne!(s.fingerprint(color, false), base);
        }
    }

    #[test]
    fn test_override_color_shares_material() {
        let mut s = synth();
        s.set_material_settings(MaterialSettings {
            color_override: Some("#00ff00".into()),
            ..MaterialSettings::default()
        });
        let a = s.get_material(Rgb::new(1, 1, 1), false);
        let b = s.get_material(Rgb::new(200, 0, 0), false);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.base_color(), Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_transmission_rules() {
        let mut s = synth();
        let opaque = s.get_material(Rgb::BLACK, false);
        assert_eq!(opaque.params().ior, DEFAULT_IOR);
        assert!(!opaque.is_transparent());

        s.set_material_settings(MaterialSettings {
            transmission: 0.5,
            ..MaterialSettings::default()
        });
        let glass = s.get_material(Rgb::BLACK, false);
        let p = glass.params();
        assert_eq!(p.ior, TRANSMISSION_IOR);
        assert!(p.thickness > 0.0 && p.attenuation_distance() > 0.0);
        assert_eq!(&p.attenuation_color[..3], &[1.0, 1.0, 1.0]);
        assert!(glass.is_transparent());
    }

    #[test]
    fn test_hole_material() {
        let mut s = synth();
        let hole = s.get_material(Rgb::WHITE, true);
        assert_eq!(hole.opacity(), HOLE_OPACITY);
        assert!(hole.is_transparent());
        assert!(!hole.depth_write());
        let bias = hole.depth_bias().unwrap();
        assert!(bias.constant < 0 && bias.slope_scale < 0.0);
    }

    #[test]
    fn test_sheen_and_anisotropy_heuristics() {
        let mut s = synth();
        s.set_material_settings(MaterialSettings {
            roughness: 0.9,
            metalness: 0.0,
            ..MaterialSettings::default()
        });
        let cloth = s.get_material(Rgb::BLACK, false);
        assert_eq!(cloth.params().sheen(), SHEEN_STRENGTH);
        assert_eq!(cloth.params().anisotropy, 0.0);

        s.set_material_settings(MaterialSettings {
            roughness: 0.2,
            metalness: 0.9,
            ..MaterialSettings::default()
        });
        let brushed = s.get_material(Rgb::BLACK, false);
        assert_eq!(brushed.params().sheen(), 0.0);
        assert_eq!(brushed.params().anisotropy, ANISOTROPY_STRENGTH);
    }

    #[test]
    fn test_texture_intensity_zero_keeps_flat_color() {
        let mut s = MaterialSynthesizer::new(
            MaterialSettings {
                color_override: Some("#ff0000".into()),
                ..MaterialSettings::default()
            },
            TextureSettings {
                enabled: true,
                preset: "oak".into(),
                intensity: 0.0,
                ..TextureSettings::default()
            },
        );
        s.set_texture_maps("oak", Some(oak_maps()));
        let m = s.get_material(Rgb::BLACK, false);
        assert_eq!(m.base_color(), Rgb::new(255, 0, 0));
        assert_eq!(m.map().map(|t| t.label()), Some("textures/oak/diffuse.jpg"));
        // Preset adjustments win over the sliders.
        assert_eq!(m.params().metallic, 0.0);
        assert_eq!(m.params().roughness, 0.7);
    }

    #[test]
    fn test_texture_intensity_one_is_white() {
        let mut s = MaterialSynthesizer::new(
            MaterialSettings::default(),
            TextureSettings {
                enabled: true,
                intensity: 1.0,
                scale_x: 2.0,
                scale_y: 3.0,
                ..TextureSettings::default()
            },
        );
        s.set_texture_maps("oak", Some(oak_maps()));
        let m = s.get_material(Rgb::new(0, 0, 255), false);
        assert_eq!(m.base_color(), Rgb::WHITE);
        assert_eq!(m.map().unwrap().sampling.repeat, [2.0, 3.0]);
        assert_eq!(m.params().uv_scale, [2.0, 3.0]);
    }

    #[test]
    fn test_maps_for_other_preset_are_ignored() {
        let mut s = MaterialSynthesizer::new(
            MaterialSettings::default(),
            TextureSettings {
                enabled: true,
                preset: "marble".into(),
                ..TextureSettings::default()
            },
        );
        s.set_texture_maps("oak", Some(oak_maps()));
        assert!(s.get_material(Rgb::BLACK, false).map().is_none());
    }

    #[test]
    fn test_texture_state_change_disposes_cache() {
        let mut s = synth();
        let a = s.get_material(Rgb::BLACK, false);

        let mut t = s.texture_settings().clone();
        t.intensity = 0.4;
        assert!(!s.set_texture_settings(t.clone()));
        assert!(!a.is_disposed());

        t.enabled = true;
        assert!(s.set_texture_settings(t.clone()));
        assert!(a.is_disposed());
        assert!(s.is_empty());

        let b = s.get_material(Rgb::BLACK, false);
        t.scale_x = 4.0;
        assert!(s.set_texture_settings(t));
        assert!(b.is_disposed());
    }

    #[test]
    fn test_disposed_entry_is_rebuilt_and_tracked() {
        let tracker = Arc::new(ResourceManager::new(ResourceConfig::default()));
        let mut s = synth().with_tracker(Arc::clone(&tracker));
        let a = s.get_material(Rgb::BLACK, false);
        assert_eq!(tracker.tracked_count_of(ResourceKind::Material), 1);

        a.dispose().unwrap();
        let b = s.get_material(Rgb::BLACK, false);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!b.is_disposed());
        // The disposed instance left the registry even though `a` is alive.
        assert_eq!(tracker.tracked_count_of(ResourceKind::Material), 1);
    }

    #[test]
    fn test_clear_untracks_disposed_materials() {
        let tracker = Arc::new(ResourceManager::new(ResourceConfig::default()));
        let mut s = synth().with_tracker(Arc::clone(&tracker));
        let a = s.get_material(Rgb::BLACK, false);
        let b = s.get_material(Rgb::WHITE, true);
        assert_eq!(tracker.tracked_count_of(ResourceKind::Material), 2);

        s.clear();
        assert!(a.is_disposed() && b.is_disposed());
        assert_eq!(tracker.tracked_count_of(ResourceKind::Material), 0);
        assert_eq!(tracker.cleanup(), 0);
    }

    #[test]
    fn test_freed_maps_fall_back_to_flat_color() {
        let mut s = MaterialSynthesizer::new(
            MaterialSettings::default(),
            TextureSettings {
                enabled: true,
                preset: "oak".into(),
                ..TextureSettings::default()
            },
        );
        let maps = oak_maps();
        let pixels = Arc::clone(maps.diffuse.as_ref().unwrap().data());
        s.set_texture_maps("oak", Some(maps));
        let textured = s.get_material(Rgb::BLACK, false);
        assert!(textured.map().is_some());
        assert!(!s.drop_disposed_maps());

        pixels.dispose().unwrap();
        let flat = s.get_material(Rgb::BLACK, false);
        assert!(flat.map().is_none());
        assert!(!flat.is_disposed());
        assert!(textured.is_disposed());
        assert!(!s.has_texture_maps());
    }
}
