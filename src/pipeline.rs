// src/pipeline.rs
//! SVG → extruded model orchestration.
//!
//! `load_svg` runs parse → shapes → spread → extrusion → materials in full.
//! Parameter changes rebuild geometry only when geometry inputs changed;
//! everything else just re-synthesizes materials over the same geometry.
//!
//! Texture loading is the only asynchronous step. A `TextureRequest`
//! captures the load epoch; results from an older epoch are dropped.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ModelParams, ResourceConfig, TextureCacheConfig};
use crate::error::Result;
use crate::geometry::{build_model, collect_shapes, spread_shapes, ExtrudeSpec};
use crate::materials::{find_preset, MaterialSynthesizer, PresetMaps};
use crate::memory::MemoryMonitor;
use crate::resource_manager::{Disposable, Handle, ResourceManager};
use crate::scene::{Mesh, ModelGroup};
use crate::svg::{parse_svg, ParsedSvg};
use crate::texture::{SamplingParams, Texture, TextureLoadOptions};
use crate::texture_cache::{TextureCache, TextureCacheStats, TextureSource};
use glam::Vec2;

/// Process-wide caches, passed explicitly instead of living in globals.
#[derive(Clone)]
pub struct SharedResources {
    pub textures: Arc<TextureCache>,
    pub resources: Arc<ResourceManager>,
}

impl SharedResources {
    pub fn new(cache: TextureCacheConfig, lifecycle: ResourceConfig) -> Self {
        let resources = Arc::new(ResourceManager::new(lifecycle));
        let textures = Arc::new(TextureCache::with_tracker(cache, Arc::clone(&resources)));
        resources.attach_texture_cache(&textures);
        Self { textures, resources }
    }
}

impl Default for SharedResources {
    fn default() -> Self {
        Self::new(TextureCacheConfig::default(), ResourceConfig::default())
    }
}

/// Lifecycle notifications for the host view.
pub trait LoadObserver {
    fn on_load_start(&self) {}
    fn on_load_complete(&self) {}
    fn on_error(&self, _message: &str) {}
}

/// Ignores every notification.
pub struct NoopObserver;

impl LoadObserver for NoopObserver {}

/// Texture maps wanted for the current preset, tagged with the load epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRequest {
    pub epoch: u64,
    pub preset: String,
    pub diffuse: String,
    pub normal: Option<String>,
    pub roughness: Option<String>,
}

/// Outcome of a `TextureRequest`.
#[derive(Debug, Clone)]
pub struct LoadedTextures {
    pub epoch: u64,
    pub preset: String,
    pub maps: PresetMaps,
    pub failed: Vec<String>,
}

impl TextureRequest {
    pub fn urls(&self) -> Vec<&str> {
        std::iter::once(self.diffuse.as_str())
            .chain(self.normal.as_deref())
            .chain(self.roughness.as_deref())
            .collect()
    }

    fn options(srgb: bool) -> TextureLoadOptions {
        TextureLoadOptions {
            sampling: SamplingParams {
                srgb,
                ..SamplingParams::default()
            },
        }
    }

    /// Fetches every map through the cache. Failed maps are logged and left
    /// empty so materials fall back to flat color.
    pub async fn load<S: TextureSource>(&self, cache: &TextureCache, source: &S) -> LoadedTextures {
        let mut failed = Vec::new();
        let mut fetch = |result: Result<Texture>, url: &str| match result {
            Ok(texture) => Some(texture),
            Err(err) => {
                log::warn!("Texture unavailable, using flat color: {}", err);
                failed.push(url.to_string());
                None
            }
        };

        let diffuse = fetch(cache.load_texture(source, &self.diffuse, &Self::options(true)).await, &self.diffuse);
        let mut normal = None;
        if let Some(url) = &self.normal {
            normal = fetch(cache.load_texture(source, url, &Self::options(false)).await, url);
        }
        let mut roughness = None;
        if let Some(url) = &self.roughness {
            roughness = fetch(cache.load_texture(source, url, &Self::options(false)).await, url);
        }

        LoadedTextures {
            epoch: self.epoch,
            preset: self.preset.clone(),
            maps: PresetMaps {
                diffuse,
                normal,
                roughness,
            },
            failed,
        }
    }

    /// Synchronous variant using only what is already cached.
    pub fn resolve_cached(&self, cache: &TextureCache) -> LoadedTextures {
        let mut failed = Vec::new();
        let mut lookup = |url: &str, srgb: bool| match cache.get(url) {
            Some(data) => Some(Texture::new(data, Self::options(srgb).sampling)),
            None => {
                failed.push(url.to_string());
                None
            }
        };
        let diffuse = lookup(&self.diffuse, true);
        let normal = self.normal.as_deref().and_then(|u| lookup(u, false));
        let roughness = self.roughness.as_deref().and_then(|u| lookup(u, false));
        LoadedTextures {
            epoch: self.epoch,
            preset: self.preset.clone(),
            maps: PresetMaps {
                diffuse,
                normal,
                roughness,
            },
            failed,
        }
    }
}

pub struct SvgModelPipeline {
    shared: SharedResources,
    params: ModelParams,
    parsed: Option<ParsedSvg>,
    model: Option<Arc<ModelGroup>>,
    model_handle: Option<Handle>,
    geometry_handles: Vec<Handle>,
    synthesizer: MaterialSynthesizer,
    epoch: u64,
}

impl SvgModelPipeline {
    pub fn new(shared: SharedResources, params: ModelParams) -> Self {
        let params = params.clamped();
        let synthesizer = MaterialSynthesizer::new(params.material.clone(), params.texture.clone())
            .with_tracker(Arc::clone(&shared.resources));
        Self {
            shared,
            params,
            parsed: None,
            model: None,
            model_handle: None,
            geometry_handles: Vec::new(),
            synthesizer,
            epoch: 0,
        }
    }

    pub fn shared(&self) -> &SharedResources {
        &self.shared
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn parsed(&self) -> Option<&ParsedSvg> {
        self.parsed.as_ref()
    }

    pub fn model(&self) -> Option<&Arc<ModelGroup>> {
        self.model.as_ref()
    }

    pub fn synthesizer(&self) -> &MaterialSynthesizer {
        &self.synthesizer
    }

    pub fn cache_stats(&self) -> TextureCacheStats {
        self.shared.textures.stats()
    }

    /// Parses `markup` and builds a fresh model. Parse failures are reported
    /// through `observer.on_error` and leave no model behind.
    pub fn load_svg(&mut self, markup: &str, observer: &dyn LoadObserver) -> Result<Arc<ModelGroup>> {
        self.epoch += 1;
        observer.on_load_start();
        self.drop_model();

        let parsed = match parse_svg(markup) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::error!("SVG load failed: {}", err);
                self.parsed = None;
                observer.on_error(&err.to_string());
                return Err(err);
            }
        };
        log::info!(
            "Parsed SVG: {} path(s), {}x{}",
            parsed.paths.len(),
            parsed.width,
            parsed.height
        );
        self.parsed = Some(parsed);

        let model = self.rebuild();
        observer.on_load_complete();
        Ok(model)
    }

    /// Applies a new parameter set. Returns `true` when geometry was rebuilt.
    pub fn set_params(&mut self, params: ModelParams) -> bool {
        let params = params.clamped();
        let geometry_changed = params.geometry != self.params.geometry
            || params.hole_detection != self.params.hole_detection;

        self.synthesizer.set_material_settings(params.material.clone());
        self.synthesizer.set_texture_settings(params.texture.clone());
        self.params = params;

        if geometry_changed && self.parsed.is_some() {
            self.drop_model();
            self.rebuild();
            true
        } else {
            self.rematerialize();
            false
        }
    }

    /// Maps needed by the current texture settings, if any.
    pub fn texture_request(&self) -> Option<TextureRequest> {
        let t = &self.params.texture;
        if !t.enabled {
            return None;
        }
        let preset = find_preset(&t.preset)?;
        Some(TextureRequest {
            epoch: self.epoch,
            preset: preset.name.to_string(),
            diffuse: preset.diffuse.to_string(),
            normal: preset.normal.map(str::to_string),
            roughness: preset.roughness_map.map(str::to_string),
        })
    }

    /// Installs loaded maps and re-synthesizes materials. Results from an
    /// older load, or for a preset no longer selected, are dropped.
    pub fn apply_textures(&mut self, loaded: LoadedTextures) -> bool {
        if loaded.epoch != self.epoch {
            log::debug!("Dropping stale texture load (epoch {} != {})", loaded.epoch, self.epoch);
            return false;
        }
        if !loaded.preset.eq_ignore_ascii_case(&self.params.texture.preset) {
            log::debug!("Dropping texture load for preset '{}'", loaded.preset);
            return false;
        }
        let maps = (!loaded.maps.is_empty()).then_some(loaded.maps);
        self.synthesizer.set_texture_maps(&loaded.preset, maps);
        self.rematerialize();
        true
    }

    /// Returns the current model, rebuilding it if a resource sweep
    /// disposed it.
    pub fn ensure_model(&mut self) -> Option<Arc<ModelGroup>> {
        let disposed = self.model.as_ref().is_some_and(|m| m.is_disposed());
        if disposed {
            log::info!("Model was released; rebuilding");
            self.drop_model();
            self.rebuild();
        }
        self.model.clone()
    }

    /// Per-frame housekeeping: memory pressure, deferred cleanup, then a
    /// rebuild of anything a sweep released. Returns how many resources
    /// were disposed.
    pub fn tick(&mut self, now: Duration, memory: &mut MemoryMonitor) -> usize {
        let resources = Arc::clone(&self.shared.resources);
        let mut released = 0;
        if memory.poll(now).is_some() {
            released += resources.handle_low_memory();
        }
        released += resources.tick(now);
        if released > 0 {
            self.ensure_model();
        }
        released
    }

    /// Releases the model, its geometry and every cached material.
    pub fn teardown(&mut self) {
        self.drop_model();
        self.synthesizer.clear();
        self.parsed = None;
    }

    // ---------- internals ----------

    /// Untracks and disposes the current model and its geometry.
    fn drop_model(&mut self) {
        let resources = &self.shared.resources;
        if let Some(handle) = self.model_handle.take() {
            resources.release(handle);
        }
        for handle in self.geometry_handles.drain(..) {
            resources.untrack(handle);
        }
        if let Some(model) = self.model.take() {
            if !model.is_disposed() {
                let _ = model.dispose();
            }
        }
    }

    fn install(&mut self, group: ModelGroup) -> Arc<ModelGroup> {
        let group = Arc::new(group);
        self.model_handle = Some(self.shared.resources.track(&group));
        self.model = Some(Arc::clone(&group));
        group
    }

    /// Full build from the parsed document. Assumes no live model.
    fn rebuild(&mut self) -> Arc<ModelGroup> {
        let natural = self
            .parsed
            .as_ref()
            .map(|p| Vec2::new(p.width, p.height))
            .unwrap_or(Vec2::ZERO);
        let Some(parsed) = &self.parsed else {
            return self.install(ModelGroup::new(Vec::new(), 1.0, natural));
        };

        let g = &self.params.geometry;
        let spec = ExtrudeSpec::from_params(g);
        let inputs = collect_shapes(parsed, spec.curve_segments, self.params.hole_detection);
        let inputs = spread_shapes(inputs, g.spread);
        let built = build_model(&inputs, &spec);
        if built.parts.is_empty() {
            log::warn!("SVG produced no renderable shapes");
        }

        let meshes = built
            .parts
            .into_iter()
            .map(|part| {
                self.geometry_handles.push(self.shared.resources.track(&part.geometry));
                Mesh {
                    material: self.synthesizer.get_material(part.color, part.is_hole),
                    geometry: part.geometry,
                    color: part.color,
                    is_hole: part.is_hole,
                    path_index: part.path_index,
                    position: part.position,
                    render_order: part.render_order,
                }
            })
            .collect();

        self.install(ModelGroup::new(meshes, built.scale, natural))
    }

    /// Same geometry, freshly synthesized materials.
    fn rematerialize(&mut self) {
        let Some(old) = self.model.take() else {
            return;
        };
        if old.is_disposed() {
            self.model = Some(old);
            return;
        }
        if let Some(handle) = self.model_handle.take() {
            // The old group shares geometry with the new one: untrack only.
            self.shared.resources.untrack(handle);
        }
        let synthesizer = &mut self.synthesizer;
        let group = old.with_materials(|mesh| synthesizer.get_material(mesh.color, mesh.is_hole));
        self.install(group);
    }
}

impl Drop for SvgModelPipeline {
    fn drop(&mut self) {
        self.drop_model();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::memory::ReportedMemory;
    use crate::resource_manager::ResourceKind;
    use crate::texture_cache::MemorySource;
    use image::{ImageBuffer, Rgba};
    use parking_lot::Mutex;

    const SQUARE: &str = r#"<svg viewBox="0 0 100 100"><path d="M10 10 H90 V90 H10 Z"/></svg>"#;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl LoadObserver for Recorder {
        fn on_load_start(&self) {
            self.events.lock().push("start".into());
        }
        fn on_load_complete(&self) {
            self.events.lock().push("complete".into());
        }
        fn on_error(&self, message: &str) {
            self.events.lock().push(format!("error:{message}"));
        }
    }

    fn flat_params() -> ModelParams {
        let mut p = ModelParams::default();
        p.geometry.depth = 20.0;
        p.geometry.bevel_enabled = false;
        p
    }

    fn png() -> Vec<u8> {
        let img = ImageBuffer::<Rgba<u8>, _>::from_pixel(4, 4, Rgba([160, 110, 60, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn oak_source() -> MemorySource {
        let source = MemorySource::new();
        for url in find_preset("oak").unwrap().urls() {
            source.insert(url, png());
        }
        source
    }

    #[test]
    fn test_scenario_square_is_centered_in_reference_frame() {
        let mut p = SvgModelPipeline::new(SharedResources::default(), flat_params());
        let recorder = Recorder::default();
        let model = p.load_svg(SQUARE, &recorder).unwrap();

        assert_eq!(model.mesh_count(), 1);
        let b = model.bounds();
        assert!((b.min.x + 50.0).abs() < 1e-3 && (b.max.x - 50.0).abs() < 1e-3);
        assert!((b.min.y + 50.0).abs() < 1e-3 && (b.max.y - 50.0).abs() < 1e-3);
        assert!(b.center().length() < 1e-3);
        assert_eq!(model.natural_size(), Vec2::new(100.0, 100.0));
        assert_eq!(*recorder.events.lock(), vec!["start", "complete"]);
    }

    #[tokio::test]
    async fn test_scenario_textured_material_keeps_flat_red() {
        let mut params = ModelParams::default();
        params.material.color_override = Some("#ff0000".into());
        params.texture.enabled = true;
        params.texture.preset = "oak".into();
        params.texture.intensity = 0.0;

        let mut p = SvgModelPipeline::new(SharedResources::default(), params);
        p.load_svg(SQUARE, &NoopObserver).unwrap();

        let request = p.texture_request().unwrap();
        assert_eq!(request.diffuse, "textures/oak/diffuse.jpg");
        let source = oak_source();
        let loaded = request.load(&p.shared().textures, &source).await;
        assert!(loaded.failed.is_empty());
        assert!(p.apply_textures(loaded));

        let model = p.model().unwrap();
        let material = &model.meshes()[0].material;
        assert_eq!(material.base_color(), Rgb::new(255, 0, 0));
        assert_eq!(material.map().map(|t| t.label()), Some("textures/oak/diffuse.jpg"));
        assert_eq!(p.cache_stats().entry_count, 3);
    }

    #[test]
    fn test_scenario_malformed_svg_reports_error() {
        let mut p = SvgModelPipeline::new(SharedResources::default(), ModelParams::default());
        let recorder = Recorder::default();
        let err = p.load_svg("<svg><circle ", &recorder).unwrap_err();
        assert!(err.is_parse());
        assert!(p.model().is_none());

        let events = recorder.events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "start");
        assert!(events[1].starts_with("error:") && events[1].len() > "error:".len());
    }

    #[tokio::test]
    async fn test_stale_texture_load_is_dropped() {
        let mut params = flat_params();
        params.texture.enabled = true;
        let mut p = SvgModelPipeline::new(SharedResources::default(), params);
        p.load_svg(SQUARE, &NoopObserver).unwrap();

        let request = p.texture_request().unwrap();
        p.load_svg(SQUARE, &NoopObserver).unwrap();
        let loaded = request.load(&p.shared().textures, &oak_source()).await;
        assert!(!p.apply_textures(loaded));
        assert!(p.model().unwrap().meshes()[0].material.map().is_none());

        // A fresh request for the new epoch resolves from cache.
        let cached = p.texture_request().unwrap().resolve_cached(&p.shared().textures);
        assert!(cached.failed.is_empty());
        assert!(p.apply_textures(cached));
        assert!(p.model().unwrap().meshes()[0].material.map().is_some());
    }

    #[tokio::test]
    async fn test_failed_textures_fall_back_to_flat_color() {
        let mut params = flat_params();
        params.texture.enabled = true;
        params.material.color_override = Some("#0000ff".into());
        params.texture.intensity = 1.0;
        let mut p = SvgModelPipeline::new(SharedResources::default(), params);
        p.load_svg(SQUARE, &NoopObserver).unwrap();

        let loaded = p
            .texture_request()
            .unwrap()
            .load(&p.shared().textures, &MemorySource::new())
            .await;
        assert_eq!(loaded.failed.len(), 3);
        assert!(p.apply_textures(loaded));

        let material = &p.model().unwrap().meshes()[0].material;
        assert!(material.map().is_none());
        assert_eq!(material.base_color(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_material_change_keeps_geometry() {
        let mut p = SvgModelPipeline::new(SharedResources::default(), flat_params());
        p.load_svg(SQUARE, &NoopObserver).unwrap();
        let before = Arc::clone(&p.model().unwrap().meshes()[0].geometry);

        let mut params = p.params().clone();
        params.material.roughness = 0.95;
        assert!(!p.set_params(params));
        let mesh = &p.model().unwrap().meshes()[0];
        assert!(Arc::ptr_eq(&before, &mesh.geometry));
        assert!(!before.is_disposed());
        assert_eq!(mesh.material.params().roughness, 0.95);

        let mut params = p.params().clone();
        params.geometry.depth = 5.0;
        assert!(p.set_params(params));
        assert!(before.is_disposed());
        let b = p.model().unwrap().bounds();
        assert!((b.size().z - 5.0 * 1.25).abs() < 1e-3);
    }

    #[test]
    fn test_tracking_and_cleanup_rebuilds() {
        let shared = SharedResources::default();
        let mut p = SvgModelPipeline::new(shared.clone(), flat_params());
        p.load_svg(SQUARE, &NoopObserver).unwrap();

        let rm = &shared.resources;
        assert_eq!(rm.tracked_count_of(ResourceKind::Group), 1);
        assert_eq!(rm.tracked_count_of(ResourceKind::Geometry), 1);
        assert_eq!(rm.tracked_count_of(ResourceKind::Material), 1);

        assert!(rm.handle_low_memory() >= 1);
        assert!(p.model().unwrap().is_disposed());

        let model = p.ensure_model().unwrap();
        assert!(!model.is_disposed());
        assert!(!model.meshes()[0].material.is_disposed());
        assert_eq!(rm.tracked_count_of(ResourceKind::Group), 1);
    }

    #[tokio::test]
    async fn test_low_memory_drops_freed_texture_maps() {
        let mut params = flat_params();
        params.texture.enabled = true;
        let shared = SharedResources::default();
        let mut p = SvgModelPipeline::new(shared.clone(), params);
        p.load_svg(SQUARE, &NoopObserver).unwrap();
        let loaded = p.texture_request().unwrap().load(&shared.textures, &oak_source()).await;
        assert!(p.apply_textures(loaded));
        let pixels = Arc::clone(p.model().unwrap().meshes()[0].material.map().unwrap().data());

        shared.resources.handle_low_memory();
        assert!(pixels.is_disposed());
        assert_eq!(p.cache_stats().entry_count, 0);

        let model = p.ensure_model().unwrap();
        let material = &model.meshes()[0].material;
        assert!(material.map().is_none());
        assert!(!material.is_disposed());
        assert!(!p.synthesizer().has_texture_maps());

        // Reloading brings the maps back with live pixels.
        let loaded = p.texture_request().unwrap().load(&shared.textures, &oak_source()).await;
        assert!(p.apply_textures(loaded));
        let map = p.model().unwrap().meshes()[0].material.map().cloned().unwrap();
        assert!(!map.data().is_disposed());
    }

    #[tokio::test]
    async fn test_tick_handles_memory_pressure_and_rebuilds() {
        let mut params = flat_params();
        params.texture.enabled = true;
        let shared = SharedResources::default();
        let mut p = SvgModelPipeline::new(shared.clone(), params);
        p.load_svg(SQUARE, &NoopObserver).unwrap();
        let loaded = p.texture_request().unwrap().load(&shared.textures, &oak_source()).await;
        assert!(p.apply_textures(loaded));

        let reported = ReportedMemory::default();
        let mut monitor = MemoryMonitor::new(Box::new(reported.clone()), shared.resources.config());
        assert_eq!(p.tick(Duration::ZERO, &mut monitor), 0);

        reported.report(95, 100);
        let later = shared.resources.config().memory_poll_interval;
        assert!(p.tick(later, &mut monitor) > 0);
        assert_eq!(shared.resources.stats().low_memory_events, 1);

        let model = p.model().unwrap();
        assert!(!model.is_disposed());
        assert!(model.meshes()[0].material.map().is_none());
        assert_eq!(shared.resources.tracked_count_of(ResourceKind::Group), 1);
    }

    #[test]
    fn test_hidden_page_sweep_rebuilds_on_tick() {
        let shared = SharedResources::default();
        let mut p = SvgModelPipeline::new(shared.clone(), flat_params());
        p.load_svg(SQUARE, &NoopObserver).unwrap();
        let mut monitor = MemoryMonitor::new(Box::new(ReportedMemory::default()), shared.resources.config());

        let t0 = Duration::from_secs(1);
        shared.resources.on_visibility_change(true, t0);
        assert_eq!(p.tick(t0, &mut monitor), 0);

        let before = Arc::clone(p.model().unwrap());
        assert!(p.tick(t0 + shared.resources.config().cleanup_delay, &mut monitor) > 0);
        assert!(before.is_disposed());
        assert!(!p.model().unwrap().is_disposed());
        assert_eq!(p.model().unwrap().mesh_count(), 1);
    }

    #[test]
    fn test_tracked_set_stays_flat_across_param_changes() {
        let shared = SharedResources::default();
        let mut p = SvgModelPipeline::new(shared.clone(), flat_params());
        p.load_svg(SQUARE, &NoopObserver).unwrap();
        let rm = &shared.resources;
        let baseline = rm.tracked_count();
        assert_eq!(baseline, 3);

        // Keep the first model alive so stale registry entries would count.
        let first = Arc::clone(p.model().unwrap());
        for i in 0..4 {
            let mut params = p.params().clone();
            params.geometry.depth = 10.0 + i as f32;
            params.texture.scale_x = 2.0 + i as f32;
            assert!(p.set_params(params));
        }
        assert!(first.is_disposed());
        assert_eq!(rm.tracked_count(), baseline);
        assert_eq!(rm.tracked_count_of(ResourceKind::Geometry), 1);
        assert_eq!(rm.tracked_count_of(ResourceKind::Material), 1);
    }

    #[test]
    fn test_teardown_disposes_everything() {
        let mut p = SvgModelPipeline::new(SharedResources::default(), flat_params());
        let model = p.load_svg(SQUARE, &NoopObserver).unwrap();
        p.teardown();
        assert!(model.is_disposed());
        assert!(model.meshes()[0].geometry.is_disposed());
        assert!(model.meshes()[0].material.is_disposed());
        assert!(p.model().is_none());
        assert!(p.synthesizer().is_empty());
    }
}
