// src/web.rs
// Browser entry point. The page owns the frame loop and fetches texture bytes;
// this side parses, builds, caches and releases.

use std::sync::Arc;
use std::time::Duration;

use js_sys::{Array, Function};
use wasm_bindgen::prelude::*;

use crate::config::ModelParams;
use crate::memory::{MemoryMonitor, ReportedMemory};
use crate::pipeline::{LoadObserver, SharedResources, SvgModelPipeline};
use crate::texture::TextureData;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    let _ = console_log::init_with_level(level);
}

fn js_error(err: crate::error::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn millis(now_ms: f64) -> Duration {
    Duration::from_secs_f64(now_ms.max(0.0) / 1000.0)
}

struct JsObserver {
    on_start: Option<Function>,
    on_complete: Option<Function>,
    on_error: Option<Function>,
}

impl JsObserver {
    fn call(f: &Option<Function>, arg: Option<&str>) {
        let Some(f) = f else { return };
        let result = match arg {
            Some(msg) => f.call1(&JsValue::NULL, &JsValue::from_str(msg)),
            None => f.call0(&JsValue::NULL),
        };
        if let Err(err) = result {
            log::warn!("Load callback threw: {:?}", err);
        }
    }
}

impl LoadObserver for JsObserver {
    fn on_load_start(&self) {
        Self::call(&self.on_start, None);
    }

    fn on_load_complete(&self) {
        Self::call(&self.on_complete, None);
    }

    fn on_error(&self, message: &str) {
        Self::call(&self.on_error, Some(message));
    }
}

#[wasm_bindgen]
pub struct SvgModelView {
    pipeline: SvgModelPipeline,
    memory: MemoryMonitor,
    reported: ReportedMemory,
}

#[wasm_bindgen]
impl SvgModelView {
    #[wasm_bindgen(constructor)]
    pub fn new(params_json: Option<String>) -> Result<SvgModelView, JsValue> {
        let params = match params_json {
            Some(json) => ModelParams::from_json_str(&json).map_err(js_error)?,
            None => ModelParams::default(),
        };
        let shared = SharedResources::default();
        let reported = ReportedMemory::default();
        let memory = MemoryMonitor::new(Box::new(reported.clone()), shared.resources.config());
        Ok(Self {
            pipeline: SvgModelPipeline::new(shared, params),
            memory,
            reported,
        })
    }

    /// Returns `false` when the markup could not be parsed (`on_error` has
    /// been called).
    pub fn load_svg(
        &mut self,
        markup: &str,
        on_start: Option<Function>,
        on_complete: Option<Function>,
        on_error: Option<Function>,
    ) -> bool {
        let observer = JsObserver {
            on_start,
            on_complete,
            on_error,
        };
        self.pipeline.load_svg(markup, &observer).is_ok()
    }

    /// Returns `true` when geometry was rebuilt.
    pub fn set_params(&mut self, json: &str) -> Result<bool, JsValue> {
        let params = ModelParams::from_json_str(json).map_err(js_error)?;
        Ok(self.pipeline.set_params(params))
    }

    /// Texture URLs the current preset needs that are not cached yet.
    pub fn missing_textures(&self) -> Array {
        let cache = &self.pipeline.shared().textures;
        self.pipeline
            .texture_request()
            .map(|req| {
                req.urls()
                    .into_iter()
                    .filter(|url| !cache.contains(url))
                    .map(JsValue::from_str)
                    .collect()
            })
            .unwrap_or_else(Array::new)
    }

    /// Decodes fetched bytes into the shared cache.
    pub fn provide_texture(&self, url: &str, bytes: &[u8]) -> Result<(), JsValue> {
        let data = TextureData::decode(url, bytes).map_err(js_error)?;
        self.pipeline.shared().textures.insert(url, Arc::new(data));
        Ok(())
    }

    /// Applies whatever maps of the current preset are cached.
    pub fn apply_cached_textures(&mut self) -> bool {
        match self.pipeline.texture_request() {
            Some(req) => {
                let loaded = req.resolve_cached(&self.pipeline.shared().textures);
                self.pipeline.apply_textures(loaded)
            }
            None => false,
        }
    }

    pub fn report_memory(&self, used: f64, limit: f64) {
        self.reported.report(used.max(0.0) as u64, limit.max(0.0) as u64);
    }

    pub fn on_visibility_change(&self, hidden: bool, now_ms: f64) {
        self.pipeline
            .shared()
            .resources
            .on_visibility_change(hidden, millis(now_ms));
    }

    /// Reads `document.visibilityState` and forwards it.
    pub fn sync_visibility(&self, now_ms: f64) {
        let hidden = web_sys::window()
            .and_then(|w| w.document())
            .map(|d| d.visibility_state() == web_sys::VisibilityState::Hidden)
            .unwrap_or(false);
        self.on_visibility_change(hidden, now_ms);
    }

    pub fn on_unload(&mut self) {
        self.pipeline.teardown();
        self.pipeline.shared().resources.on_unload();
    }

    /// Per-frame housekeeping. Returns the number of resources released.
    pub fn tick(&mut self, now_ms: f64) -> u32 {
        self.pipeline.tick(millis(now_ms), &mut self.memory) as u32
    }

    pub fn mesh_count(&self) -> u32 {
        self.pipeline.model().map_or(0, |m| m.mesh_count() as u32)
    }

    /// `{ totalBytes, entryCount, maxBytes, hits, misses, evictions }` as JSON.
    pub fn cache_stats(&self) -> String {
        let s = self.pipeline.cache_stats();
        serde_json::json!({
            "totalBytes": s.total_bytes,
            "entryCount": s.entry_count,
            "maxBytes": s.max_bytes,
            "hits": s.hits,
            "misses": s.misses,
            "evictions": s.evictions,
        })
        .to_string()
    }
}
