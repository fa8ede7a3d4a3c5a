// src/texture_cache.rs
//! URL-keyed texture cache with a byte budget and LRU eviction.
//!
//! Entries hold shared pixel data; callers receive a `Texture` that pairs
//! that data with their own sampling parameters. Lookups, inserts and
//! evictions happen under one lock and never across an await, so only the
//! fetch itself is asynchronous.

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::TextureCacheConfig;
use crate::error::{Error, Result};
use crate::resource_manager::{Disposable, Handle, ResourceManager};
use crate::texture::{Texture, TextureData, TextureLoadOptions};

// ---------- Sources ----------

/// Where texture bytes come from.
pub trait TextureSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// In-memory source; also counts fetches.
#[derive(Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries.write().insert(url.into(), bytes);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl TextureSource for MemorySource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let found = self.entries.read().get(url).cloned();
        let url = url.to_string();
        async move { found.ok_or_else(|| Error::texture_load(url, "not found")) }
    }
}

/// Reads textures relative to a directory.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TextureSource for FileSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        let path = self.root.join(url.trim_start_matches('/'));
        async move { Ok(tokio::fs::read(&path).await?) }
    }
}

/// Fetches textures over HTTP(S), resolving relative URLs against `base_url`.
#[cfg(feature = "network")]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "network")]
impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

#[cfg(feature = "network")]
impl TextureSource for HttpSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        let full = self.resolve(url);
        let request = self.client.get(full.clone());
        async move {
            let response = request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::texture_load(&full, e))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::texture_load(&full, e))?;
            Ok(bytes.to_vec())
        }
    }
}

// ---------- Cache ----------

struct CachedTexture {
    data: Arc<TextureData>,
    bytes: u64,
    /// Logical access clock; higher is more recent.
    last_used: u64,
    handle: Option<Handle>,
}

struct CacheInner {
    // Recency order is kept by the LRU list itself; `last_used` mirrors it.
    entries: LruCache<String, CachedTexture>,
    total_bytes: u64,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureCacheStats {
    pub total_bytes: u64,
    pub entry_count: usize,
    pub max_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct TextureCache {
    cfg: TextureCacheConfig,
    inner: Mutex<CacheInner>,
    tracker: Option<Arc<ResourceManager>>,
}

impl TextureCache {
    pub fn new(cfg: TextureCacheConfig) -> Self {
        Self {
            cfg,
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                total_bytes: 0,
                clock: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            tracker: None,
        }
    }

    /// Cached textures are registered with `tracker` while they are cached.
    pub fn with_tracker(cfg: TextureCacheConfig, tracker: Arc<ResourceManager>) -> Self {
        Self {
            tracker: Some(tracker),
            ..Self::new(cfg)
        }
    }

    pub fn config(&self) -> &TextureCacheConfig {
        &self.cfg
    }

    /// Looks up `url`, refreshing its recency. Disposed entries count as misses.
    pub fn get(&self, url: &str) -> Option<Arc<TextureData>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.clock += 1;
        let now = inner.clock;

        let stale = match inner.entries.get_mut(url) {
            Some(entry) if !entry.data.is_disposed() => {
                entry.last_used = now;
                let data = Arc::clone(&entry.data);
                inner.hits += 1;
                return Some(data);
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            if let Some(entry) = inner.entries.pop(url) {
                inner.total_bytes = inner.total_bytes.saturating_sub(entry.bytes);
                self.untrack(&entry);
            }
        }
        inner.misses += 1;
        None
    }

    /// Presence check that leaves recency untouched.
    pub fn contains(&self, url: &str) -> bool {
        self.inner.lock().entries.contains(url)
    }

    /// Caches `data` under `url`, evicting least-recently-used entries until
    /// it fits. Returns the evicted URLs, oldest first. Entries larger than
    /// the whole budget are not cached.
    pub fn insert(&self, url: &str, data: Arc<TextureData>) -> Vec<String> {
        let bytes = data.estimated_bytes(self.cfg.fallback_entry_bytes);
        let mut evicted = Vec::new();
        let mut inner = self.inner.lock();

        if let Some(old) = inner.entries.pop(url) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.bytes);
            self.untrack(&old);
        }

        if bytes > self.cfg.max_bytes {
            log::warn!(
                "Texture '{}' ({} bytes) exceeds the cache budget of {} bytes; not cached",
                url,
                bytes,
                self.cfg.max_bytes
            );
            return evicted;
        }

        while inner.total_bytes + bytes > self.cfg.max_bytes {
            let Some((key, entry)) = inner.entries.pop_lru() else {
                break;
            };
            inner.total_bytes = inner.total_bytes.saturating_sub(entry.bytes);
            inner.evictions += 1;
            self.untrack(&entry);
            log::debug!(
                "Evicted texture '{}' ({} bytes, last used at {})",
                key,
                entry.bytes,
                entry.last_used
            );
            evicted.push(key);
        }

        inner.clock += 1;
        let entry = CachedTexture {
            handle: self.tracker.as_ref().map(|t| t.track(&data)),
            data,
            bytes,
            last_used: inner.clock,
        };
        inner.total_bytes += bytes;
        inner.entries.put(url.to_string(), entry);
        evicted
    }

    pub fn remove(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.pop(url) {
            Some(entry) => {
                inner.total_bytes = inner.total_bytes.saturating_sub(entry.bytes);
                self.untrack(&entry);
                true
            }
            None => false,
        }
    }

    /// Drops every entry. Pixel data still referenced by materials stays alive.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        while let Some((_, entry)) = inner.entries.pop_lru() {
            self.untrack(&entry);
        }
        inner.total_bytes = 0;
        log::debug!("Cleared texture cache ({} entries)", count);
    }

    pub fn stats(&self) -> TextureCacheStats {
        let inner = self.inner.lock();
        TextureCacheStats {
            total_bytes: inner.total_bytes,
            entry_count: inner.entries.len(),
            max_bytes: self.cfg.max_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    /// Returns a texture for `url`, fetching and decoding on a miss.
    ///
    /// Concurrent misses for the same URL each fetch; whichever finishes
    /// last owns the cache entry.
    pub async fn load_texture<S: TextureSource>(
        &self,
        source: &S,
        url: &str,
        options: &TextureLoadOptions,
    ) -> Result<Texture> {
        if let Some(data) = self.get(url) {
            return Ok(Texture::new(data, options.sampling));
        }

        let bytes = source.fetch(url).await.map_err(|e| as_load_error(url, e))?;
        let data = TextureData::decode(url, &bytes).map_err(|e| Error::texture_load(url, e))?;
        let data = Arc::new(data);
        self.insert(url, Arc::clone(&data));
        log::debug!("Loaded texture '{}' ({}x{})", url, data.width(), data.height());
        Ok(Texture::new(data, options.sampling))
    }

    /// Loads each URL in turn; failures are logged and skipped. Returns the
    /// number of textures now available.
    pub async fn preload_textures<S, I>(&self, source: &S, urls: I, options: &TextureLoadOptions) -> usize
    where
        S: TextureSource,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut loaded = 0;
        for url in urls {
            match self.load_texture(source, url.as_ref(), options).await {
                Ok(_) => loaded += 1,
                Err(err) => log::warn!("Preload skipped: {}", err),
            }
        }
        loaded
    }

    fn untrack(&self, entry: &CachedTexture) {
        if let (Some(tracker), Some(handle)) = (&self.tracker, entry.handle) {
            tracker.untrack(handle);
        }
    }
}

fn as_load_error(url: &str, err: Error) -> Error {
    if err.is_texture_load() {
        err
    } else {
        Error::texture_load(url, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::texture::{SamplingParams, WrapMode};
    use image::{ImageBuffer, Rgba};

    fn data(label: &str, w: u32, h: u32) -> Arc<TextureData> {
        Arc::new(TextureData::from_rgba(label, w, h, vec![128; (w * h * 4) as usize]).unwrap())
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = ImageBuffer::<Rgba<u8>, _>::from_pixel(w, h, Rgba([200, 150, 100, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// 16x16 → 16*16*4*1.33 = 1361.92 → 1362 bytes each.
    fn small_cache(entries_that_fit: u64) -> TextureCache {
        TextureCache::new(TextureCacheConfig {
            max_bytes: 1362 * entries_that_fit,
            fallback_entry_bytes: 4 * 1024 * 1024,
        })
    }

    #[test]
    fn test_eviction_respects_budget_and_lru_order() {
        let cache = small_cache(3);
        assert!(cache.insert("a", data("a", 16, 16)).is_empty());
        assert!(cache.insert("b", data("b", 16, 16)).is_empty());
        assert!(cache.insert("c", data("c", 16, 16)).is_empty());

        // Touch "a" so "b" becomes the least recently used.
        assert!(cache.get("a").is_some());

        let evicted = cache.insert("d", data("d", 16, 16));
        assert_eq!(evicted, vec!["b".to_string()]);

        let evicted = cache.insert("e", data("e", 32, 16));
        assert_eq!(evicted, vec!["c".to_string(), "a".to_string()]);

        let stats = cache.stats();
        assert!(stats.total_bytes <= stats.max_bytes);
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.evictions, 3);
        assert!(cache.contains("d") && cache.contains("e"));
    }

    #[test]
    fn test_oversized_entry_is_not_cached() {
        let cache = small_cache(1);
        cache.insert("a", data("a", 16, 16));
        assert!(cache.insert("huge", data("huge", 64, 64)).is_empty());
        assert!(!cache.contains("huge"));
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_replacing_key_keeps_totals_consistent() {
        let cache = small_cache(4);
        cache.insert("a", data("a", 16, 16));
        cache.insert("a", data("a", 16, 16));
        assert_eq!(cache.stats().total_bytes, 1362);
        assert_eq!(cache.stats().entry_count, 1);
        assert!(cache.remove("a"));
        assert_eq!(cache.stats().total_bytes, 0);
    }

    #[test]
    fn test_disposed_entry_is_a_miss() {
        let cache = small_cache(2);
        let d = data("a", 16, 16);
        cache.insert("a", Arc::clone(&d));
        d.dispose().unwrap();
        assert!(cache.get("a").is_none());
        assert!(!cache.contains("a"));
        assert_eq!(cache.stats().total_bytes, 0);
    }

    #[test]
    fn test_tracker_follows_cache_membership() {
        let tracker = Arc::new(ResourceManager::new(ResourceConfig::default()));
        let cache = TextureCache::with_tracker(
            TextureCacheConfig {
                max_bytes: 1362,
                fallback_entry_bytes: 1,
            },
            Arc::clone(&tracker),
        );
        let a = data("a", 16, 16);
        let b = data("b", 16, 16);
        cache.insert("a", Arc::clone(&a));
        assert_eq!(tracker.tracked_count(), 1);
        cache.insert("b", Arc::clone(&b));
        assert_eq!(tracker.tracked_count(), 1);
        cache.clear();
        assert_eq!(tracker.tracked_count(), 0);
        assert!(!a.is_disposed());
    }

    #[tokio::test]
    async fn test_load_texture_hits_cache_on_second_call() {
        let cache = TextureCache::new(TextureCacheConfig::default());
        let source = MemorySource::new();
        source.insert("textures/oak/diffuse.png", png(8, 8));

        let opts = TextureLoadOptions::default();
        let first = cache.load_texture(&source, "textures/oak/diffuse.png", &opts).await.unwrap();
        let repeat = TextureLoadOptions {
            sampling: SamplingParams::default().with_repeat(3.0, 3.0).with_wrap(WrapMode::Clamp),
        };
        let second = cache.load_texture(&source, "textures/oak/diffuse.png", &repeat).await.unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert!(first.shares_pixels_with(&second));
        assert_eq!(first.sampling.repeat, [1.0, 1.0]);
        assert_eq!(second.sampling.wrap, WrapMode::Clamp);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_texture_load_error() {
        let cache = TextureCache::new(TextureCacheConfig::default());
        let source = MemorySource::new();
        source.insert("broken.png", b"garbage".to_vec());

        let err = cache
            .load_texture(&source, "missing.png", &TextureLoadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_texture_load());
        let err = cache
            .load_texture(&source, "broken.png", &TextureLoadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_texture_load());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_preload_skips_failures() {
        let cache = TextureCache::new(TextureCacheConfig::default());
        let source = MemorySource::new();
        source.insert("a.png", png(4, 4));
        source.insert("c.png", png(4, 4));

        let loaded = cache
            .preload_textures(&source, ["a.png", "b.png", "c.png"], &TextureLoadOptions::default())
            .await;
        assert_eq!(loaded, 2);
        assert!(cache.contains("a.png") && cache.contains("c.png"));
        assert!(!cache.contains("b.png"));
    }
}
