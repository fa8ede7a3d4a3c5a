// src/resource_manager.rs
//! Resource lifecycle registry.
//! - Handles: compact u32 handles with generation
//! - Entries are `Weak`: the registry never keeps a resource alive
//! - `cleanup()` is a liveness-checked sweep; entries leave the registry
//!   before they are disposed, so a resource is never disposed twice by it
//! - Debounced cleanup driven by `tick(now)`
//! - Low-memory handling: sweep, drop the texture cache, cycle the GPU context

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::config::ResourceConfig;
use crate::error::{Error, Result};
use crate::texture_cache::TextureCache;

// ---------- Disposable resources ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Group,
    Geometry,
    Material,
    Texture,
}

/// Anything that owns GPU memory and can be released explicitly.
pub trait Disposable: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Releases GPU memory. A second call returns `Error::ResourceDisposal`.
    fn dispose(&self) -> Result<()>;

    fn is_disposed(&self) -> bool;
}

/// One-shot disposed flag.
#[derive(Debug, Default)]
pub struct DisposeFlag(AtomicBool);

impl DisposeFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Sets the flag; errors if it was already set.
    pub fn mark(&self, what: &str) -> Result<()> {
        if self.0.swap(true, Ordering::AcqRel) {
            return Err(Error::ResourceDisposal(format!("{what} already disposed")));
        }
        Ok(())
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// GPU-side counterpart that can be freed eagerly.
pub trait GpuRelease {
    fn release(self);
}

/// Lazily-populated GPU residency slot.
pub struct GpuSlot<T>(Mutex<Option<T>>);

impl<T> Default for GpuSlot<T> {
    fn default() -> Self {
        Self(Mutex::new(None))
    }
}

impl<T> std::fmt::Debug for GpuSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpuSlot(resident: {})", self.0.lock().is_some())
    }
}

impl<T: GpuRelease> GpuSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resident(&self) -> bool {
        self.0.lock().is_some()
    }

    /// Installs a GPU object, releasing any previous one.
    pub fn set(&self, value: T) {
        if let Some(old) = self.0.lock().replace(value) {
            old.release();
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.0.lock().as_ref().map(f)
    }

    /// Locks the slot and borrows the GPU object, if resident.
    pub fn get(&self) -> Option<MappedMutexGuard<'_, T>> {
        MutexGuard::try_map(self.0.lock(), |slot| slot.as_mut()).ok()
    }

    /// Frees the GPU object if present; returns whether one was freed.
    pub fn release(&self) -> bool {
        match self.0.lock().take() {
            Some(value) => {
                value.release();
                true
            }
            None => false,
        }
    }
}

/// Objects whose GPU copy can be dropped and re-uploaded later.
pub trait GpuResident: Send + Sync {
    fn release_gpu(&self);
}

/// Owner of the rendering context (lose/restore under memory pressure).
pub trait ContextController: Send + Sync {
    fn lose_context(&self);
    fn restore_context(&self);
}

// ---------- Handle type ----------
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Handle(u32);

impl Handle {
    fn new(index: u32, gen: u8) -> Self {
        let v = (index & 0x00FF_FFFF) | ((gen as u32) << 24);
        Handle(v)
    }
    fn index(self) -> usize {
        (self.0 & 0x00FF_FFFF) as usize
    }
    fn gen(self) -> u8 {
        ((self.0 >> 24) & 0xFF) as u8
    }
    pub fn invalid() -> Self {
        Handle(u32::MAX)
    }
    pub fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

// ---------- Internal records ----------
struct Entry {
    resource: Weak<dyn Disposable>,
    addr: usize,
    kind: ResourceKind,
}

#[derive(Default)]
struct Schedule {
    /// Deadline of the pending debounced sweep.
    cleanup_at: Option<Duration>,
    restore_context: bool,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    pub tracked_total: u64,
    pub disposed_total: u64,
    pub sweeps: u64,
    pub low_memory_events: u64,
}

// ---------- ResourceManager ----------
pub struct ResourceManager {
    cfg: ResourceConfig,

    // slab and generations
    slab: RwLock<Vec<Option<Entry>>>,
    gens: RwLock<Vec<u8>>,
    free: Mutex<Vec<usize>>,

    // allocation address -> slot, so a resource is tracked at most once
    by_addr: Mutex<HashMap<usize, usize>>,

    schedule: Mutex<Schedule>,
    texture_cache: RwLock<Option<Weak<TextureCache>>>,
    context: RwLock<Option<Weak<dyn ContextController>>>,
    stats: Mutex<LifecycleStats>,
}

impl ResourceManager {
    pub fn new(cfg: ResourceConfig) -> Self {
        Self {
            cfg,
            slab: RwLock::new(Vec::new()),
            gens: RwLock::new(Vec::new()),
            free: Mutex::new(Vec::new()),
            by_addr: Mutex::new(HashMap::new()),
            schedule: Mutex::new(Schedule::default()),
            texture_cache: RwLock::new(None),
            context: RwLock::new(None),
            stats: Mutex::new(LifecycleStats::default()),
        }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.cfg
    }

    /// Cleared (not disposed) by `handle_low_memory`.
    pub fn attach_texture_cache(&self, cache: &Arc<TextureCache>) {
        *self.texture_cache.write() = Some(Arc::downgrade(cache));
    }

    pub fn attach_context<C: ContextController + 'static>(&self, context: &Arc<C>) {
        let weak: Weak<C> = Arc::downgrade(context);
        *self.context.write() = Some(weak as Weak<dyn ContextController>);
    }

    // ---------- Public API ----------

    /// Registers a resource. Tracking the same live object again returns
    /// its existing handle.
    pub fn track<R: Disposable + 'static>(&self, resource: &Arc<R>) -> Handle {
        let addr = Arc::as_ptr(resource) as *const () as usize;
        let mut by_addr = self.by_addr.lock();

        if let Some(&idx) = by_addr.get(&addr) {
            let slab = self.slab.read();
            if let Some(Some(entry)) = slab.get(idx) {
                if entry.resource.strong_count() > 0 {
                    return Handle::new(idx as u32, self.gens.read()[idx]);
                }
            }
        }

        let weak: Weak<R> = Arc::downgrade(resource);
        let entry = Entry {
            resource: weak as Weak<dyn Disposable>,
            addr,
            kind: resource.kind(),
        };

        // allocate slot
        let idx = {
            let mut slab = self.slab.write();
            let mut gens = self.gens.write();
            let index = match self.free.lock().pop() {
                Some(i) => i,
                None => {
                    slab.push(None);
                    gens.push(0u8);
                    slab.len() - 1
                }
            };
            gens[index] = gens[index].wrapping_add(1);
            slab[index] = Some(entry);
            index
        };

        by_addr.insert(addr, idx);
        self.stats.lock().tracked_total += 1;
        Handle::new(idx as u32, self.gens.read()[idx])
    }

    /// Removes a handle from the registry without disposing the resource.
    /// Stale handles return `false`.
    pub fn untrack(&self, h: Handle) -> bool {
        self.take_entry(h).is_some()
    }

    /// Untracks, then disposes. Disposal errors are swallowed.
    pub fn release(&self, h: Handle) -> bool {
        match self.take_entry(h).and_then(|e| e.resource.upgrade()) {
            Some(resource) => {
                let disposed = dispose_quietly(resource.as_ref());
                if disposed {
                    self.stats.lock().disposed_total += 1;
                }
                disposed
            }
            None => false,
        }
    }

    pub fn is_tracked(&self, h: Handle) -> bool {
        if !h.is_valid() {
            return false;
        }
        let idx = h.index();
        let slab = self.slab.read();
        let gens = self.gens.read();
        idx < slab.len() && gens[idx] == h.gen() && slab[idx].is_some()
    }

    /// Live tracked resources.
    pub fn tracked_count(&self) -> usize {
        self.slab
            .read()
            .iter()
            .flatten()
            .filter(|e| e.resource.strong_count() > 0)
            .count()
    }

    pub fn tracked_count_of(&self, kind: ResourceKind) -> usize {
        self.slab
            .read()
            .iter()
            .flatten()
            .filter(|e| e.kind == kind && e.resource.strong_count() > 0)
            .count()
    }

    /// Drops entries whose resources have already been freed.
    pub fn prune(&self) -> usize {
        let dead: Vec<usize> = self
            .slab
            .read()
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e {
                Some(e) if e.resource.strong_count() == 0 => Some(i),
                _ => None,
            })
            .collect();
        for &idx in &dead {
            self.take_slot(idx);
        }
        dead.len()
    }

    /// Disposes every live tracked resource and empties the registry.
    /// Returns how many resources were disposed.
    pub fn cleanup(&self) -> usize {
        // Untrack everything first; disposal then runs without locks held.
        let entries: Vec<Entry> = {
            let mut slab = self.slab.write();
            let mut gens = self.gens.write();
            let mut free = self.free.lock();
            let mut out = Vec::new();
            for (idx, slot) in slab.iter_mut().enumerate() {
                if let Some(entry) = slot.take() {
                    gens[idx] = gens[idx].wrapping_add(1);
                    free.push(idx);
                    out.push(entry);
                }
            }
            out
        };
        self.by_addr.lock().clear();

        // Groups first: they dispose their children themselves.
        let mut live: Vec<(ResourceKind, Arc<dyn Disposable>)> = entries
            .into_iter()
            .filter_map(|e| e.resource.upgrade().map(|r| (e.kind, r)))
            .collect();
        live.sort_by_key(|(kind, _)| *kind != ResourceKind::Group);

        let mut disposed = 0;
        for (_, resource) in &live {
            if resource.is_disposed() {
                continue;
            }
            if dispose_quietly(resource.as_ref()) {
                disposed += 1;
            }
        }

        {
            let mut stats = self.stats.lock();
            stats.sweeps += 1;
            stats.disposed_total += disposed as u64;
        }
        log::debug!("Resource cleanup disposed {} resource(s)", disposed);
        disposed
    }

    /// Requests a cleanup `cleanup_delay` after `now`. Repeated requests
    /// inside the window push the deadline out and collapse into one sweep.
    pub fn schedule_cleanup(&self, now: Duration) {
        self.schedule.lock().cleanup_at = Some(now + self.cfg.cleanup_delay);
    }

    pub fn cleanup_pending(&self) -> bool {
        self.schedule.lock().cleanup_at.is_some()
    }

    /// Drives deferred work: context restoration, pruning of freed entries
    /// and debounced cleanup.
    /// Returns the number of resources disposed on this tick.
    pub fn tick(&self, now: Duration) -> usize {
        let (restore, due) = {
            let mut s = self.schedule.lock();
            let restore = std::mem::take(&mut s.restore_context);
            let due = matches!(s.cleanup_at, Some(at) if now >= at);
            if due {
                s.cleanup_at = None;
            }
            (restore, due)
        };

        if restore {
            if let Some(ctx) = self.context() {
                log::info!("Restoring rendering context");
                ctx.restore_context();
            }
        }
        let pruned = self.prune();
        if pruned > 0 {
            log::debug!("Pruned {} dead registry slot(s)", pruned);
        }
        if due {
            self.cleanup()
        } else {
            0
        }
    }

    /// Aggressive cleanup: sweep, clear the texture cache, lose the
    /// rendering context now and restore it on the next `tick`.
    pub fn handle_low_memory(&self) -> usize {
        log::warn!("Low memory: releasing GPU resources");
        self.stats.lock().low_memory_events += 1;

        let disposed = self.cleanup();

        let cache = self.texture_cache.read().as_ref().and_then(Weak::upgrade);
        if let Some(cache) = cache {
            cache.clear();
        }
        if let Some(ctx) = self.context() {
            ctx.lose_context();
            self.schedule.lock().restore_context = true;
        }
        disposed
    }

    /// Page visibility hook: hidden pages get a debounced sweep.
    pub fn on_visibility_change(&self, hidden: bool, now: Duration) {
        if hidden {
            self.schedule_cleanup(now);
        }
    }

    /// Page unload hook.
    pub fn on_unload(&self) -> usize {
        self.schedule.lock().cleanup_at = None;
        self.cleanup()
    }

    pub fn stats(&self) -> LifecycleStats {
        *self.stats.lock()
    }

    // ---------- Internal helpers ----------

    fn context(&self) -> Option<Arc<dyn ContextController>> {
        self.context.read().as_ref().and_then(Weak::upgrade)
    }

    fn take_entry(&self, h: Handle) -> Option<Entry> {
        if !h.is_valid() {
            return None;
        }
        let idx = h.index();
        {
            let gens = self.gens.read();
            if idx >= gens.len() || gens[idx] != h.gen() {
                return None;
            }
        }
        self.take_slot(idx)
    }

    fn take_slot(&self, idx: usize) -> Option<Entry> {
        let entry = {
            let mut slab = self.slab.write();
            let entry = slab.get_mut(idx)?.take()?;
            let mut gens = self.gens.write();
            gens[idx] = gens[idx].wrapping_add(1);
            self.free.lock().push(idx);
            entry
        };
        let mut by_addr = self.by_addr.lock();
        if by_addr.get(&entry.addr) == Some(&idx) {
            by_addr.remove(&entry.addr);
        }
        Some(entry)
    }
}

/// Best-effort disposal; already-disposed resources are not an error here.
fn dispose_quietly(resource: &dyn Disposable) -> bool {
    match resource.dispose() {
        Ok(()) => true,
        Err(err) => {
            log::debug!("Ignoring {:?} disposal error: {}", resource.kind(), err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Dummy {
        kind: ResourceKind,
        flag: DisposeFlag,
        calls: AtomicUsize,
    }

    impl Dummy {
        fn new(kind: ResourceKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                flag: DisposeFlag::new(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Disposable for Dummy {
        fn kind(&self) -> ResourceKind {
            self.kind
        }
        fn dispose(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.flag.mark("dummy")
        }
        fn is_disposed(&self) -> bool {
            self.flag.is_set()
        }
    }

    #[derive(Default)]
    struct Ctx {
        lost: AtomicUsize,
        restored: AtomicUsize,
    }

    impl ContextController for Ctx {
        fn lose_context(&self) {
            self.lost.fetch_add(1, Ordering::SeqCst);
        }
        fn restore_context(&self) {
            self.restored.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager() -> ResourceManager {
        ResourceManager::new(ResourceConfig::default())
    }

    #[test]
    fn test_handle_generation() {
        let h = Handle::new(5, 3);
        assert_eq!(h.index(), 5);
        assert_eq!(h.gen(), 3);
        assert!(!Handle::invalid().is_valid());
    }

    #[test]
    fn test_track_is_idempotent_per_object() {
        let rm = manager();
        let a = Dummy::new(ResourceKind::Material);
        let h1 = rm.track(&a);
        let h2 = rm.track(&a);
        assert_eq!(h1, h2);
        assert_eq!(rm.tracked_count(), 1);
    }

    #[test]
    fn test_untrack_invalidates_handle_and_skips_disposal() {
        let rm = manager();
        let a = Dummy::new(ResourceKind::Geometry);
        let h = rm.track(&a);
        assert!(rm.untrack(h));
        assert!(!rm.untrack(h));
        assert!(!rm.is_tracked(h));
        assert_eq!(rm.cleanup(), 0);
        assert!(!a.is_disposed());

        // Slot reuse bumps the generation.
        let b = Dummy::new(ResourceKind::Geometry);
        let h2 = rm.track(&b);
        assert_eq!(h2.index(), h.index());
        assert_ne!(h2, h);
    }

    #[test]
    fn test_cleanup_disposes_each_once() {
        let rm = manager();
        let a = Dummy::new(ResourceKind::Texture);
        let b = Dummy::new(ResourceKind::Group);
        rm.track(&a);
        rm.track(&b);
        assert_eq!(rm.cleanup(), 2);
        assert_eq!(rm.cleanup(), 0);
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rm.tracked_count(), 0);
        assert_eq!(rm.stats().sweeps, 2);
    }

    #[test]
    fn test_registry_does_not_keep_resources_alive() {
        let rm = manager();
        let h = {
            let a = Dummy::new(ResourceKind::Material);
            rm.track(&a)
        };
        assert_eq!(rm.tracked_count(), 0);
        assert!(rm.is_tracked(h));
        assert_eq!(rm.prune(), 1);
        assert!(!rm.is_tracked(h));
    }

    #[test]
    fn test_already_disposed_is_swallowed() {
        let rm = manager();
        let a = Dummy::new(ResourceKind::Material);
        a.dispose().unwrap();
        let h = rm.track(&a);
        assert!(!rm.release(h));
        assert_eq!(rm.cleanup(), 0);
    }

    #[test]
    fn test_schedule_cleanup_is_debounced() {
        let rm = manager();
        let a = Dummy::new(ResourceKind::Geometry);
        rm.track(&a);

        let t0 = Duration::from_millis(1_000);
        rm.schedule_cleanup(t0);
        rm.schedule_cleanup(t0 + Duration::from_millis(50));
        assert_eq!(rm.tick(t0 + Duration::from_millis(120)), 0);
        assert!(rm.cleanup_pending());
        assert_eq!(rm.tick(t0 + Duration::from_millis(150)), 1);
        assert!(!rm.cleanup_pending());
        assert_eq!(rm.stats().sweeps, 1);
    }

    #[test]
    fn test_low_memory_cycles_context() {
        let rm = manager();
        let ctx = Arc::new(Ctx::default());
        rm.attach_context(&ctx);
        let a = Dummy::new(ResourceKind::Texture);
        rm.track(&a);

        assert_eq!(rm.handle_low_memory(), 1);
        assert_eq!(ctx.lost.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.restored.load(Ordering::SeqCst), 0);
        rm.tick(Duration::ZERO);
        assert_eq!(ctx.restored.load(Ordering::SeqCst), 1);
        rm.tick(Duration::ZERO);
        assert_eq!(ctx.restored.load(Ordering::SeqCst), 1);
        assert_eq!(rm.stats().low_memory_events, 1);
    }

    #[test]
    fn test_tick_prunes_freed_entries() {
        let rm = manager();
        let kept = Dummy::new(ResourceKind::Material);
        let kept_handle = rm.track(&kept);
        let h = {
            let a = Dummy::new(ResourceKind::Geometry);
            rm.track(&a)
        };
        assert_eq!(rm.tick(Duration::ZERO), 0);
        assert!(!rm.is_tracked(h));
        assert!(rm.is_tracked(kept_handle));
    }

    struct Buffer(Arc<AtomicUsize>);

    impl GpuRelease for Buffer {
        fn release(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_gpu_slot_replace_and_release() {
        let freed = Arc::new(AtomicUsize::new(0));
        let slot = GpuSlot::new();
        assert_eq!(format!("{slot:?}"), "GpuSlot(resident: false)");
        slot.set(Buffer(Arc::clone(&freed)));
        slot.set(Buffer(Arc::clone(&freed)));
        assert_eq!(freed.load(Ordering::SeqCst), 1);
        assert_eq!(format!("{slot:?}"), "GpuSlot(resident: true)");
        assert!(slot.get().is_some());
        assert!(slot.release());
        assert!(!slot.release());
        assert_eq!(freed.load(Ordering::SeqCst), 2);
        assert!(!slot.is_resident());
    }

    #[test]
    fn test_visibility_hidden_schedules_sweep() {
        let rm = manager();
        rm.on_visibility_change(false, Duration::ZERO);
        assert!(!rm.cleanup_pending());
        rm.on_visibility_change(true, Duration::ZERO);
        assert!(rm.cleanup_pending());
    }
}
