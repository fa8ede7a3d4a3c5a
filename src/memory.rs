// src/memory.rs
//! Periodic memory-pressure polling.
//!
//! A probe reports used/limit; the monitor samples it at most once per
//! interval and reports pressure above the threshold. Hosts without
//! memory introspection simply have no probe.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ResourceConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySample {
    pub used: u64,
    pub limit: u64,
}

impl MemorySample {
    pub fn ratio(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            self.used as f64 / self.limit as f64
        }
    }
}

pub trait MemoryProbe: Send {
    /// `None` when the host cannot report memory usage.
    fn sample(&mut self) -> Option<MemorySample>;
}

/// System RAM via `sysinfo`.
#[cfg(not(target_arch = "wasm32"))]
pub struct SystemMemoryProbe {
    system: sysinfo::System,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: sysinfo::System::new(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl MemoryProbe for SystemMemoryProbe {
    fn sample(&mut self) -> Option<MemorySample> {
        self.system.refresh_memory();
        let limit = self.system.total_memory();
        (limit > 0).then(|| MemorySample {
            used: self.system.used_memory(),
            limit,
        })
    }
}

/// Host-supplied readings (e.g. JS heap figures pushed from the page).
/// Clones share the latest reading.
#[derive(Debug, Clone, Default)]
pub struct ReportedMemory {
    latest: Arc<Mutex<Option<MemorySample>>>,
}

impl ReportedMemory {
    pub fn report(&self, used: u64, limit: u64) {
        *self.latest.lock() = Some(MemorySample { used, limit });
    }
}

impl MemoryProbe for ReportedMemory {
    fn sample(&mut self) -> Option<MemorySample> {
        *self.latest.lock()
    }
}

pub struct MemoryMonitor {
    probe: Box<dyn MemoryProbe>,
    interval: Duration,
    threshold: f64,
    last_poll: Option<Duration>,
}

impl MemoryMonitor {
    pub fn new(probe: Box<dyn MemoryProbe>, cfg: &ResourceConfig) -> Self {
        Self {
            probe,
            interval: cfg.memory_poll_interval,
            threshold: cfg.memory_threshold,
            last_poll: None,
        }
    }

    /// Samples when the interval has elapsed. Returns the sample only if it
    /// is over the threshold.
    pub fn poll(&mut self, now: Duration) -> Option<MemorySample> {
        if let Some(last) = self.last_poll {
            if now.saturating_sub(last) < self.interval {
                return None;
            }
        }
        self.last_poll = Some(now);

        let sample = self.probe.sample()?;
        if sample.ratio() > self.threshold {
            log::warn!(
                "Memory pressure: {:.1}% of {} bytes in use",
                sample.ratio() * 100.0,
                sample.limit
            );
            Some(sample)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<MemorySample>);

    impl MemoryProbe for Fixed {
        fn sample(&mut self) -> Option<MemorySample> {
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            }
        }
    }

    fn sample(used: u64) -> MemorySample {
        MemorySample { used, limit: 100 }
    }

    #[test]
    fn test_ratio() {
        assert_eq!(sample(25).ratio(), 0.25);
        assert_eq!(MemorySample { used: 5, limit: 0 }.ratio(), 0.0);
    }

    #[test]
    fn test_poll_respects_interval_and_threshold() {
        let cfg = ResourceConfig::default();
        let mut m = MemoryMonitor::new(Box::new(Fixed(vec![sample(50), sample(90), sample(95)])), &cfg);

        assert!(m.poll(Duration::ZERO).is_none()); // 50%
        assert!(m.poll(Duration::from_secs(5)).is_none()); // too early
        assert_eq!(m.poll(Duration::from_secs(10)), Some(sample(90)));
        assert_eq!(m.poll(Duration::from_secs(20)), Some(sample(95)));
        assert!(m.poll(Duration::from_secs(30)).is_none()); // probe exhausted
    }

    #[test]
    fn test_reported_memory() {
        let reported = ReportedMemory::default();
        let mut m = MemoryMonitor::new(Box::new(reported.clone()), &ResourceConfig::default());
        assert!(m.poll(Duration::ZERO).is_none());

        reported.report(81, 100);
        assert!(m.poll(Duration::from_secs(10)).is_some());
    }
}
