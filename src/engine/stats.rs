// Engine counters: store hit rates, network traffic and generation throughput.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub store_hits: u64,
    pub store_misses: u64,
    pub probes: u64,
    pub full_fetches: u64,
    pub cache_fills: u64,
    pub generated: u64,
}

impl StatsSnapshot {
    pub fn store_hit_rate(&self) -> f64 {
        let lookups = self.store_hits + self.store_misses;
        if lookups > 0 {
            self.store_hits as f64 / lookups as f64
        } else {
            0.0
        }
    }
}

pub struct EngineStats {
    store_hits: AtomicU64,
    store_misses: AtomicU64,
    probes: AtomicU64,
    full_fetches: AtomicU64,
    cache_fills: AtomicU64,
    generated: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            store_hits: AtomicU64::new(0),
            store_misses: AtomicU64::new(0),
            probes: AtomicU64::new(0),
            full_fetches: AtomicU64::new(0),
            cache_fills: AtomicU64::new(0),
            generated: AtomicU64::new(0),
        }
    }

    pub fn record_store_lookup(&self, hit: bool) {
        if hit {
            self.store_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.store_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_full_fetch(&self) {
        self.full_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// A background fetch was written back into the store.
    pub fn record_cache_fill(&self) {
        self.cache_fills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            store_hits: self.store_hits.load(Ordering::Relaxed),
            store_misses: self.store_misses.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            full_fetches: self.full_fetches.load(Ordering::Relaxed),
            cache_fills: self.cache_fills.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = EngineStats::new();
        stats.record_store_lookup(true);
        stats.record_store_lookup(false);
        stats.record_store_lookup(false);
        stats.record_store_lookup(true);
        stats.record_probe();
        stats.record_full_fetch();
        stats.record_cache_fill();

        let snap = stats.snapshot();
        assert_eq!(snap.store_hits, 2);
        assert_eq!(snap.store_misses, 2);
        assert_eq!(snap.probes, 1);
        assert_eq!(snap.cache_fills, 1);
        assert_eq!(snap.generated, 0);
        assert!((snap.store_hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
