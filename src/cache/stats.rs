//! Cache Statistics Module
//!
//! Lock-free hit/miss/eviction counters and the snapshot served by `/stats`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found their key
    pub hits: u64,
    /// Number of lookups that missed
    pub misses: u64,
    /// Number of entries removed by CLOCK sweeps
    pub evictions: u64,
    /// Current number of entries across all shards
    pub total_entries: usize,
    /// Approximate bytes held by keys and values
    pub memory_usage: i64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

// == Stats Counters ==
/// Counters updated concurrently by every shard operation.
#[derive(Debug, Default)]
pub struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Builds a snapshot from the counters plus the cache-wide gauges.
    pub fn snapshot(&self, total_entries: usize, memory_usage: i64) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            total_entries,
            memory_usage,
            hit_rate,
        }
    }
}
