//! Cache Store Module
//!
//! The sharded cache coordinator: routes keys to shards, tracks approximate
//! memory usage, fans eviction out across shards, and owns the memory monitor.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::cache::router::shard_index;
use crate::cache::shard::Shard;
use crate::cache::stats::{CacheStats, StatsCounters};
use crate::config::Config;
use crate::memory::MemoryProbe;
use crate::tasks::{spawn_memory_monitor, EvictionPolicy, MonitorHandle};

// == Sharded Cache ==
/// Sharded key-value cache with CLOCK eviction.
///
/// Operations on different shards never contend. The memory counter is
/// updated atomically outside the shard locks, so it may briefly lag the sum
/// of live entry sizes under concurrent writers.
#[derive(Debug)]
pub struct ShardedCache {
    shards: Box<[Shard]>,
    /// Approximate bytes held by live keys and values
    memory_usage: AtomicI64,
    stats: StatsCounters,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl ShardedCache {
    // == Constructor ==
    /// Creates a cache with `shard_count` shards and no memory monitor.
    ///
    /// A shard count of zero is treated as one.
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Shard::new()).collect();
        Self {
            shards,
            memory_usage: AtomicI64::new(0),
            stats: StatsCounters::new(),
            monitor: Mutex::new(None),
        }
    }

    /// Creates a cache and starts its memory monitor on the current runtime.
    pub fn start(config: &Config, probe: Arc<dyn MemoryProbe>) -> Arc<Self> {
        let cache = Arc::new(Self::new(config.shard_count));
        let handle = spawn_memory_monitor(
            Arc::downgrade(&cache),
            EvictionPolicy::from_config(config),
            probe,
        );
        *cache.monitor.lock() = Some(handle);
        cache
    }

    fn shard(&self, key: &str) -> &Shard {
        &self.shards[shard_index(key, self.shards.len())]
    }

    // == Get ==
    /// Looks up `key`, marking it referenced when found.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self.shard(key).get(key);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Set ==
    /// Inserts or updates `key`. Never evicts; capacity is enforced only by
    /// the memory monitor.
    pub fn set(&self, key: String, value: String) {
        let delta = self.shard(&key).upsert(key, value);
        if delta != 0 {
            self.memory_usage.fetch_add(delta, Ordering::Relaxed);
        }
    }

    // == Evict Batch ==
    /// Spreads `total` evictions across shards and returns how many happened.
    ///
    /// Each shard is asked for `max(1, total / shard_count)` entries; shards
    /// are visited in order until each has been visited once or `total` is
    /// reached. Never evicts more than `total`.
    pub fn evict_batch(&self, total: usize) -> usize {
        let per_shard = (total / self.shards.len()).max(1);
        let mut evicted = 0;

        for shard in self.shards.iter() {
            if evicted >= total {
                break;
            }
            let outcome = shard.evict(per_shard);
            if outcome.entries > 0 {
                self.memory_usage
                    .fetch_sub(outcome.bytes as i64, Ordering::Relaxed);
                self.stats.record_evictions(outcome.entries);
                evicted += outcome.entries;
            }
        }

        evicted
    }

    // == Shutdown ==
    /// Stops the memory monitor and waits for it to exit.
    ///
    /// Entries are left in place. Calling this more than once, or on a cache
    /// built without a monitor, does nothing.
    pub async fn shutdown(&self) {
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
            info!("Cache memory monitor shut down");
        }
    }

    // == Observers ==
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Approximate bytes held by keys and values.
    pub fn memory_usage(&self) -> i64 {
        self.memory_usage.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Exact sum of entry sizes, taken shard by shard.
    pub fn total_entry_size(&self) -> u64 {
        self.shards.iter().map(Shard::total_size).sum()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len(), self.memory_usage())
    }

    pub fn is_monitored(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use crate::memory::MemorySample;

    struct PressureProbe;

    impl MemoryProbe for PressureProbe {
        fn sample(&self) -> Option<MemorySample> {
            Some(MemorySample::new(99, 100))
        }
    }

    #[test]
    fn test_set_and_get() {
        let cache = ShardedCache::new(16);

        cache.set("a".to_string(), "1".to_string());

        assert_eq!(cache.get("a").as_deref(), Some("1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let cache = ShardedCache::new(16);
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_zero_shards_normalized() {
        let cache = ShardedCache::new(0);
        assert_eq!(cache.shard_count(), 1);
        cache.set("k".to_string(), "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_update_memory_delta() {
        let cache = ShardedCache::new(16);

        cache.set("a".to_string(), "1".to_string());
        assert_eq!(cache.memory_usage(), 2);

        cache.set("a".to_string(), "22".to_string());
        assert_eq!(cache.memory_usage(), 3);
        assert_eq!(cache.get("a").as_deref(), Some("22"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_batch_empty_cache() {
        let cache = ShardedCache::new(8);
        assert_eq!(cache.evict_batch(10), 0);
        assert_eq!(cache.evict_batch(0), 0);
    }

    #[test]
    fn test_evict_batch_zero_request() {
        let cache = ShardedCache::new(1);
        cache.set("a".to_string(), "1".to_string());
        assert_eq!(cache.evict_batch(0), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_single_shard_evicts_in_insertion_order() {
        let cache = ShardedCache::new(1);
        for i in 0..10 {
            cache.set(format!("key_{}", i), format!("value_{}", i));
        }

        let evicted = cache.evict_batch(4);

        assert_eq!(evicted, 4);
        assert_eq!(cache.len(), 6);
        for i in 0..4 {
            assert_eq!(cache.get(&format!("key_{}", i)), None);
        }
        for i in 4..10 {
            assert_eq!(cache.get(&format!("key_{}", i)), Some(format!("value_{}", i)));
        }
    }

    #[test]
    fn test_eviction_updates_accounting() {
        let cache = ShardedCache::new(4);
        for i in 0..40 {
            cache.set(format!("key_{:02}", i), "value".to_string());
        }

        let evicted = cache.evict_batch(12);

        assert!(evicted <= 12);
        assert_eq!(cache.len(), 40 - evicted);
        assert_eq!(cache.memory_usage() as u64, cache.total_entry_size());
        assert_eq!(cache.stats().evictions, evicted as u64);
    }

    #[test]
    fn test_evict_batch_small_request_many_shards() {
        let cache = ShardedCache::new(64);
        for i in 0..500 {
            cache.set(format!("key_{}", i), "v".to_string());
        }

        assert!(cache.evict_batch(3) <= 3);
    }

    #[test]
    fn test_stats_hits_and_misses() {
        let cache = ShardedCache::new(4);
        cache.set("a".to_string(), "1".to_string());
        cache.get("a");
        cache.get("b");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.memory_usage, 2);
    }

    #[test]
    fn test_concurrent_writers_keep_counter_exact() {
        let cache = Arc::new(ShardedCache::new(8));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("key_{}", i % 100);
                        cache.set(key.clone(), format!("{}-{}", t, i));
                        let _ = cache.get(&key);
                        if i % 50 == 0 {
                            cache.evict_batch(8);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.memory_usage() as u64, cache.total_entry_size());
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let config = Config {
            shard_count: 1,
            check_interval: Duration::from_millis(20),
            eviction_batch_size: 5,
            ..Config::default()
        };
        let cache = ShardedCache::start(&config, Arc::new(PressureProbe));
        assert!(cache.is_monitored());

        cache.shutdown().await;
        assert!(!cache.is_monitored());

        for i in 0..10 {
            cache.set(format!("key_{}", i), "value".to_string());
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.len(), 10);

        // Second shutdown is a no-op
        cache.shutdown().await;
        assert_eq!(cache.get("key_0").as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_started_cache_evicts_under_pressure() {
        let config = Config {
            shard_count: 1,
            check_interval: Duration::from_millis(20),
            eviction_batch_size: 5,
            ..Config::default()
        };
        let cache = ShardedCache::start(&config, Arc::new(PressureProbe));
        for i in 0..100 {
            cache.set(format!("key_{}", i), "value".to_string());
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(cache.len() < 100);
        assert_eq!(cache.memory_usage() as u64, cache.total_entry_size());
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_check_interval_keeps_monitor_alive() {
        let config = Config {
            shard_count: 1,
            check_interval: Duration::ZERO,
            eviction_batch_size: 5,
            ..Config::default()
        };
        let cache = ShardedCache::start(&config, Arc::new(PressureProbe));
        for i in 0..100 {
            cache.set(format!("key_{}", i), "value".to_string());
        }

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.is_monitored());
        assert!(cache.len() < 100);
        cache.shutdown().await;
    }
}
