//! Memory Monitor Task
//!
//! Background task that samples process memory on a fixed interval and asks
//! the cache to evict when usage crosses the configured threshold.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::ShardedCache;
use crate::config::Config;
use crate::memory::MemoryProbe;

/// Shortest wake period; `tokio::time::interval` rejects zero.
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

// == Eviction Policy ==
/// When and how hard the monitor evicts.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionPolicy {
    /// Ratio above which a cycle evicts
    pub memory_threshold: f64,
    /// Ratio above which the batch is doubled
    pub severity_ratio: f64,
    /// Entries requested per triggered cycle
    pub batch_size: usize,
    /// Wake period
    pub check_interval: Duration,
}

impl EvictionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            memory_threshold: config.memory_threshold,
            severity_ratio: config.severity_ratio,
            batch_size: config.eviction_batch_size,
            check_interval: config.check_interval,
        }
    }

    /// Wake period actually used by the monitor, never zero.
    pub fn wake_period(&self) -> Duration {
        self.check_interval.max(MIN_CHECK_INTERVAL)
    }

    /// Number of entries to evict at `ratio`, or `None` if under threshold.
    pub fn batch_for(&self, ratio: f64) -> Option<usize> {
        if ratio <= self.memory_threshold {
            return None;
        }
        if ratio > self.severity_ratio {
            Some(self.batch_size.saturating_mul(2))
        } else {
            Some(self.batch_size)
        }
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// == Monitor Handle ==
/// Owner-side handle used to stop the monitor.
///
/// Dropping the handle without calling [`MonitorHandle::shutdown`] also stops
/// the task at its next wake.
#[derive(Debug)]
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals the task to stop and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await {
            warn!("Memory monitor ended abnormally: {}", err);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the memory monitor on the current tokio runtime.
///
/// The task holds only a weak reference to the cache and exits once the
/// cache is dropped or a stop signal arrives. Cycles never overlap.
pub fn spawn_memory_monitor(
    cache: Weak<ShardedCache>,
    policy: EvictionPolicy,
    probe: Arc<dyn MemoryProbe>,
) -> MonitorHandle {
    let (stop, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(
            "Starting memory monitor: interval={:?}, threshold={}, batch={}",
            policy.check_interval, policy.memory_threshold, policy.batch_size
        );

        let mut ticker = tokio::time::interval(policy.wake_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            let Some(cache) = cache.upgrade() else {
                debug!("Cache dropped, memory monitor exiting");
                break;
            };
            run_cycle(&cache, &policy, probe.as_ref());
        }

        info!("Memory monitor stopped");
    });

    MonitorHandle { stop, task }
}

/// Runs one monitor wake: sample, compare, evict.
///
/// Returns the number of entries evicted.
pub fn run_cycle(
    cache: &ShardedCache,
    policy: &EvictionPolicy,
    probe: &dyn MemoryProbe,
) -> usize {
    let Some(ratio) = probe.sample().and_then(|sample| sample.ratio()) else {
        debug!("Memory sample unavailable, skipping cycle");
        return 0;
    };

    let Some(batch) = policy.batch_for(ratio) else {
        debug!("Memory ratio {:.3} under threshold", ratio);
        return 0;
    };

    let evicted = cache.evict_batch(batch);
    info!(
        "Memory ratio {:.3} over threshold {}: evicted {} of {} requested entries",
        ratio, policy.memory_threshold, evicted, batch
    );
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySample;

    struct FixedProbe(Option<MemorySample>);

    impl MemoryProbe for FixedProbe {
        fn sample(&self) -> Option<MemorySample> {
            self.0
        }
    }

    fn policy(batch_size: usize, interval_ms: u64) -> EvictionPolicy {
        EvictionPolicy {
            memory_threshold: 0.7,
            severity_ratio: 0.85,
            batch_size,
            check_interval: Duration::from_millis(interval_ms),
        }
    }

    fn filled_cache(count: usize) -> Arc<ShardedCache> {
        let cache = Arc::new(ShardedCache::new(1));
        for i in 0..count {
            cache.set(format!("key_{}", i), "value".to_string());
        }
        cache
    }

    #[test]
    fn test_batch_for_thresholds() {
        let policy = policy(200, 2000);
        assert_eq!(policy.batch_for(0.5), None);
        assert_eq!(policy.batch_for(0.7), None);
        assert_eq!(policy.batch_for(0.8), Some(200));
        assert_eq!(policy.batch_for(0.85), Some(200));
        assert_eq!(policy.batch_for(0.9), Some(400));
    }

    #[test]
    fn test_zero_interval_clamped() {
        let policy = policy(1, 0);
        assert_eq!(policy.wake_period(), MIN_CHECK_INTERVAL);
        assert_eq!(EvictionPolicy::default().wake_period(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_monitor_survives_zero_interval() {
        let cache = filled_cache(50);
        let probe = Arc::new(FixedProbe(Some(MemorySample::new(99, 100))));

        let handle = spawn_memory_monitor(Arc::downgrade(&cache), policy(2, 0), probe);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!handle.is_finished(), "Monitor must keep running");
        assert!(cache.len() < 50, "Monitor should have evicted entries");
        handle.shutdown().await;
    }

    #[test]
    fn test_default_policy() {
        let policy = EvictionPolicy::default();
        assert_eq!(policy.batch_size, 200);
        assert_eq!(policy.check_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_cycle_skips_unavailable_sample() {
        let cache = filled_cache(10);
        let evicted = run_cycle(&cache, &policy(5, 10), &FixedProbe(None));
        assert_eq!(evicted, 0);
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_cycle_skips_zero_reserved() {
        let cache = filled_cache(10);
        let probe = FixedProbe(Some(MemorySample::new(100, 0)));
        assert_eq!(run_cycle(&cache, &policy(5, 10), &probe), 0);
    }

    #[test]
    fn test_cycle_under_threshold() {
        let cache = filled_cache(10);
        let probe = FixedProbe(Some(MemorySample::new(50, 100)));
        assert_eq!(run_cycle(&cache, &policy(5, 10), &probe), 0);
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_cycle_over_threshold() {
        let cache = filled_cache(10);
        let probe = FixedProbe(Some(MemorySample::new(80, 100)));
        assert_eq!(run_cycle(&cache, &policy(3, 10), &probe), 3);
        assert_eq!(cache.len(), 7);
    }

    #[test]
    fn test_cycle_severe_doubles_batch() {
        let cache = filled_cache(10);
        let probe = FixedProbe(Some(MemorySample::new(95, 100)));
        assert_eq!(run_cycle(&cache, &policy(3, 10), &probe), 6);
        assert_eq!(cache.len(), 4);
    }

    #[tokio::test]
    async fn test_monitor_evicts_under_pressure() {
        let cache = filled_cache(50);
        let probe = Arc::new(FixedProbe(Some(MemorySample::new(80, 100))));

        let handle = spawn_memory_monitor(Arc::downgrade(&cache), policy(2, 20), probe);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(cache.len() < 50, "Monitor should have evicted entries");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_no_eviction_after_shutdown() {
        let cache = filled_cache(0);
        let probe = Arc::new(FixedProbe(Some(MemorySample::new(95, 100))));

        let handle = spawn_memory_monitor(Arc::downgrade(&cache), policy(10, 20), probe);
        handle.shutdown().await;

        for i in 0..20 {
            cache.set(format!("late_{}", i), "value".to_string());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.len(), 20, "Stopped monitor must not evict");
    }

    #[tokio::test]
    async fn test_monitor_exits_when_cache_dropped() {
        let cache = filled_cache(1);
        let probe = Arc::new(FixedProbe(None));

        let handle = spawn_memory_monitor(Arc::downgrade(&cache), policy(1, 20), probe);
        drop(cache);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(handle.is_finished(), "Monitor should exit once the cache is gone");
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_monitor() {
        let cache = filled_cache(0);
        let probe = Arc::new(FixedProbe(Some(MemorySample::new(95, 100))));

        drop(spawn_memory_monitor(Arc::downgrade(&cache), policy(10, 20), probe));

        for i in 0..5 {
            cache.set(format!("key_{}", i), "value".to_string());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.len(), 5);
    }
}
