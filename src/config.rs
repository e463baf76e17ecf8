//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server and cache engine configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of independent cache partitions
    pub shard_count: usize,
    /// Fraction of reserved memory above which the monitor evicts
    pub memory_threshold: f64,
    /// Fraction above which the eviction batch is doubled
    pub severity_ratio: f64,
    /// Memory monitor wake period
    pub check_interval: Duration,
    /// Entries evicted per triggered cycle, before severity scaling
    pub eviction_batch_size: usize,
    /// Explicit memory budget in bytes; system memory is used when unset
    pub memory_limit_bytes: Option<u64>,
    /// HTTP server port
    pub server_port: u16,
    /// Requests allowed in flight before new ones are rejected
    pub max_concurrent_requests: usize,
    /// Per-request deadline
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SHARD_COUNT` - Number of shards (default: 1024)
    /// - `MEMORY_THRESHOLD` - Eviction trigger ratio (default: 0.7)
    /// - `SEVERITY_RATIO` - Batch doubling ratio (default: 0.85)
    /// - `CHECK_INTERVAL_MS` - Monitor period in milliseconds (default: 2000)
    /// - `EVICTION_BATCH_SIZE` - Entries per eviction cycle (default: 200)
    /// - `MEMORY_LIMIT_BYTES` - Memory budget (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 7171)
    /// - `MAX_CONCURRENT_REQUESTS` - Admission limit (default: 1000)
    /// - `REQUEST_TIMEOUT_MS` - Request deadline in milliseconds (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            shard_count: env_or("SHARD_COUNT", defaults.shard_count).max(1),
            memory_threshold: env_or("MEMORY_THRESHOLD", defaults.memory_threshold),
            severity_ratio: env_or("SEVERITY_RATIO", defaults.severity_ratio),
            check_interval: Duration::from_millis(env_or("CHECK_INTERVAL_MS", 2000_u64).max(1)),
            eviction_batch_size: env_or("EVICTION_BATCH_SIZE", defaults.eviction_batch_size),
            memory_limit_bytes: env_parse("MEMORY_LIMIT_BYTES"),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_concurrent_requests: env_or(
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
            request_timeout: Duration::from_millis(env_or("REQUEST_TIMEOUT_MS", 2000)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: 1024,
            memory_threshold: 0.7,
            severity_ratio: 0.85,
            check_interval: Duration::from_secs(2),
            eviction_batch_size: 200,
            memory_limit_bytes: None,
            server_port: 7171,
            max_concurrent_requests: 1000,
            request_timeout: Duration::from_secs(2),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env_parse(name).unwrap_or(default)
}
