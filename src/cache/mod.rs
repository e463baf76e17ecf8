//! Cache Module
//!
//! Sharded in-memory key-value storage with CLOCK (second-chance) eviction.

mod clock;
mod entry;
mod router;
mod shard;
mod stats;
mod store;


// Re-export public types
pub use stats::CacheStats;
pub use store::ShardedCache;

// == Public Constants ==
/// Maximum key length in bytes accepted by the HTTP layer
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum value length in bytes accepted by the HTTP layer
pub const MAX_VALUE_LENGTH: usize = 256;
