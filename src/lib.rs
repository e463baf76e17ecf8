//! Clockcache - A sharded in-memory key-value cache server
//!
//! Stores string pairs across independently locked shards and evicts with the
//! CLOCK algorithm whenever a background monitor sees memory pressure.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::ShardedCache;
pub use config::Config;
pub use memory::{MemoryProbe, MemorySample, ProcMemoryProbe};
