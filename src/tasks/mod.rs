//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Memory Monitor: Evicts cache entries when process memory crosses a threshold

mod monitor;

pub use monitor::{run_cycle, spawn_memory_monitor, EvictionPolicy, MonitorHandle};
