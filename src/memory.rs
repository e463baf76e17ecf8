//! Memory Introspection
//!
//! Samples process memory so the monitor can decide whether to evict.

use std::fs;

// == Memory Sample ==
/// One reading of process memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySample {
    /// Bytes actively in use by the process
    pub allocated: u64,
    /// Bytes the process may use before it is considered full
    pub reserved: u64,
}

impl MemorySample {
    pub fn new(allocated: u64, reserved: u64) -> Self {
        Self {
            allocated,
            reserved,
        }
    }

    /// allocated / reserved, or `None` when nothing is reserved.
    pub fn ratio(&self) -> Option<f64> {
        if self.reserved == 0 {
            None
        } else {
            Some(self.allocated as f64 / self.reserved as f64)
        }
    }
}

// == Memory Probe ==
/// Source of memory readings.
///
/// `None` means the reading is unavailable; the caller skips that cycle.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> Option<MemorySample>;
}

// == Proc Memory Probe ==
/// Reads resident set size from `VmRSS` in `/proc/self/status`.
///
/// The reserved side is the configured limit, or `MemTotal` from
/// `/proc/meminfo` when no limit is set. Returns `None` off Linux.
#[derive(Debug, Clone, Default)]
pub struct ProcMemoryProbe {
    limit_bytes: Option<u64>,
}

impl ProcMemoryProbe {
    pub fn new(limit_bytes: Option<u64>) -> Self {
        Self { limit_bytes }
    }

    fn reserved_bytes(&self) -> Option<u64> {
        match self.limit_bytes {
            Some(limit) => Some(limit),
            None => fs::read_to_string("/proc/meminfo")
                .ok()
                .and_then(|meminfo| parse_meminfo_total(&meminfo)),
        }
    }
}

impl MemoryProbe for ProcMemoryProbe {
    #[cfg(target_os = "linux")]
    fn sample(&self) -> Option<MemorySample> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        let allocated = parse_status_rss(&status)?;
        let reserved = self.reserved_bytes()?;
        Some(MemorySample::new(allocated, reserved))
    }

    #[cfg(not(target_os = "linux"))]
    fn sample(&self) -> Option<MemorySample> {
        None
    }
}

/// Resident bytes from the `VmRSS` line of `/proc/self/status`.
///
/// The kernel reports it in kB, independent of the page size.
pub fn parse_status_rss(status: &str) -> Option<u64> {
    parse_kib_field(status, "VmRSS:")
}

/// `MemTotal` in bytes from `/proc/meminfo`.
pub fn parse_meminfo_total(meminfo: &str) -> Option<u64> {
    parse_kib_field(meminfo, "MemTotal:")
}

fn parse_kib_field(text: &str, field: &str) -> Option<u64> {
    let line = text.lines().find(|line| line.starts_with(field))?;
    let kib: u64 = line[field.len()..].split_whitespace().next()?.parse().ok()?;
    kib.checked_mul(1024)
}
