//! Cache Entry Module
//!
//! Defines a single stored key-value pair plus its CLOCK metadata.

use std::sync::atomic::{AtomicBool, Ordering};

// == Cache Entry ==
/// A stored key-value pair with its reference bit and accounted size.
///
/// The reference bit is atomic so that lookups can mark an entry while
/// holding only the shard's read lock.
#[derive(Debug)]
pub struct CacheEntry {
    /// The stored key
    pub key: String,
    /// The stored value
    pub value: String,
    /// CLOCK bit: set on access, cleared by one sweep pass
    referenced: AtomicBool,
    /// Byte length of key plus value
    size: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry. New entries start referenced.
    pub fn new(key: String, value: String) -> Self {
        let size = entry_size(&key, &value);
        Self {
            key,
            value,
            referenced: AtomicBool::new(true),
            size,
        }
    }

    // == Replace Value ==
    /// Replaces the value in place and marks the entry referenced.
    ///
    /// Returns the signed change in accounted size.
    pub fn replace_value(&mut self, value: String) -> i64 {
        let old_size = self.size;
        self.value = value;
        self.size = entry_size(&self.key, &self.value);
        self.mark_referenced();
        self.size as i64 - old_size as i64
    }

    /// Accounted size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    #[cfg(test)]
    pub fn is_referenced(&self) -> bool {
        self.referenced.load(Ordering::Relaxed)
    }

    /// Sets the reference bit. Safe under a shared lock.
    pub fn mark_referenced(&self) {
        self.referenced.store(true, Ordering::Relaxed);
    }

    /// Clears the reference bit, returning whether it was set.
    pub fn take_reference(&self) -> bool {
        self.referenced.swap(false, Ordering::Relaxed)
    }
}

/// Accounted size of a key-value pair.
pub fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}
