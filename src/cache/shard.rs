//! Shard Module
//!
//! One independently locked partition of the key space. Holds the key index,
//! the CLOCK queue of entries, and the lock guarding both.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cache::clock::{ClockQueue, NodeId};
use crate::cache::entry::CacheEntry;

// == Eviction Outcome ==
/// Result of one CLOCK sweep over a shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Eviction {
    /// Number of entries removed
    pub entries: usize,
    /// Accounted bytes released by the removed entries
    pub bytes: u64,
}

#[derive(Debug, Default)]
struct ShardState {
    /// Key -> node holding its entry
    index: HashMap<String, NodeId>,
    /// Entries in insertion order, scanned by the clock hand
    queue: ClockQueue<CacheEntry>,
}

// == Shard ==
/// A cache partition.
///
/// Every key in `index` has exactly one node in `queue` and vice versa.
#[derive(Debug, Default)]
pub struct Shard {
    state: RwLock<ShardState>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns a copy of the value for `key` and marks the entry referenced.
    ///
    /// Takes the lock in shared mode; concurrent lookups do not block each other.
    pub fn get(&self, key: &str) -> Option<String> {
        let state = self.state.read();
        let id = *state.index.get(key)?;
        let entry = state.queue.get(id)?;
        entry.mark_referenced();
        Some(entry.value.clone())
    }

    // == Upsert ==
    /// Inserts or updates `key`, returning the change in accounted bytes.
    ///
    /// Updates keep the entry's queue position; CLOCK marks on write, it does
    /// not promote.
    pub fn upsert(&self, key: String, value: String) -> i64 {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if let Some(&id) = state.index.get(&key) {
            if let Some(entry) = state.queue.get_mut(id) {
                return entry.replace_value(value);
            }
        }

        let entry = CacheEntry::new(key.clone(), value);
        let size = entry.size() as i64;
        let id = state.queue.push_back(entry);
        state.index.insert(key, id);
        size
    }

    // == Evict ==
    /// Runs the CLOCK sweep until `count` entries are removed, the shard
    /// drains, or twice the starting queue length has been inspected.
    ///
    /// Returning fewer than `count` is normal when most entries are referenced.
    pub fn evict(&self, count: usize) -> Eviction {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let mut outcome = Eviction::default();
        let max_attempts = state.queue.len() * 2;
        let mut attempts = 0;

        while outcome.entries < count && attempts < max_attempts {
            attempts += 1;

            let Some(id) = state.queue.hand() else {
                break;
            };
            let referenced = match state.queue.get(id) {
                Some(entry) => entry.take_reference(),
                None => break,
            };

            if referenced {
                // Second chance
                state.queue.advance();
                continue;
            }

            if let Some(entry) = state.queue.remove(id) {
                state.index.remove(&entry.key);
                outcome.entries += 1;
                outcome.bytes += entry.size();
            }
        }

        outcome
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Sum of accounted sizes of live entries.
    pub fn total_size(&self) -> u64 {
        self.state.read().queue.iter().map(CacheEntry::size).sum()
    }
}
