//! Sharded, fixed-capacity keyed state tables.
//!
//! Every aggregate the engine keeps (counters, timestamps, byte totals,
//! block flags) lives in a `StateTable`: a set of lock shards, each guarding
//! a pre-sized `heapless::FnvIndexMap<K, u64, C>`. All capacity is reserved at
//! construction; the per-packet path never allocates. Operations on the same
//! key serialize through that key's shard, so no update is ever lost;
//! operations on keys in different shards proceed in parallel.

use core::fmt;
use std::sync::Mutex;

use hash32::{Hash, Hasher};
use heapless::FnvIndexMap;
use thiserror::Error;

/// A table shard is full and a new key cannot be inserted.
///
/// Raised only on first observation of a key; updates to keys already present
/// always succeed. Callers on the packet path treat this as a fail-open
/// condition and tally it for the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("state table full, new key rejected")]
pub struct CapacityExceeded;

/// Source/destination address pair with ports, the widest flow key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowKey {
    pub src: u32,
    pub dst: u32,
    pub src_port: u16,
    pub dst_port: u16,
}

impl Hash for FlowKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.src.hash(state);
        self.dst.hash(state);
        self.src_port.hash(state);
        self.dst_port.hash(state);
    }
}

/// Fixed-capacity concurrent map from `K` to a 64-bit aggregate value.
///
/// `S` is the shard count, `C` the per-shard capacity (a power of two, as
/// required by `heapless`); total key cardinality is `S * C`. The value's
/// meaning is table-specific: running counter, nanosecond timestamp,
/// cumulative byte total, jitter magnitude, or 0/1 block flag.
pub struct StateTable<K, const S: usize, const C: usize> {
    shards: [Mutex<FnvIndexMap<K, u64, C>>; S],
}

impl<K, const S: usize, const C: usize> StateTable<K, S, C>
where
    K: Hash + Eq + Copy,
{
    pub fn new() -> Self {
        Self {
            shards: core::array::from_fn(|_| Mutex::new(FnvIndexMap::new())),
        }
    }

    fn shard(&self, key: &K) -> &Mutex<FnvIndexMap<K, u64, C>> {
        let mut hasher = hash32::FnvHasher::default();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % S]
    }

    /// Current value for `key`, if it has ever been observed.
    pub fn get(&self, key: &K) -> Option<u64> {
        let shard = self.shard(key).lock().expect("state table shard poisoned");
        shard.get(key).copied()
    }

    /// Insert `value` only if `key` is absent. Returns whether the insert
    /// happened; an existing entry is left untouched.
    pub fn upsert_initial(&self, key: K, value: u64) -> Result<bool, CapacityExceeded> {
        let mut shard = self.shard(&key).lock().expect("state table shard poisoned");
        if shard.contains_key(&key) {
            return Ok(false);
        }
        shard.insert(key, value).map_err(|_| CapacityExceeded)?;
        Ok(true)
    }

    /// Add `delta` to the entry for `key`, initializing to `delta` if absent.
    /// Returns the post-update value so callers can evaluate thresholds
    /// against the count that includes the current packet.
    pub fn atomic_add(&self, key: K, delta: u64) -> Result<u64, CapacityExceeded> {
        let mut shard = self.shard(&key).lock().expect("state table shard poisoned");
        if let Some(value) = shard.get_mut(&key) {
            *value = value.wrapping_add(delta);
            Ok(*value)
        } else {
            shard.insert(key, delta).map_err(|_| CapacityExceeded)?;
            Ok(delta)
        }
    }

    /// Unconditionally overwrite the entry for `key`.
    pub fn set(&self, key: K, value: u64) -> Result<(), CapacityExceeded> {
        let mut shard = self.shard(&key).lock().expect("state table shard poisoned");
        if let Some(slot) = shard.get_mut(&key) {
            *slot = value;
            Ok(())
        } else {
            shard.insert(key, value).map_err(|_| CapacityExceeded)?;
            Ok(())
        }
    }

    /// Remove the entry for `key`, returning its last value.
    pub fn remove(&self, key: &K) -> Option<u64> {
        let mut shard = self.shard(key).lock().expect("state table shard poisoned");
        shard.remove(key)
    }

    /// Drop every entry in every shard.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().expect("state table shard poisoned").clear();
        }
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().expect("state table shard poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum key cardinality fixed at construction.
    pub const fn capacity(&self) -> usize {
        S * C
    }

    /// Copy out the full key/value contents, one shard at a time. Entries
    /// updated concurrently may or may not reflect those updates; each shard
    /// is internally consistent.
    pub fn snapshot(&self) -> Vec<(K, u64)> {
        let mut out = Vec::with_capacity(self.len());
        for shard in &self.shards {
            let guard = shard.lock().expect("state table shard poisoned");
            for (key, value) in guard.iter() {
                out.push((*key, *value));
            }
        }
        out
    }
}

impl<K, const S: usize, const C: usize> Default for StateTable<K, S, C>
where
    K: Hash + Eq + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, const S: usize, const C: usize> fmt::Debug for StateTable<K, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTable")
            .field("shards", &S)
            .field("shard_capacity", &C)
            .finish()
    }
}
