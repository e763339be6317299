//! LFU (Least Frequently Used) cache
//!
//! Every hit or repeat `set` bumps an entry's weight by one; capacity
//! eviction and `del_oldest` remove a minimum-weight entry. Order among
//! entries of equal weight follows heap layout and is not stable.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::cache::{Cache, OnEvicted};
use crate::config::{ByteBudget, CacheConfig, DEFAULT_INITIAL_CAPACITY};
use crate::queue::{Entry, Queue};
use crate::size::{ByteSize, ENTRY_OVERHEAD};
use crate::stats::CacheStats;

/// Byte-budgeted LFU cache
pub struct Lfu<K, V> {
    /// Evict when accounted bytes exceed this; `None` never evicts
    max_bytes: Option<usize>,

    /// Sum of accounted sizes across live entries
    used_bytes: usize,

    /// Entry table: key -> queue slot
    map: HashMap<K, usize, RandomState>,

    /// Weight-ordered entries
    queue: Queue<K, V>,

    sizer: fn(&V) -> usize,
    on_evicted: Option<OnEvicted<K, V>>,
    stats: CacheStats,
}

impl<K, V> Lfu<K, V>
where
    K: Hash + Eq + Clone,
    V: ByteSize,
{
    /// Create a cache sized by [`ByteSize`]
    ///
    /// # Arguments
    /// * `max_bytes` - Byte budget; zero or negative means unbounded
    /// * `on_evicted` - Called with every entry that leaves the cache
    pub fn new(max_bytes: i64, on_evicted: Option<OnEvicted<K, V>>) -> Self {
        Self::with_sizer(max_bytes, on_evicted, <V as ByteSize>::byte_size)
    }

    /// Create a cache from a [`CacheConfig`]
    pub fn from_config(config: &CacheConfig, on_evicted: Option<OnEvicted<K, V>>) -> Self {
        Self::build(
            config.max_bytes,
            config.initial_capacity,
            on_evicted,
            <V as ByteSize>::byte_size,
        )
    }
}

impl<K, V> Lfu<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache that sizes values with `sizer`
    pub fn with_sizer(
        max_bytes: i64,
        on_evicted: Option<OnEvicted<K, V>>,
        sizer: fn(&V) -> usize,
    ) -> Self {
        Self::build(
            ByteBudget::from_bytes(max_bytes),
            DEFAULT_INITIAL_CAPACITY,
            on_evicted,
            sizer,
        )
    }

    fn build(
        budget: ByteBudget,
        capacity: usize,
        on_evicted: Option<OnEvicted<K, V>>,
        sizer: fn(&V) -> usize,
    ) -> Self {
        debug!(max_bytes = ?budget.limit(), capacity, "creating LFU cache");

        Self {
            max_bytes: budget.limit(),
            used_bytes: 0,
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            queue: Queue::with_capacity(capacity),
            sizer,
            on_evicted,
            stats: CacheStats::new(),
        }
    }

    /// Accounted bytes across live entries
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Configured byte budget, `None` when unbounded
    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Check for a key without touching its weight
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Read a value without touching its weight
    pub fn peek(&self, key: &K) -> Option<&V> {
        let &slot = self.map.get(key)?;
        self.queue.get(slot).map(|entry| &entry.value)
    }

    /// Access frequency recorded for a key
    pub fn weight(&self, key: &K) -> Option<u64> {
        let &slot = self.map.get(key)?;
        self.queue.weight(slot)
    }

    /// Key that capacity eviction would remove next
    pub fn peek_lfu(&self) -> Option<&K> {
        self.queue.peek_min().map(|entry| &entry.key)
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every entry without notifying the eviction callback
    pub fn clear(&mut self) {
        self.map.clear();
        self.queue.clear();
        self.used_bytes = 0;
    }

    fn over_budget(&self) -> bool {
        self.max_bytes
            .is_some_and(|max_bytes| self.used_bytes > max_bytes)
    }

    fn touch(&mut self, slot: usize) {
        if let Some(weight) = self.queue.weight(slot) {
            self.queue.update_weight(slot, weight.saturating_add(1));
        }
    }

    fn remove_element(&mut self, entry: Entry<K, V>) {
        let Entry {
            key, value, size, ..
        } = entry;

        self.map.remove(&key);
        self.used_bytes -= size;

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(key, value);
        }
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let sizes: usize = self
            .map
            .values()
            .filter_map(|&slot| self.queue.get(slot))
            .map(|entry| entry.size)
            .sum();
        let mapped = self.map.iter().all(|(key, &slot)| {
            self.queue.get(slot).is_some_and(|entry| &entry.key == key)
        });

        self.queue.is_heap()
            && self.map.len() == self.queue.len()
            && mapped
            && sizes == self.used_bytes
    }
}

impl<K, V> Cache<K, V> for Lfu<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&slot) = self.map.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.touch(slot);
        self.stats.record_hit();
        self.queue.get(slot).map(|entry| &entry.value)
    }

    fn set(&mut self, key: K, value: V) {
        let size = (self.sizer)(&value) + ENTRY_OVERHEAD;

        if let Some(&slot) = self.map.get(&key) {
            if let Some(entry) = self.queue.get_mut(slot) {
                self.used_bytes = self.used_bytes - entry.size + size;
                entry.size = size;
                entry.value = value;
            }
            self.touch(slot);
            self.stats.record_update();

            // Updates never evict; the budget is only enforced on fresh inserts
            if self.over_budget() {
                debug!(
                    used_bytes = self.used_bytes,
                    "in-place update left LFU cache over budget"
                );
            }
            return;
        }

        let slot = self.queue.insert(Entry::new(key.clone(), value, size));
        self.map.insert(key, slot);
        self.used_bytes += size;
        self.stats.record_insert();

        // One eviction per insert, even if still over budget afterwards
        if self.over_budget() {
            if let Some(entry) = self.queue.remove_min() {
                trace!(
                    size = entry.size,
                    used_bytes = self.used_bytes,
                    "evicting least frequently used entry"
                );
                self.stats.record_eviction();
                self.remove_element(entry);
            }
        }
    }

    fn del(&mut self, key: &K) {
        let Some(index) = self
            .map
            .get(key)
            .and_then(|&slot| self.queue.index_of(slot))
        else {
            return;
        };

        if let Some(entry) = self.queue.remove_at(index) {
            trace!(size = entry.size, "deleting entry");
            self.stats.record_removal();
            self.remove_element(entry);
        }
    }

    fn del_oldest(&mut self) {
        if let Some(entry) = self.queue.remove_min() {
            trace!(size = entry.size, "deleting least frequently used entry");
            self.stats.record_removal();
            self.remove_element(entry);
        }
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
