//! FIFO (First In, First Out) cache
//!
//! Uses an index-linked list for O(1) eviction. Reads and in-place updates
//! leave insertion order untouched.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::cache::{Cache, OnEvicted};
use crate::config::{ByteBudget, CacheConfig, DEFAULT_INITIAL_CAPACITY};
use crate::size::{ByteSize, ENTRY_OVERHEAD};
use crate::stats::CacheStats;

/// Node in the FIFO doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    size: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Byte-budgeted FIFO cache
pub struct Fifo<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    /// Newest entry
    head: Option<usize>,
    /// Oldest entry, next to go
    tail: Option<usize>,
    free_list: Vec<usize>,
    max_bytes: Option<usize>,
    used_bytes: usize,
    sizer: fn(&V) -> usize,
    on_evicted: Option<OnEvicted<K, V>>,
    stats: CacheStats,
}

impl<K, V> Fifo<K, V>
where
    K: Hash + Eq + Clone,
    V: ByteSize,
{
    /// Create a cache sized by [`ByteSize`]; zero or negative `max_bytes`
    /// means unbounded
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

impl<K, V> Fifo<K, V>
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
        debug!(max_bytes = ?budget.limit(), capacity, "creating FIFO cache");

        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            max_bytes: budget.limit(),
            used_bytes: 0,
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

    /// Check for a key
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every entry without notifying the eviction callback
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.used_bytes = 0;
    }

    fn over_budget(&self) -> bool {
        self.max_bytes
            .is_some_and(|max_bytes| self.used_bytes > max_bytes)
    }

    fn push_front(&mut self, node: Node<K, V>) -> usize {
        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            prev: None,
            next: self.head,
            ..node
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
        idx
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    /// Unlink and release a node, firing the eviction callback
    fn remove_node(&mut self, idx: usize) {
        self.unlink(idx);
        let Some(node) = self.nodes[idx].take() else {
            return;
        };
        self.free_list.push(idx);

        self.map.remove(&node.key);
        self.used_bytes -= node.size;

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(node.key, node.value);
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}

impl<K, V> Cache<K, V> for Fifo<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(&idx) = self.map.get(key) {
            self.stats.record_hit();
            self.nodes[idx].as_ref().map(|node| &node.value)
        } else {
            self.stats.record_miss();
            None
        }
    }

    fn set(&mut self, key: K, value: V) {
        let size = (self.sizer)(&value) + ENTRY_OVERHEAD;

        if let Some(&idx) = self.map.get(&key) {
            // Update existing in place, keeping its queue position
            if let Some(node) = &mut self.nodes[idx] {
                self.used_bytes = self.used_bytes - node.size + size;
                node.size = size;
                node.value = value;
            }
            self.stats.record_update();
            return;
        }

        let idx = self.push_front(Node {
            key: key.clone(),
            value,
            size,
            prev: None,
            next: None,
        });
        self.map.insert(key, idx);
        self.used_bytes += size;
        self.stats.record_insert();

        if self.over_budget() {
            if let Some(tail_idx) = self.tail {
                trace!(used_bytes = self.used_bytes, "evicting oldest entry");
                self.stats.record_eviction();
                self.remove_node(tail_idx);
            }
        }
    }

    fn del(&mut self, key: &K) {
        if let Some(&idx) = self.map.get(key) {
            self.stats.record_removal();
            self.remove_node(idx);
        }
    }

    fn del_oldest(&mut self) {
        if let Some(tail_idx) = self.tail {
            self.stats.record_removal();
            self.remove_node(tail_idx);
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, OnEvicted<String, i64>) {
        let keys = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&keys);
        let on_evicted: OnEvicted<String, i64> = Box::new(move |key, _| {
            sink.lock().unwrap().push(key);
        });
        (keys, on_evicted)
    }

    #[test]
    fn test_fifo_set_get() {
        let mut cache: Fifo<String, i64> = Fifo::new(24, None);
        cache.del_oldest();

        cache.set("k1".to_string(), 1);
        assert_eq!(cache.get(&"k1".to_string()), Some(&1));

        cache.del(&"k1".to_string());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_fifo_eviction_ignores_reads() {
        let (keys, on_evicted) = recorder();
        // Two 16-byte entries fit
        let mut cache: Fifo<String, i64> = Fifo::new(32, Some(on_evicted));

        cache.set("k1".to_string(), 1);
        cache.set("k2".to_string(), 2);
        cache.get(&"k1".to_string());
        cache.set("k3".to_string(), 3);
        cache.get(&"k1".to_string());
        cache.set("k4".to_string(), 4);

        assert_eq!(*keys.lock().unwrap(), vec!["k1", "k2"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fifo_update_keeps_position() {
        let (keys, on_evicted) = recorder();
        let mut cache: Fifo<String, i64> = Fifo::new(32, Some(on_evicted));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("a".to_string(), 10);
        cache.set("c".to_string(), 3);

        assert_eq!(*keys.lock().unwrap(), vec!["a"]);
        assert_eq!(cache.get(&"b".to_string()), Some(&2));
        assert_eq!(cache.stats().updates(), 1);
    }

    #[test]
    fn test_fifo_del_middle() {
        let (keys, on_evicted) = recorder();
        let mut cache: Fifo<String, i64> = Fifo::new(0, Some(on_evicted));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("c".to_string(), 3);
        cache.del(&"b".to_string());
        cache.del(&"b".to_string());

        cache.del_oldest();
        cache.del_oldest();
        cache.del_oldest();

        assert_eq!(*keys.lock().unwrap(), vec!["b", "a", "c"]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fifo_clear() {
        let mut cache: Fifo<u32, u32> = Fifo::new(0, None);

        cache.set(1, 1);
        cache.set(2, 2);
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        cache.set(3, 3);
        assert_eq!(cache.get(&3), Some(&3));
    }

    #[test]
    fn test_fifo_from_config() {
        let config = CacheConfig::new(ByteBudget::Limit(12));
        let mut cache: Fifo<u32, u32> = Fifo::from_config(&config, None);

        cache.set(1, 1);
        cache.set(2, 2);

        assert_eq!(cache.max_bytes(), Some(12));
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
    }
}
