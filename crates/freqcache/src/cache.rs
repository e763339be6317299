//! Common interface shared by every eviction policy

/// Callback fired once for every entry that leaves a cache.
///
/// Capacity evictions, `del` and `del_oldest` all go through it. The
/// callback runs inline on the calling thread and must not touch the cache
/// that invoked it.
pub type OnEvicted<K, V> = Box<dyn FnMut(K, V) + Send>;

/// Byte-budgeted cache
///
/// Implementations differ only in which entry `del_oldest` and capacity
/// eviction pick. Misses and deletes of absent keys are silent no-ops.
pub trait Cache<K, V> {
    /// Look up a key, recording the access with the eviction policy
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Insert a new entry or replace the value of an existing one
    fn set(&mut self, key: K, value: V);

    /// Remove a key, notifying the eviction callback if it was present
    fn del(&mut self, key: &K);

    /// Remove the entry the policy would evict next
    fn del_oldest(&mut self);

    /// Number of live entries
    fn len(&self) -> usize;

    /// Check if the cache holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
