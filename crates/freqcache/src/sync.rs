//! Thread-safe wrapper around any cache policy
//!
//! Policies themselves take `&mut self` and hold no locks; `SyncCache`
//! serializes every call behind one mutex so a single instance can be shared
//! across threads.

use std::marker::PhantomData;

use parking_lot::Mutex;

use crate::cache::Cache;

/// Mutex-guarded cache handle
pub struct SyncCache<K, V, C> {
    inner: Mutex<C>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, C> SyncCache<K, V, C>
where
    C: Cache<K, V>,
{
    /// Wrap a cache
    pub fn new(cache: C) -> Self {
        Self {
            inner: Mutex::new(cache),
            _marker: PhantomData,
        }
    }

    /// Get a copy of a value, recording the access with the policy
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Insert or replace a value
    pub fn set(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    /// Remove a key
    pub fn del(&self, key: &K) {
        self.inner.lock().del(key);
    }

    /// Remove the entry the policy would evict next
    pub fn del_oldest(&self) {
        self.inner.lock().del_oldest();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run several operations under one lock acquisition
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut cache = self.inner.lock();
        f(&mut *cache)
    }

    /// Unwrap the inner cache
    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }
}
