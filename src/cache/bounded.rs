//! Size-bounded key/value store with per-entry TTL.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    seq: u64,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= ttl
    }
}

/// Counters describing cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A concurrent map that never holds more than `capacity` entries.
///
/// Reads are lock-free apart from the map shard. Inserts of new keys are
/// serialized on the insertion queue and evict in first-in order, so a full
/// cache costs O(1) per insert. Expired entries read as absent and are dropped
/// on access; their queue records are discarded when they reach the front.
///
/// Invariant: every live entry has exactly one queue record carrying its
/// `seq`, and the queue never exceeds `capacity`.
pub struct BoundedCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    order: Mutex<VecDeque<(K, u64)>>,
    capacity: usize,
    ttl: Duration,
    next_seq: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: DashMap::with_capacity(capacity),
            order: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ttl,
            next_seq: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let found = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(self.ttl, now), entry.value.clone()));

        match found {
            Some((false, value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some((true, _)) => {
                self.entries
                    .remove_if(key, |_, entry| entry.is_expired(self.ttl, now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite. Overwrites keep the key's place in the queue.
    pub fn insert(&self, key: K, value: V) {
        let mut order = self.order();

        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.inserted_at = Instant::now();
            return;
        }

        while order.len() >= self.capacity {
            let Some((oldest, seq)) = order.pop_front() else {
                break;
            };
            if self
                .entries
                .remove_if(&oldest, |_, entry| entry.seq == seq)
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        order.push_back((key.clone(), seq));
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                seq,
            },
        );
    }

    pub fn get_or_insert_with(&self, key: &K, make: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = make();
        self.insert(key.clone(), value.clone());
        value
    }

    pub fn clear(&self) {
        let mut order = self.order();
        order.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn order(&self) -> MutexGuard<'_, VecDeque<(K, u64)>> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("size", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_insert() {
        let cache = BoundedCache::new(4, Duration::from_secs(60));
        assert!(cache.get(&"a").is_none());
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = BoundedCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = BoundedCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let cache = BoundedCache::new(2, Duration::ZERO);
        cache.insert("a", 1);
        assert!(cache.get(&"a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_insert_with_runs_once() {
        let cache = BoundedCache::new(8, Duration::from_secs(60));
        let mut calls = 0;
        let first = cache.get_or_insert_with(&"/ar/clinic".to_string(), || {
            calls += 1;
            7
        });
        let second = cache.get_or_insert_with(&"/ar/clinic".to_string(), || {
            calls += 1;
            8
        });
        assert_eq!((first, second, calls), (7, 7, 1));
    }

    #[test]
    fn test_expired_slot_is_reused_without_overflow() {
        let cache = BoundedCache::new(2, Duration::ZERO);
        for i in 0..10 {
            cache.insert(i, i);
            assert!(cache.get(&i).is_none());
        }
        assert!(cache.order().len() <= 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_distinct_keys_stay_within_capacity() {
        let cache = std::sync::Arc::new(BoundedCache::new(64, Duration::from_secs(60)));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let cache = cache.clone();
                scope.spawn(move || {
                    for i in 0..2_000 {
                        let key = format!("/w{worker}/p{i}");
                        cache.get_or_insert_with(&key, || i);
                        assert!(cache.order().len() <= 64);
                    }
                });
            }
        });

        assert_eq!(cache.len(), 64);
        assert_eq!(cache.order().len(), 64);
        assert_eq!(cache.stats().evictions, 8 * 2_000 - 64);
    }

    #[test]
    fn test_clear() {
        let cache = BoundedCache::new(8, Duration::from_secs(60));
        cache.insert(1u32, "x");
        cache.clear();
        assert!(cache.get(&1).is_none());
    }
}
