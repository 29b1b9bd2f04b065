//! Bounded map with per-entry time-to-live.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use super::policy::{EvictionPolicy, LruPolicy};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A bounded, time-expiring map.
///
/// Not synchronized; callers serialize access. An entry whose age has reached
/// the TTL is never returned and is dropped on the lookup that finds it.
/// When an insert would exceed capacity the policy's victim is evicted first,
/// whether or not it has expired.
#[derive(Debug)]
pub struct TtlCache<K, V, P = LruPolicy<K>> {
    entries: HashMap<K, Entry<V>>,
    policy: P,
    capacity: usize,
    ttl: Duration,
}

impl<K: Hash + Eq + Clone, V> TtlCache<K, V, LruPolicy<K>> {
    /// Create an LRU cache.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_policy(capacity, ttl, LruPolicy::new())
    }
}

impl<K, V, P> TtlCache<K, V, P>
where
    K: Hash + Eq + Clone,
    P: EvictionPolicy<K>,
{
    /// Create a cache with a custom eviction policy.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_policy(capacity: usize, ttl: Duration, policy: P) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Look up a fresh entry, recording the access.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        self.get_with_age(key, now).map(|(value, _)| value)
    }

    /// Like [`get`](Self::get), also returning how long ago the entry was
    /// stored.
    pub fn get_with_age(&mut self, key: &K, now: Instant) -> Option<(&V, Duration)> {
        let age = match self.entries.get(key) {
            None => return None,
            Some(entry) => now.saturating_duration_since(entry.inserted_at),
        };

        if age >= self.ttl {
            self.entries.remove(key);
            self.policy.on_remove(key);
            return None;
        }

        self.policy.on_access(key);
        self.entries.get(key).map(|entry| (&entry.value, age))
    }

    /// Insert or replace an entry. Returns the evicted key, if any.
    pub fn put(&mut self, key: K, value: V, inserted_at: Instant) -> Option<K> {
        let mut evicted = None;

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(victim) = self.policy.victim() {
                self.entries.remove(&victim);
                self.policy.on_remove(&victim);
                evicted = Some(victim);
            }
        }

        self.policy.on_insert(&key);
        self.entries.insert(key, Entry { value, inserted_at });
        evicted
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
