//! Eviction policies for [`TtlCache`](super::TtlCache).

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::config::EvictionPolicyKind;

/// Chooses which key to drop when a cache is full.
///
/// The cache reports every insertion, access and removal; the policy keeps
/// whatever bookkeeping it needs to name a victim.
pub trait EvictionPolicy<K> {
    /// A key was inserted or its value replaced.
    fn on_insert(&mut self, key: &K);
    /// A key was read.
    fn on_access(&mut self, key: &K);
    /// A key left the cache.
    fn on_remove(&mut self, key: &K);
    /// The key to evict next, if any.
    fn victim(&self) -> Option<K>;
}

impl<K, P: EvictionPolicy<K> + ?Sized> EvictionPolicy<K> for Box<P> {
    fn on_insert(&mut self, key: &K) {
        (**self).on_insert(key)
    }

    fn on_access(&mut self, key: &K) {
        (**self).on_access(key)
    }

    fn on_remove(&mut self, key: &K) {
        (**self).on_remove(key)
    }

    fn victim(&self) -> Option<K> {
        (**self).victim()
    }
}

/// Least recently used.
#[derive(Debug)]
pub struct LruPolicy<K> {
    tick: u64,
    stamps: HashMap<K, u64>,
    order: BTreeMap<u64, K>,
}

impl<K> Default for LruPolicy<K> {
    fn default() -> Self {
        Self {
            tick: 0,
            stamps: HashMap::new(),
            order: BTreeMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> LruPolicy<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self, key: &K) {
        self.tick += 1;
        if let Some(old) = self.stamps.insert(key.clone(), self.tick) {
            self.order.remove(&old);
        }
        self.order.insert(self.tick, key.clone());
    }
}

impl<K: Hash + Eq + Clone> EvictionPolicy<K> for LruPolicy<K> {
    fn on_insert(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_remove(&mut self, key: &K) {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    fn victim(&self) -> Option<K> {
        self.order.values().next().cloned()
    }
}

/// Least frequently used. Ties go to the least recently used key.
#[derive(Debug)]
pub struct LfuPolicy<K> {
    tick: u64,
    entries: HashMap<K, (u64, u64)>,
    order: BTreeMap<(u64, u64), K>,
}

impl<K> Default for LfuPolicy<K> {
    fn default() -> Self {
        Self {
            tick: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> LfuPolicy<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self, key: &K) {
        self.tick += 1;
        let hits = match self.entries.get(key) {
            Some(&(hits, stamp)) => {
                self.order.remove(&(hits, stamp));
                hits + 1
            }
            None => 1,
        };
        self.entries.insert(key.clone(), (hits, self.tick));
        self.order.insert((hits, self.tick), key.clone());
    }
}

impl<K: Hash + Eq + Clone> EvictionPolicy<K> for LfuPolicy<K> {
    fn on_insert(&mut self, key: &K) {
        self.bump(key);
    }

    fn on_access(&mut self, key: &K) {
        self.bump(key);
    }

    fn on_remove(&mut self, key: &K) {
        if let Some(slot) = self.entries.remove(key) {
            self.order.remove(&slot);
        }
    }

    fn victim(&self) -> Option<K> {
        self.order.values().next().cloned()
    }
}

/// Build a boxed policy of the configured kind.
pub fn boxed_policy<K>(kind: EvictionPolicyKind) -> Box<dyn EvictionPolicy<K> + Send>
where
    K: Hash + Eq + Clone + Send + 'static,
{
    match kind {
        EvictionPolicyKind::Lru => Box::new(LruPolicy::new()),
        EvictionPolicyKind::Lfu => Box::new(LfuPolicy::new()),
    }
}
