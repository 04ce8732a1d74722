//! Bounded least-recently-used cache of utility scores.
//!
//! Keys are canonical [`Subset`]s, so the same coalition reached through
//! different permutations hits the same entry. The cache never outlives the
//! utility that owns it: replacing the model or the dataset builds a new
//! utility with an empty cache, and [`UtilityCache::clear`] drops every entry
//! explicitly.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::types::Subset;

/// Hit/miss counters of a [`UtilityCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required an evaluation.
    pub misses: u64,
    /// Entries dropped to respect the capacity.
    pub evictions: u64,
    /// Entries currently stored.
    pub len: usize,
}

struct Entry {
    value: f64,
    /// Recency stamp, key into `recency`.
    tick: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Subset, Entry>,
    /// Recency order: smallest tick is the least recently used.
    recency: BTreeMap<u64, Subset>,
    next_tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Inner {
    fn touch(&mut self, key: &Subset) -> Option<f64> {
        let tick = self.next_tick;
        let entry = self.entries.get_mut(key)?;
        let old = std::mem::replace(&mut entry.tick, tick);
        let value = entry.value;
        self.next_tick += 1;
        if let Some(subset) = self.recency.remove(&old) {
            self.recency.insert(tick, subset);
        }
        Some(value)
    }
}

/// Thread-safe bounded LRU map from subsets to scores.
pub struct UtilityCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl UtilityCache {
    /// Create a cache holding at most `capacity` scores.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be > 0");
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Maximum number of stored scores.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a score, marking it as recently used.
    pub fn get(&self, key: &Subset) -> Option<f64> {
        let mut inner = self.inner.lock();
        match inner.touch(key) {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store a score, evicting the least recently used entry when full.
    pub fn insert(&self, key: Subset, value: f64) {
        let mut inner = self.inner.lock();
        if inner.touch(&key).is_some() {
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.value = value;
            }
            return;
        }
        while inner.entries.len() >= self.capacity {
            let Some((_, oldest)) = inner.recency.pop_first() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.evictions += 1;
            log::debug!("utility cache evicted subset of size {}", oldest.len());
        }
        let tick = inner.next_tick;
        inner.next_tick += 1;
        inner.recency.insert(tick, key.clone());
        inner.entries.insert(key, Entry { value, tick });
    }

    /// Return the cached score for `key` or compute, store and return it.
    ///
    /// The lock is not held while `compute` runs, so concurrent misses on the
    /// same subset may evaluate it twice; both store the same score.
    pub fn get_or_insert_with<E>(
        &self,
        key: &Subset,
        compute: impl FnOnce() -> Result<f64, E>,
    ) -> Result<f64, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key.clone(), value);
        Ok(value)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    /// Number of stored scores.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            len: inner.entries.len(),
        }
    }
}

impl std::fmt::Debug for UtilityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtilityCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
