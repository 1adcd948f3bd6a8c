//! Child-key cache policies
//!
//! A cache maps, per parent key, each child distance to the child's key so hot
//! traversal paths skip the per-distance pointer lookups.

use crate::Result;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default number of parents kept by [`LruChildrenCache`]
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Loads the child key recorded at one distance
pub type LoadOne<'a> = dyn Fn(u32) -> Result<Bytes> + 'a;

/// Loads every child key in distance order, if an aggregate is available
pub type LoadAll<'a> = dyn Fn() -> Result<Option<Vec<Bytes>>> + 'a;

/// Strategy for caching parent → (distance → child key) mappings
///
/// Implementations synchronize internally; one instance may be shared by
/// several tree handles.
pub trait CachePolicy: Send + Sync {
    /// Whether the engine should consult this cache at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// Push the child keys for every distance in `window` onto `pending`
    ///
    /// Returns false, leaving `pending` untouched, unless all of them are
    /// cached.
    fn get(&self, parent: &[u8], window: &[u32], pending: &mut VecDeque<Bytes>) -> bool;

    /// Populate the entry for `parent` from its full sorted distance list
    ///
    /// After this returns `Ok`, `get` must hit for any sub-window of
    /// `distances`.
    fn update(
        &self,
        parent: &[u8],
        distances: &[u32],
        load_one: &LoadOne<'_>,
        load_all: &LoadAll<'_>,
    ) -> Result<()>;

    /// Drop the entry for `parent`
    fn invalidate(&self, parent: &[u8]);

    /// An empty cache with the same configuration
    fn fresh(&self) -> Arc<dyn CachePolicy>;
}

/// A cache that never caches
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl CachePolicy for NoCache {
    fn is_enabled(&self) -> bool {
        false
    }

    fn get(&self, _parent: &[u8], _window: &[u32], _pending: &mut VecDeque<Bytes>) -> bool {
        false
    }

    fn update(
        &self,
        _parent: &[u8],
        _distances: &[u32],
        _load_one: &LoadOne<'_>,
        _load_all: &LoadAll<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn invalidate(&self, _parent: &[u8]) {}

    fn fresh(&self) -> Arc<dyn CachePolicy> {
        Arc::new(NoCache)
    }
}

/// Cache hit/miss counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

type ChildMap = BTreeMap<u32, Bytes>;

/// Bounded LRU cache of per-parent child maps
pub struct LruChildrenCache {
    capacity: NonZeroUsize,
    entries: Mutex<LruCache<Bytes, Arc<ChildMap>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruChildrenCache {
    /// Create a cache holding at most `capacity` parents
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Maximum number of cached parents
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of cached parents
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for LruChildrenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for LruChildrenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruChildrenCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl CachePolicy for LruChildrenCache {
    fn get(&self, parent: &[u8], window: &[u32], pending: &mut VecDeque<Bytes>) -> bool {
        let entry = self.entries.lock().get(parent).cloned();
        let Some(children) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let mut keys = Vec::with_capacity(window.len());
        for d in window {
            match children.get(d) {
                Some(key) => keys.push(key.clone()),
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
            }
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        pending.extend(keys);
        true
    }

    fn update(
        &self,
        parent: &[u8],
        distances: &[u32],
        load_one: &LoadOne<'_>,
        load_all: &LoadAll<'_>,
    ) -> Result<()> {
        let children: ChildMap = match load_all()? {
            Some(keys) if keys.len() == distances.len() => {
                distances.iter().copied().zip(keys).collect()
            }
            _ => distances
                .iter()
                .map(|&d| load_one(d).map(|key| (d, key)))
                .collect::<Result<_>>()?,
        };

        self.entries
            .lock()
            .put(Bytes::copy_from_slice(parent), Arc::new(children));
        Ok(())
    }

    fn invalidate(&self, parent: &[u8]) {
        self.entries.lock().pop(parent);
    }

    fn fresh(&self) -> Arc<dyn CachePolicy> {
        Arc::new(LruChildrenCache::new(self.capacity.get()))
    }
}
