//! BK-tree engine

use super::codec::{
    child_index_key, children_distances_key, children_keys_key, decode_distances,
    insert_distance, missing_children, validate_key, window,
};
use super::{ChildEdge, Node, DISTANCE_WIDTH, ROOT_INDEX_KEY};
use crate::config::TreeConfig;
use crate::distance::{DistancePolicy, Levenshtein};
use crate::error::{display_key, BkError, Result};
use crate::policy::{CachePolicy, ChildrenKeyPolicy, RootOverwritePolicy};
use bkindex_store::{KvStore, LmdbKvStore, LmdbStoreOptions, WriteBatch};
use bytes::Bytes;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

/// A BK-tree persisted in a pair of key-value stores
///
/// Values go to the value store under their raw key; the tree structure goes
/// to the index store. Both stores are shared with every handle produced by
/// [`BkTree::clone_handle`].
///
/// A handle is a single writer: `insert` takes `&mut self`, and two handles
/// inserting into the same stores concurrently can race on the same
/// `(parent, distance)` slot, orphaning one of the new children. Queries only
/// read and are safe from any number of handles.
pub struct BkTree<S: KvStore, D: DistancePolicy = Levenshtein> {
    values: Arc<S>,
    indexes: Arc<S>,
    distance: D,
    /// Root key as of open, last insert, reset or reload
    root: Option<Bytes>,
    cache: Arc<dyn CachePolicy>,
    children_keys: Arc<dyn ChildrenKeyPolicy>,
    root_overwrite: Arc<dyn RootOverwritePolicy>,
}

impl<S: KvStore> BkTree<S, Levenshtein> {
    /// Open a tree with Levenshtein distance and the default configuration
    pub fn open(values: Arc<S>, indexes: Arc<S>) -> Result<Self> {
        Self::open_with(values, indexes, Levenshtein, &TreeConfig::default())
    }
}

impl<D: DistancePolicy> BkTree<LmdbKvStore, D> {
    /// Open (or create) LMDB stores at the two directories and open a tree on them
    pub fn open_paths(
        values_dir: impl AsRef<Path>,
        index_dir: impl AsRef<Path>,
        options: LmdbStoreOptions,
        distance: D,
        config: &TreeConfig,
    ) -> Result<Self> {
        let values = Arc::new(LmdbKvStore::open(values_dir, options.clone())?);
        let indexes = Arc::new(LmdbKvStore::open(index_dir, options)?);
        Self::open_with(values, indexes, distance, config)
    }
}

impl<S: KvStore, D: DistancePolicy> BkTree<S, D> {
    /// Open a tree over existing stores
    ///
    /// A missing root pointer means an empty tree.
    #[instrument(skip_all)]
    pub fn open_with(
        values: Arc<S>,
        indexes: Arc<S>,
        distance: D,
        config: &TreeConfig,
    ) -> Result<Self> {
        let root = indexes.get(ROOT_INDEX_KEY)?;
        debug!(root = ?root.as_deref().map(display_key), "bk-tree opened");

        Ok(Self {
            values,
            indexes,
            distance,
            root,
            cache: config.cache_policy(),
            children_keys: config.children_key_policy(),
            root_overwrite: config.root_overwrite_policy(),
        })
    }

    /// Replace the child-key cache
    pub fn with_cache_policy(mut self, cache: Arc<dyn CachePolicy>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the children-key aggregate policy
    pub fn with_children_key_policy(mut self, policy: Arc<dyn ChildrenKeyPolicy>) -> Self {
        self.children_keys = policy;
        self
    }

    /// Replace the root-overwrite policy
    pub fn with_root_overwrite_policy(mut self, policy: Arc<dyn RootOverwritePolicy>) -> Self {
        self.root_overwrite = policy;
        self
    }

    /// Key of the root node
    pub fn root_key(&self) -> Option<&Bytes> {
        self.root.as_ref()
    }

    /// Check if the tree has no root
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The distance policy
    pub fn distance_policy(&self) -> &D {
        &self.distance
    }

    /// The value store
    pub fn value_store(&self) -> &Arc<S> {
        &self.values
    }

    /// The index store
    pub fn index_store(&self) -> &Arc<S> {
        &self.indexes
    }

    /// The child-key cache
    pub fn cache_policy(&self) -> &Arc<dyn CachePolicy> {
        &self.cache
    }

    /// Insert a key, or overwrite its value if it is already in the tree
    #[instrument(skip(self, key, value), fields(key = %display_key(key)))]
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.check_key_fits(key)?;

        let Some(mut current) = self.root.clone() else {
            return self.install_root(key, value);
        };

        loop {
            let d = self.distance.distance(&current, key);
            if d == 0 {
                self.values.put(&current, value)?;
                trace!("value overwritten");
                return Ok(());
            }

            // the distances list decides which slots are taken; a pointer
            // without a listing is left over from an earlier tree
            let siblings = self
                .indexes
                .get(&children_distances_key(&current))?
                .ok_or_else(|| missing_children(&current))?;
            if decode_distances(&siblings)?.binary_search(&d).is_err() {
                return self.attach_child(&current, &siblings, d, key, value);
            }
            current = self.child_key(&current, d)?;
        }
    }

    /// Values of keys within `threshold` of `key`, at most `limit` of them
    pub fn query(&self, key: &[u8], threshold: u32, limit: usize) -> Result<BTreeSet<Bytes>> {
        self.query_with_radius(key, threshold, limit, threshold)
    }

    /// Range query with separate acceptance and pruning radii
    ///
    /// A node is accepted when its distance to `key` is strictly below
    /// `match_radius`; children are pruned using `threshold`. With
    /// `match_radius > threshold`, nodes that would be accepted can be pruned
    /// before they are visited.
    #[instrument(skip(self, key), fields(key = %display_key(key)))]
    pub fn query_with_radius(
        &self,
        key: &[u8],
        threshold: u32,
        limit: usize,
        match_radius: u32,
    ) -> Result<BTreeSet<Bytes>> {
        let mut values = BTreeSet::new();
        let Some(root) = &self.root else {
            return Ok(values);
        };
        if limit == 0 {
            return Ok(values);
        }

        let mut pending = VecDeque::from([root.clone()]);
        let mut visited = 0usize;

        while let Some(current) = pending.pop_front() {
            visited += 1;
            let d = self.distance.distance(&current, key);

            if d < match_radius {
                values.insert(self.load_value(&current)?);
                if values.len() >= limit {
                    break;
                }
            }

            let distances = self.child_distances(&current)?;
            let range = window(&distances, d, threshold);
            if range.is_empty() {
                continue;
            }
            self.resolve_children(&current, &distances, &distances[range], &mut pending)?;
        }

        debug!(visited, matched = values.len(), "query finished");
        Ok(values)
    }

    /// A second handle over the same stores and root snapshot
    ///
    /// With `share_cache` the handles share one cache instance; otherwise the
    /// new handle starts with an empty cache of the same kind.
    pub fn clone_handle(&self, share_cache: bool) -> Self {
        let cache = if share_cache {
            Arc::clone(&self.cache)
        } else {
            self.cache.fresh()
        };

        Self {
            values: Arc::clone(&self.values),
            indexes: Arc::clone(&self.indexes),
            distance: self.distance.clone(),
            root: self.root.clone(),
            cache,
            children_keys: Arc::clone(&self.children_keys),
            root_overwrite: Arc::clone(&self.root_overwrite),
        }
    }

    /// Forget the root, leaving every other index entry in place
    ///
    /// The next insert becomes the root. If that key still has children from
    /// the old tree, the root-overwrite policy decides what happens to them.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Result<()> {
        self.indexes.delete(ROOT_INDEX_KEY)?;
        self.root = None;
        info!("bk-tree reset");
        Ok(())
    }

    /// Re-read the root pointer from the index store
    pub fn reload_root(&mut self) -> Result<Option<&Bytes>> {
        self.root = self.indexes.get(ROOT_INDEX_KEY)?;
        Ok(self.root.as_ref())
    }

    /// Load the node stored under `key`
    pub fn node(&self, key: &[u8]) -> Result<Option<Node>> {
        let Some(value) = self.values.get(key)? else {
            return Ok(None);
        };
        let Some(blob) = self.indexes.get(&children_distances_key(key))? else {
            return Ok(None);
        };

        let children = decode_distances(&blob)?
            .into_iter()
            .map(|distance| -> Result<ChildEdge> {
                Ok(ChildEdge {
                    distance,
                    key: self.child_key(key, distance)?,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Some(Node {
            key: Bytes::copy_from_slice(key),
            value,
            children,
        }))
    }

    /// Every node reachable from the root, breadth first
    pub fn nodes(&self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut pending: VecDeque<Bytes> = self.root.iter().cloned().collect();

        while let Some(key) = pending.pop_front() {
            let node = self.node(&key)?.ok_or_else(|| {
                BkError::Corruption(format!("reachable node '{}' is missing", display_key(&key)))
            })?;
            pending.extend(node.children.iter().map(|edge| edge.key.clone()));
            nodes.push(node);
        }

        Ok(nodes)
    }

    /// Reject keys whose index entries the stores could not hold
    fn check_key_fits(&self, key: &[u8]) -> Result<()> {
        let limits = [
            self.values.max_key_len(),
            self.indexes
                .max_key_len()
                .map(|max| max.saturating_sub(DISTANCE_WIDTH)),
        ];
        match limits.into_iter().flatten().min() {
            Some(max) if key.len() > max => Err(BkError::InvalidKey(format!(
                "key of {} bytes exceeds the {max} byte limit of the stores",
                key.len()
            ))),
            _ => Ok(()),
        }
    }

    fn install_root(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.values.put(key, value)?;

        let stale = match self.indexes.get(&children_distances_key(key))? {
            Some(blob) => decode_distances(&blob)?,
            None => Vec::new(),
        };

        let mut batch = WriteBatch::new();
        if stale.is_empty() {
            batch.put(children_distances_key(key), b"");
            if self.children_keys.is_enabled() {
                batch.put(children_keys_key(key), b"");
            }
        } else {
            warn!(stale = stale.len(), "new root has children left from an earlier tree");
            self.root_overwrite.reconcile(key, &stale, &mut batch);
        }
        batch.put(ROOT_INDEX_KEY, key);
        self.indexes.write(batch)?;

        self.cache.invalidate(key);
        self.root = Some(Bytes::copy_from_slice(key));
        debug!("root installed");
        Ok(())
    }

    fn attach_child(
        &mut self,
        parent: &[u8],
        siblings: &[u8],
        d: u32,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        let (spliced, rank) = insert_distance(siblings, d)?;
        let aggregate = self.spliced_aggregate(parent, siblings.len() / DISTANCE_WIDTH, key, rank)?;
        let stale = match self.indexes.get(&children_distances_key(key))? {
            Some(blob) => decode_distances(&blob)?,
            None => Vec::new(),
        };

        // value first: a crash before the index batch leaves only an unreachable value
        self.values.put(key, value)?;

        let mut batch = WriteBatch::new();
        if !stale.is_empty() {
            debug!(stale = stale.len(), "dropping child pointers left from an earlier tree");
        }
        for distance in stale {
            batch.delete(child_index_key(key, distance));
        }
        batch.put(children_distances_key(key), b"");
        batch.put(children_distances_key(parent), &spliced);
        batch.put(child_index_key(parent, d), key);
        if self.children_keys.is_enabled() {
            batch.put(children_keys_key(key), b"");
            match aggregate {
                Some(aggregate) => batch.put(children_keys_key(parent), aggregate),
                None => batch.delete(children_keys_key(parent)),
            };
        } else {
            batch.delete(children_keys_key(key));
        }
        self.indexes.write(batch)?;

        self.cache.invalidate(parent);
        self.cache.invalidate(key);
        debug!(parent = %display_key(parent), distance = d, "child attached");
        Ok(())
    }

    /// The parent's aggregate with `key` spliced in at `rank`
    ///
    /// `None` when the existing aggregate does not list exactly
    /// `sibling_count` keys (for example because it was written while
    /// aggregates were disabled); the caller drops it and lookups fall back to
    /// the per-distance pointers.
    fn spliced_aggregate(
        &self,
        parent: &[u8],
        sibling_count: usize,
        key: &[u8],
        rank: usize,
    ) -> Result<Option<Vec<u8>>> {
        if !self.children_keys.is_enabled() {
            return Ok(None);
        }

        let blob = match self.indexes.get(&children_keys_key(parent))? {
            Some(blob) => blob,
            None if sibling_count == 0 => Bytes::new(),
            None => return Ok(None),
        };
        if self.children_keys.split(&blob)?.len() != sibling_count {
            warn!(parent = %display_key(parent), "children keys aggregate out of step, dropping it");
            return Ok(None);
        }

        self.children_keys.insert(&blob, key, rank).map(Some)
    }

    fn resolve_children(
        &self,
        parent: &Bytes,
        distances: &[u32],
        window: &[u32],
        pending: &mut VecDeque<Bytes>,
    ) -> Result<()> {
        if !self.cache.is_enabled() {
            for &d in window {
                pending.push_back(self.child_key(parent, d)?);
            }
            return Ok(());
        }

        if self.cache.get(parent, window, pending) {
            return Ok(());
        }

        trace!(parent = %display_key(parent), "child cache miss");
        let load_one = |d: u32| self.child_key(parent, d);
        let load_all = || self.aggregate_children(parent);
        self.cache.update(parent, distances, &load_one, &load_all)?;

        if !self.cache.get(parent, window, pending) {
            return Err(BkError::InternalConsistency(format!(
                "cache missed children of '{}' right after update",
                display_key(parent)
            )));
        }
        Ok(())
    }

    fn child_key(&self, parent: &[u8], d: u32) -> Result<Bytes> {
        self.indexes.get(&child_index_key(parent, d))?.ok_or_else(|| {
            BkError::Corruption(format!(
                "node '{}' lists distance {d} without a child pointer",
                display_key(parent)
            ))
        })
    }

    fn aggregate_children(&self, parent: &[u8]) -> Result<Option<Vec<Bytes>>> {
        if !self.children_keys.is_enabled() {
            return Ok(None);
        }
        match self.indexes.get(&children_keys_key(parent))? {
            Some(blob) => self.children_keys.split(&blob).map(Some),
            None => Ok(None),
        }
    }

    fn child_distances(&self, key: &[u8]) -> Result<Vec<u32>> {
        let blob = self
            .indexes
            .get(&children_distances_key(key))?
            .ok_or_else(|| missing_children(key))?;
        decode_distances(&blob)
    }

    fn load_value(&self, key: &[u8]) -> Result<Bytes> {
        self.values.get(key)?.ok_or_else(|| {
            BkError::Corruption(format!("node '{}' has no stored value", display_key(key)))
        })
    }
}

impl<S: KvStore, D: DistancePolicy> fmt::Debug for BkTree<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BkTree")
            .field("root", &self.root.as_deref().map(display_key))
            .field("cache", &self.cache.is_enabled())
            .field("children_keys", &self.children_keys.is_enabled())
            .finish()
    }
}
