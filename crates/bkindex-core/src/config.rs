//! Tree configuration

use crate::policy::{
    CachePolicy, ChildrenKeyPolicy, CleanRootIndexes, DisabledChildrenKeys,
    LengthPrefixedChildrenKeys, LruChildrenCache, NoCache, OverwriteValueOnly,
    RootOverwritePolicy, DEFAULT_CACHE_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Child-key cache selection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheConfig {
    /// No caching
    #[default]
    Disabled,
    /// LRU cache of at most `capacity` parents
    Lru { capacity: usize },
}

/// Root-overwrite strategy selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootOverwriteMode {
    /// Delete stale child pointers under the new root
    #[default]
    Clean,
    /// Keep stale structure, replace value and root pointer only
    ValueOnly,
}

/// Configuration for BK-tree behavior
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Child-key cache
    pub cache: CacheConfig,
    /// Maintain per-parent children-key aggregates
    pub children_keys: bool,
    /// What to do with stale index data under a new root
    pub root_overwrite: RootOverwriteMode,
}

impl TreeConfig {
    /// Enable an LRU cache of `capacity` parents
    pub fn with_lru_cache(mut self, capacity: usize) -> Self {
        self.cache = CacheConfig::Lru { capacity };
        self
    }

    /// Enable an LRU cache with the default capacity
    pub fn with_default_cache(self) -> Self {
        self.with_lru_cache(DEFAULT_CACHE_CAPACITY)
    }

    /// Toggle children-key aggregates
    pub fn with_children_keys(mut self, enabled: bool) -> Self {
        self.children_keys = enabled;
        self
    }

    /// Set the root-overwrite strategy
    pub fn with_root_overwrite(mut self, mode: RootOverwriteMode) -> Self {
        self.root_overwrite = mode;
        self
    }

    pub(crate) fn cache_policy(&self) -> Arc<dyn CachePolicy> {
        match self.cache {
            CacheConfig::Disabled => Arc::new(NoCache),
            CacheConfig::Lru { capacity } => Arc::new(LruChildrenCache::new(capacity)),
        }
    }

    pub(crate) fn children_key_policy(&self) -> Arc<dyn ChildrenKeyPolicy> {
        if self.children_keys {
            Arc::new(LengthPrefixedChildrenKeys)
        } else {
            Arc::new(DisabledChildrenKeys)
        }
    }

    pub(crate) fn root_overwrite_policy(&self) -> Arc<dyn RootOverwritePolicy> {
        match self.root_overwrite {
            RootOverwriteMode::Clean => Arc::new(CleanRootIndexes),
            RootOverwriteMode::ValueOnly => Arc::new(OverwriteValueOnly),
        }
    }
}
