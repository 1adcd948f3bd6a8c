//! # bkindex Core
//!
//! Persistent BK-tree engine for metric range queries over raw byte keys.
//!
//! This crate provides:
//! - **BK-tree**: insert and range query over a tree persisted in two key-value stores
//! - **Distance policies**: byte-wise and character-wise Levenshtein
//! - **Cache policies**: optional LRU cache of parent → child key lookups
//! - **Children-key aggregates**: optional per-parent list of child keys for bulk loads
//! - **Root-overwrite policies**: what to do with stale structure under a new root
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            BkTree (insert/query)        │
//! ├──────────────┬────────────┬─────────────┤
//! │   Distance   │   Cache    │  Children / │
//! │   Policy     │   Policy   │  Overwrite  │
//! ├──────────────┴────────────┴─────────────┤
//! │     Index codec (distances, keys)       │
//! ├────────────────────┬────────────────────┤
//! │    value store     │    index store     │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bkindex_core::BkTree;
//! use bkindex_store::MemoryKvStore;
//! use std::sync::Arc;
//!
//! let mut tree = BkTree::open(
//!     Arc::new(MemoryKvStore::new()),
//!     Arc::new(MemoryKvStore::new()),
//! ).unwrap();
//!
//! tree.insert(b"key1", b"value1").unwrap();
//! tree.insert(b"key2", b"value2").unwrap();
//!
//! let found = tree.query(b"key1", 1000, 10).unwrap();
//! assert_eq!(found.len(), 2);
//! ```

pub mod bktree;
pub mod config;
pub mod distance;
pub mod error;
pub mod policy;

pub use bktree::{BkTree, ChildEdge, Node};
pub use config::{CacheConfig, RootOverwriteMode, TreeConfig};
pub use distance::{CharLevenshtein, DistancePolicy, Levenshtein};
pub use error::{BkError, Result};
pub use policy::{
    CachePolicy, CacheStats, ChildrenKeyPolicy, CleanRootIndexes, DisabledChildrenKeys,
    LengthPrefixedChildrenKeys, LruChildrenCache, NoCache, OverwriteValueOnly,
    RootOverwritePolicy,
};
