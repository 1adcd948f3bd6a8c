//! Pluggable strategies consulted by the BK-tree engine
//!
//! Each role is a trait injected into the tree at construction:
//! - [`CachePolicy`]: caches parent → (distance → child key) lookups
//! - [`ChildrenKeyPolicy`]: maintains a per-parent aggregate of child keys
//! - [`RootOverwritePolicy`]: reconciles stale index data under a new root
//!
//! The distance metric lives in [`crate::distance`].

mod cache;
mod children;
mod overwrite;

pub use cache::{
    CachePolicy, CacheStats, LoadAll, LoadOne, LruChildrenCache, NoCache, DEFAULT_CACHE_CAPACITY,
};
pub use children::{ChildrenKeyPolicy, DisabledChildrenKeys, LengthPrefixedChildrenKeys};
pub use overwrite::{CleanRootIndexes, OverwriteValueOnly, RootOverwritePolicy};
