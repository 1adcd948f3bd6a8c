//! Root-overwrite policies
//!
//! Consulted when a key is installed as the root of an empty tree but the index
//! still holds a non-empty children list for it, left over from an earlier
//! life of the tree.

use crate::bktree::codec::{child_index_key, children_distances_key, children_keys_key};
use bkindex_store::WriteBatch;

/// Strategy for reconciling stale index data under a new root key
pub trait RootOverwritePolicy: Send + Sync {
    /// Add whatever cleanup is needed to `batch`
    ///
    /// `batch` also carries the root pointer update and is committed
    /// atomically after this returns.
    fn reconcile(&self, root: &[u8], stale_distances: &[u32], batch: &mut WriteBatch);
}

/// Drop the stale subtree so the new root starts empty
#[derive(Clone, Copy, Debug, Default)]
pub struct CleanRootIndexes;

impl RootOverwritePolicy for CleanRootIndexes {
    fn reconcile(&self, root: &[u8], stale_distances: &[u32], batch: &mut WriteBatch) {
        batch.put(children_distances_key(root), b"");
        batch.put(children_keys_key(root), b"");
        for &d in stale_distances {
            batch.delete(child_index_key(root, d));
        }
    }
}

/// Keep the existing subtree and only replace the value and root pointer
///
/// Only correct when the leftover structure is known to be consistent with
/// the tree being rebuilt.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverwriteValueOnly;

impl RootOverwritePolicy for OverwriteValueOnly {
    fn reconcile(&self, _root: &[u8], _stale_distances: &[u32], _batch: &mut WriteBatch) {}
}
