//! Persistent BK-tree
//!
//! Burkhard–Keller trees index a discrete metric space: every child records
//! its distance to the parent, and a range query only descends into children
//! whose recorded distance is compatible with the triangle inequality.
//!
//! Index store layout:
//!
//! ```text
//! ""                   -> root key
//! key ++ 'c'           -> children distances (4-byte big-endian each, ascending)
//! key ++ be32(d)       -> child key at distance d
//! key ++ 'k'           -> aggregated children keys (optional)
//! ```
//!
//! Values live in a separate store under their raw key.

pub mod codec;
mod node;
mod tree;

pub use node::{ChildEdge, Node};
pub use tree::BkTree;

/// Index key holding the root node's key
pub const ROOT_INDEX_KEY: &[u8] = b"";

/// Suffix of a node's children-distances entry
pub const CHILDREN_DISTANCES_MARKER: u8 = b'c';

/// Suffix of a node's aggregated children-keys entry
pub const CHILDREN_KEYS_MARKER: u8 = b'k';

/// Width of one encoded distance
pub const DISTANCE_WIDTH: usize = 4;
