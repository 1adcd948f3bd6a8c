//! Materialized views of persisted nodes

use bytes::Bytes;
use std::fmt;

/// An edge from a parent to the child recorded at `distance`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildEdge {
    /// Distance between parent and child
    pub distance: u32,
    /// The child's key
    pub key: Bytes,
}

/// A node as currently persisted
#[derive(Clone, PartialEq, Eq)]
pub struct Node {
    /// The node's key
    pub key: Bytes,
    /// The stored value
    pub value: Bytes,
    /// Children in ascending distance order
    pub children: Vec<ChildEdge>,
}

impl Node {
    /// Check if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child recorded at `distance`, if any
    pub fn child_at(&self, distance: u32) -> Option<&Bytes> {
        self.children
            .binary_search_by_key(&distance, |edge| edge.distance)
            .ok()
            .map(|i| &self.children[i].key)
    }

    /// Children distances in ascending order
    pub fn distances(&self) -> Vec<u32> {
        self.children.iter().map(|edge| edge.distance).collect()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &String::from_utf8_lossy(&self.key))
            .field("value_len", &self.value.len())
            .field("distances", &self.distances())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_lookup() {
        let node = Node {
            key: Bytes::from_static(b"root"),
            value: Bytes::new(),
            children: vec![
                ChildEdge { distance: 1, key: Bytes::from_static(b"a") },
                ChildEdge { distance: 4, key: Bytes::from_static(b"b") },
            ],
        };

        assert!(!node.is_leaf());
        assert_eq!(node.child_at(4), Some(&Bytes::from_static(b"b")));
        assert_eq!(node.child_at(2), None);
        assert_eq!(node.distances(), vec![1, 4]);
    }
}
