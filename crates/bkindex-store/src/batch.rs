//! Atomic write batches

use bytes::Bytes;

/// A single operation inside a batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Set `key` to `value`
    Put { key: Bytes, value: Bytes },
    /// Remove `key`
    Delete { key: Bytes },
}

impl BatchOp {
    /// The key this operation touches
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// An ordered list of operations applied all-or-nothing
///
/// Later operations on the same key win, matching the order they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put
    pub fn put(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> &mut Self {
        self.ops.push(BatchOp::Put {
            key: Bytes::copy_from_slice(key.as_ref()),
            value: Bytes::copy_from_slice(value.as_ref()),
        });
        self
    }

    /// Queue a delete
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> &mut Self {
        self.ops.push(BatchOp::Delete {
            key: Bytes::copy_from_slice(key.as_ref()),
        });
        self
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queued operations in insertion order
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_order() {
        let mut batch = WriteBatch::new();
        batch.put(b"a", b"1").delete(b"b").put(b"a", b"2");

        assert_eq!(batch.len(), 3);
        let keys: Vec<&[u8]> = batch.ops().iter().map(BatchOp::key).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..], &b"a"[..]]);
        assert!(matches!(
            &batch.ops()[2],
            BatchOp::Put { value, .. } if value.as_ref() == b"2"
        ));
    }

    #[test]
    fn test_empty_batch() {
        let batch = WriteBatch::new();
        assert!(batch.is_empty());
        assert!(batch.ops().is_empty());
    }
}
