//! Aggregated children-key policies
//!
//! When enabled, every parent carries one extra index entry listing all of its
//! children's keys in distance order, so a cache fill costs a single store read
//! instead of one per child.

use crate::error::{BkError, Result};
use bytes::{Buf, BufMut, Bytes};

/// Strategy for encoding a parent's aggregated children keys
pub trait ChildrenKeyPolicy: Send + Sync {
    /// Whether aggregates are maintained at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// Splice `child` into `blob` at position `rank` (its distance's sort rank)
    fn insert(&self, blob: &[u8], child: &[u8], rank: usize) -> Result<Vec<u8>>;

    /// Split `blob` into the child keys it lists, in order
    fn split(&self, blob: &[u8]) -> Result<Vec<Bytes>>;
}

/// No aggregates; children resolve one at a time through their pointers
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledChildrenKeys;

impl ChildrenKeyPolicy for DisabledChildrenKeys {
    fn is_enabled(&self) -> bool {
        false
    }

    fn insert(&self, blob: &[u8], _child: &[u8], _rank: usize) -> Result<Vec<u8>> {
        Ok(blob.to_vec())
    }

    fn split(&self, _blob: &[u8]) -> Result<Vec<Bytes>> {
        Ok(Vec::new())
    }
}

/// Keys stored back to back, each behind a 4-byte big-endian length
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthPrefixedChildrenKeys;

impl ChildrenKeyPolicy for LengthPrefixedChildrenKeys {
    fn insert(&self, blob: &[u8], child: &[u8], rank: usize) -> Result<Vec<u8>> {
        let len = u32::try_from(child.len())
            .map_err(|_| BkError::InvalidKey(format!("key of {} bytes is too long", child.len())))?;

        // byte offset of the rank-th entry
        let mut offset = 0;
        let mut rest = blob;
        for _ in 0..rank {
            let skipped = entry_len(rest)?;
            offset += skipped;
            rest = &rest[skipped..];
        }

        let mut out = Vec::with_capacity(blob.len() + 4 + child.len());
        out.extend_from_slice(&blob[..offset]);
        out.put_u32(len);
        out.extend_from_slice(child);
        out.extend_from_slice(&blob[offset..]);
        Ok(out)
    }

    fn split(&self, blob: &[u8]) -> Result<Vec<Bytes>> {
        let mut keys = Vec::new();
        let mut rest = blob;
        while !rest.is_empty() {
            let len = entry_len(rest)?;
            keys.push(Bytes::copy_from_slice(&rest[4..len]));
            rest = &rest[len..];
        }
        Ok(keys)
    }
}

/// Total length (prefix included) of the entry at the start of `buf`
fn entry_len(mut buf: &[u8]) -> Result<usize> {
    let total = buf.len();
    if total < 4 {
        return Err(BkError::Corruption(
            "children keys blob ends inside a length prefix".into(),
        ));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(BkError::Corruption(format!(
            "children keys entry of {len} bytes overruns blob of {total} bytes"
        )));
    }
    Ok(4 + len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[(&str, usize)]) -> Vec<u8> {
        let policy = LengthPrefixedChildrenKeys;
        keys.iter().fold(Vec::new(), |blob, (key, rank)| {
            policy.insert(&blob, key.as_bytes(), *rank).unwrap()
        })
    }

    #[test]
    fn test_insert_at_rank() {
        // arrival order differs from distance order
        let blob = build(&[("five", 0), ("two", 0), ("nine", 2), ("seven", 2)]);
        let keys = LengthPrefixedChildrenKeys.split(&blob).unwrap();
        assert_eq!(
            keys,
            vec![
                Bytes::from_static(b"two"),
                Bytes::from_static(b"five"),
                Bytes::from_static(b"seven"),
                Bytes::from_static(b"nine"),
            ]
        );
    }

    #[test]
    fn test_split_empty_blob() {
        assert!(LengthPrefixedChildrenKeys.split(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_rank_past_end_is_corruption() {
        let blob = build(&[("a", 0)]);
        assert!(matches!(
            LengthPrefixedChildrenKeys.insert(&blob, b"b", 2),
            Err(BkError::Corruption(_))
        ));
    }

    #[test]
    fn test_truncated_blob_is_corruption() {
        let blob = build(&[("abc", 0)]);
        assert!(matches!(
            LengthPrefixedChildrenKeys.split(&blob[..5]),
            Err(BkError::Corruption(_))
        ));
        assert!(matches!(
            LengthPrefixedChildrenKeys.split(&blob[..2]),
            Err(BkError::Corruption(_))
        ));
    }

    #[test]
    fn test_disabled_policy_is_inert() {
        let policy = DisabledChildrenKeys;
        assert!(!policy.is_enabled());
        assert_eq!(policy.insert(b"", b"child", 0).unwrap(), Vec::<u8>::new());
        assert!(policy.split(b"anything").unwrap().is_empty());
    }
}
