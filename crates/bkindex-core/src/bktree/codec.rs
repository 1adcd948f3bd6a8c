//! Index key layout and distance list encoding
//!
//! Distances are stored as fixed 4-byte big-endian integers so a children
//! list is a flat concatenation with no delimiters, and byte order matches
//! numeric order.

use super::{CHILDREN_DISTANCES_MARKER, CHILDREN_KEYS_MARKER, DISTANCE_WIDTH};
use crate::error::{display_key, BkError, Result};
use std::ops::Range;

/// Encode a distance as 4 big-endian bytes
pub fn encode_distance(distance: u32) -> [u8; DISTANCE_WIDTH] {
    distance.to_be_bytes()
}

/// Decode a single encoded distance
pub fn decode_distance(bytes: &[u8]) -> Result<u32> {
    let raw: [u8; DISTANCE_WIDTH] = bytes.try_into().map_err(|_| {
        BkError::Corruption(format!(
            "distance must be {DISTANCE_WIDTH} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(u32::from_be_bytes(raw))
}

/// Decode a children-distances blob into its ascending distances
pub fn decode_distances(blob: &[u8]) -> Result<Vec<u32>> {
    if blob.len() % DISTANCE_WIDTH != 0 {
        return Err(BkError::Corruption(format!(
            "children distances blob of {} bytes is not a multiple of {DISTANCE_WIDTH}",
            blob.len()
        )));
    }
    blob.chunks_exact(DISTANCE_WIDTH).map(decode_distance).collect()
}

/// Splice `distance` into a children-distances blob at its sorted position
///
/// Returns the new blob and the rank of the inserted distance (the number of
/// smaller distances already present).
pub fn insert_distance(blob: &[u8], distance: u32) -> Result<(Vec<u8>, usize)> {
    let distances = decode_distances(blob)?;
    let rank = distances.partition_point(|&d| d < distance);
    if distances.get(rank) == Some(&distance) {
        return Err(BkError::Corruption(format!(
            "distance {distance} already listed among children"
        )));
    }

    let pos = rank * DISTANCE_WIDTH;
    let mut spliced = Vec::with_capacity(blob.len() + DISTANCE_WIDTH);
    spliced.extend_from_slice(&blob[..pos]);
    spliced.extend_from_slice(&encode_distance(distance));
    spliced.extend_from_slice(&blob[pos..]);
    Ok((spliced, rank))
}

/// Index range of the children that can lie within `threshold` of the query
///
/// `d` is the distance between the parent and the query key. By the triangle
/// inequality a child at recorded distance `c` can only match when
/// `d - threshold <= c <= d + threshold`.
pub fn window(distances: &[u32], d: u32, threshold: u32) -> Range<usize> {
    let lo = d.saturating_sub(threshold);
    let hi = d.saturating_add(threshold);
    let start = distances.partition_point(|&c| c < lo);
    let end = distances.partition_point(|&c| c <= hi);
    start..end.max(start)
}

/// Key of the children-distances list of `key`
pub fn children_distances_key(key: &[u8]) -> Vec<u8> {
    suffixed(key, &[CHILDREN_DISTANCES_MARKER])
}

/// Key of the child pointer of `key` at `distance`
pub fn child_index_key(key: &[u8], distance: u32) -> Vec<u8> {
    suffixed(key, &encode_distance(distance))
}

/// Key of the aggregated children keys of `key`
pub fn children_keys_key(key: &[u8]) -> Vec<u8> {
    suffixed(key, &[CHILDREN_KEYS_MARKER])
}

/// Reject keys that collide with the root pointer
pub fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(BkError::InvalidKey(
            "empty key is reserved for the root pointer".into(),
        ));
    }
    Ok(())
}

/// Error for a reachable node whose children list is absent
pub(crate) fn missing_children(key: &[u8]) -> BkError {
    BkError::Corruption(format!(
        "node '{}' has no children distances record",
        display_key(key)
    ))
}

fn suffixed(key: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + suffix.len());
    out.extend_from_slice(key);
    out.extend_from_slice(suffix);
    out
}
