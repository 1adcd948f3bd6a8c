//! Distance policies
//!
//! A distance policy must be a metric over raw keys: non-negative, symmetric,
//! zero exactly when the keys are equal, and obeying the triangle inequality.
//! Query pruning is only correct for metrics.

/// A metric over raw keys
pub trait DistancePolicy: Clone + Send + Sync {
    /// Distance between two keys
    fn distance(&self, a: &[u8], b: &[u8]) -> u32;
}

/// Byte-wise Levenshtein edit distance
#[derive(Clone, Copy, Debug, Default)]
pub struct Levenshtein;

impl DistancePolicy for Levenshtein {
    fn distance(&self, a: &[u8], b: &[u8]) -> u32 {
        edit_distance(a, b)
    }
}

/// Levenshtein distance over Unicode scalar values
///
/// Keys that are not valid UTF-8 are compared byte-wise, which keeps the
/// function a metric as long as a given key is always either valid or not.
#[derive(Clone, Copy, Debug, Default)]
pub struct CharLevenshtein;

impl DistancePolicy for CharLevenshtein {
    fn distance(&self, a: &[u8], b: &[u8]) -> u32 {
        match (std::str::from_utf8(a), std::str::from_utf8(b)) {
            (Ok(a), Ok(b)) => {
                let a: Vec<char> = a.chars().collect();
                let b: Vec<char> = b.chars().collect();
                edit_distance(&a, &b)
            }
            _ => edit_distance(a, b),
        }
    }
}

/// Two-row dynamic programming edit distance
///
/// Saturates at `u32::MAX` for inputs longer than that.
fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> u32 {
    if a.is_empty() {
        return saturating_len(b.len());
    }
    if b.is_empty() {
        return saturating_len(a.len());
    }

    let mut prev: Vec<u32> = (0..=b.len()).map(saturating_len).collect();
    let mut cur = vec![0u32; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        cur[0] = saturating_len(i + 1);
        for (j, y) in b.iter().enumerate() {
            let substitution = prev[j].saturating_add(u32::from(x != y));
            cur[j + 1] = prev[j + 1]
                .saturating_add(1)
                .min(cur[j].saturating_add(1))
                .min(substitution);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()]
}

fn saturating_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
