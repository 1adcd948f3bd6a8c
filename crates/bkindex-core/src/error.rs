//! Error types for the bkindex-core crate

use thiserror::Error;

/// Result type alias using `BkError`
pub type Result<T> = std::result::Result<T, BkError>;

/// Errors that can occur in BK-tree operations
#[derive(Error, Debug)]
pub enum BkError {
    /// Store error
    #[error("storage failure: {0}")]
    Storage(#[from] bkindex_store::StoreError),

    /// Key cannot be used as a node key
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Persisted index data contradicts the tree invariants
    #[error("index corruption: {0}")]
    Corruption(String),

    /// A policy object broke its contract
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),
}

/// Render a raw key for error messages and logs
pub(crate) fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
