//! Error types for the bkindex-store crate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// LMDB environment or transaction failure
    #[error("lmdb error: {0}")]
    Lmdb(#[from] heed3::Error),

    /// Store location does not exist and creation was not requested
    #[error("store does not exist: {}", .0.display())]
    Missing(PathBuf),

    /// Key is longer than the backend can index
    #[error("key too large: {size} bytes exceeds maximum {max} bytes")]
    KeyTooLarge { size: usize, max: usize },
}
