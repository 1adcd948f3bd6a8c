//! # bkindex Store
//!
//! Ordered key-value storage layer underneath the bkindex BK-tree.
//!
//! This crate provides:
//! - **KvStore trait**: get, put, delete and all-or-nothing batch writes
//! - **Write batches**: ordered put/delete operations committed atomically
//! - **Memory store**: ordered in-process map for tests and ephemeral indexes
//! - **LMDB store**: persistent, memory-mapped B+tree that pages from disk
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             BK-tree engine              │
//! ├─────────────────────────────────────────┤
//! │              KvStore Trait              │
//! ├────────────────────┬────────────────────┤
//! │   MemoryKvStore    │    LmdbKvStore     │
//! ├────────────────────┴────────────────────┤
//! │        process memory / LMDB env        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bkindex_store::{KvStore, MemoryKvStore, WriteBatch};
//!
//! let store = MemoryKvStore::new();
//! let mut batch = WriteBatch::new();
//! batch.put(b"a", b"1");
//! batch.put(b"b", b"2");
//! store.write(batch).unwrap();
//! assert_eq!(store.get(b"a").unwrap().as_deref(), Some(&b"1"[..]));
//! ```

pub mod batch;
pub mod error;
pub mod lmdb;
pub mod memory;

pub use batch::{BatchOp, WriteBatch};
pub use error::{Result, StoreError};
pub use lmdb::{LmdbKvStore, LmdbStoreOptions};
pub use memory::MemoryKvStore;

use bytes::Bytes;

/// Trait for ordered key-value storage backends
///
/// A missing key is `Ok(None)`, not an error: callers probe for absence as
/// part of normal control flow.
pub trait KvStore: Send + Sync {
    /// Retrieve the value stored under `key`
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Store a single value
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a single key (deleting an absent key is not an error)
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Apply every operation of `batch` or none of them
    fn write(&self, batch: WriteBatch) -> Result<()>;

    /// Check if a key exists
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Longest key the backend accepts, `None` when unbounded
    fn max_key_len(&self) -> Option<usize> {
        None
    }
}
