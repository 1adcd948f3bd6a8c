//! LMDB-backed persistent store
//!
//! Each store is one LMDB environment in its own directory holding a single
//! unnamed database. Keys are stored behind a one-byte tag so the empty key
//! (the tree's root pointer) is representable; LMDB itself rejects
//! zero-length keys.

use crate::batch::{BatchOp, WriteBatch};
use crate::error::{Result, StoreError};
use crate::KvStore;
use bytes::Bytes;
use heed3::types::Bytes as RawBytes;
use heed3::{Database, Env, EnvOpenOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Name of the LMDB data file inside a store directory
pub const DATA_FILE_NAME: &str = "data.mdb";

/// Longest key accepted, one byte under LMDB's default key limit to leave
/// room for the tag
pub const MAX_KEY_LEN: usize = 510;

/// Default map size: 1 GiB
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const KEY_TAG: u8 = b'k';

/// Options for opening an [`LmdbKvStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LmdbStoreOptions {
    /// Create the directory and environment when missing
    pub create_if_missing: bool,
    /// Upper bound on the environment size in bytes, a multiple of the page size
    pub map_size: usize,
}

impl Default for LmdbStoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            map_size: DEFAULT_MAP_SIZE,
        }
    }
}

impl LmdbStoreOptions {
    /// Fail instead of creating a missing store
    pub fn must_exist(mut self) -> Self {
        self.create_if_missing = false;
        self
    }

    /// Set the map size in bytes
    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }
}

/// Ordered store persisted in an LMDB environment
///
/// Every batch is one write transaction, so it commits entirely or not at
/// all. Reads open a short read transaction and copy the value out.
pub struct LmdbKvStore {
    dir: PathBuf,
    env: Env,
    db: Database<RawBytes, RawBytes>,
}

impl LmdbKvStore {
    /// Open the store in `path`
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, options: LmdbStoreOptions) -> Result<Self> {
        let dir = path.as_ref().to_path_buf();
        if !dir.join(DATA_FILE_NAME).exists() {
            if !options.create_if_missing {
                return Err(StoreError::Missing(dir));
            }
            fs::create_dir_all(&dir)?;
        }

        // SAFETY: the environment is opened once per store and the data file
        // is not modified outside LMDB while it is mapped.
        let env = unsafe { EnvOpenOptions::new().map_size(options.map_size).open(&dir)? };

        let mut wtxn = env.write_txn()?;
        let db = env
            .database_options()
            .types::<RawBytes, RawBytes>()
            .create(&mut wtxn)?;
        wtxn.commit()?;

        debug!(map_size = options.map_size, "lmdb store opened");
        Ok(Self { dir, env, db })
    }

    /// Directory holding the environment
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<u64> {
        let rtxn = self.env.read_txn()?;
        Ok(self.db.len(&rtxn)?)
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> Result<bool> {
        let rtxn = self.env.read_txn()?;
        Ok(self.db.is_empty(&rtxn)?)
    }
}

impl std::fmt::Debug for LmdbKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbKvStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl KvStore for LmdbKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let key = tagged(key)?;
        let rtxn = self.env.read_txn()?;
        let value = self.db.get(&rtxn, key.as_slice())?;
        Ok(value.map(Bytes::copy_from_slice))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.write(batch)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.delete(key);
        self.write(batch)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // dropping the transaction on an early return aborts it
        let mut wtxn = self.env.write_txn()?;
        for op in batch.ops() {
            match op {
                BatchOp::Put { key, value } => {
                    self.db.put(&mut wtxn, tagged(key)?.as_slice(), &value[..])?;
                }
                BatchOp::Delete { key } => {
                    self.db.delete(&mut wtxn, tagged(key)?.as_slice())?;
                }
            }
        }
        wtxn.commit()?;
        Ok(())
    }

    fn max_key_len(&self) -> Option<usize> {
        Some(MAX_KEY_LEN)
    }
}

fn tagged(key: &[u8]) -> Result<Vec<u8>> {
    if key.len() > MAX_KEY_LEN {
        return Err(StoreError::KeyTooLarge {
            size: key.len(),
            max: MAX_KEY_LEN,
        });
    }

    let mut out = Vec::with_capacity(key.len() + 1);
    out.push(KEY_TAG);
    out.extend_from_slice(key);
    Ok(out)
}
