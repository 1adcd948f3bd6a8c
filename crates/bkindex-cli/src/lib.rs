//! # bkindex CLI
//!
//! Command-line access to a persistent BK-tree kept in two LMDB stores.
//!
//! ```text
//! bkindex insert <key> <value>
//! bkindex query <key> [--threshold N] [--limit N] [--radius N]
//! bkindex reset
//! ```

pub mod config;

pub use config::CliConfig;

use anyhow::Context;
use bkindex_core::{BkTree, Levenshtein};
use bkindex_store::LmdbKvStore;

/// A tree over the configured LMDB stores
pub type DiskTree = BkTree<LmdbKvStore, Levenshtein>;

/// Open the tree described by `config`
pub fn open_tree(config: &CliConfig) -> anyhow::Result<DiskTree> {
    BkTree::open_paths(
        &config.values_dir,
        &config.index_dir,
        config.store_options(),
        Levenshtein,
        &config.tree,
    )
    .with_context(|| {
        format!(
            "failed to open tree at {} / {}",
            config.values_dir.display(),
            config.index_dir.display()
        )
    })
}

/// Insert or overwrite `key`
pub fn insert(tree: &mut DiskTree, key: &str, value: &str) -> anyhow::Result<()> {
    tree.insert(key.as_bytes(), value.as_bytes())
        .with_context(|| format!("failed to insert '{key}'"))
}

/// Values of keys closer than `radius` to `key`, rendered as text
pub fn query(
    tree: &DiskTree,
    key: &str,
    threshold: u32,
    limit: usize,
    radius: Option<u32>,
) -> anyhow::Result<Vec<String>> {
    let values = tree
        .query_with_radius(key.as_bytes(), threshold, limit, radius.unwrap_or(threshold))
        .with_context(|| format!("failed to query '{key}'"))?;
    Ok(values
        .iter()
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn temp_config(dir: &tempfile::TempDir) -> CliConfig {
        CliConfig {
            values_dir: dir.path().join("values"),
            index_dir: dir.path().join("index"),
            map_size_mb: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        let mut tree = open_tree(&config).unwrap();
        insert(&mut tree, "key1", "value1").unwrap();
        insert(&mut tree, "key2", "value2").unwrap();

        let found = query(&tree, "key1", 1000, 10, None).unwrap();
        assert_eq!(found, vec!["value1".to_string(), "value2".to_string()]);
    }

    #[rstest]
    #[case(1, None, vec!["value1"])]
    #[case(2, None, vec!["value1", "value2"])]
    #[case(0, Some(2), vec!["value1"])]
    fn test_query_radius(
        #[case] threshold: u32,
        #[case] radius: Option<u32>,
        #[case] expected: Vec<&str>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = open_tree(&temp_config(&dir)).unwrap();
        insert(&mut tree, "key1", "value1").unwrap();
        insert(&mut tree, "key2", "value2").unwrap();

        assert_eq!(query(&tree, "key1", threshold, 10, radius).unwrap(), expected);
    }

    #[test]
    fn test_overwrite_and_reset_persist() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        {
            let mut tree = open_tree(&config).unwrap();
            insert(&mut tree, "key1", "value1").unwrap();
            insert(&mut tree, "key1", "value1b").unwrap();
        }

        let mut tree = open_tree(&config).unwrap();
        assert_eq!(query(&tree, "key1", 1, 10, None).unwrap(), vec!["value1b"]);

        tree.reset().unwrap();
        drop(tree);
        let tree = open_tree(&config).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_empty_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = open_tree(&temp_config(&dir)).unwrap();
        let err = insert(&mut tree, "", "v").unwrap_err();
        assert!(err.to_string().contains("failed to insert"));
    }

    #[test]
    fn test_missing_store_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            create_if_missing: false,
            ..temp_config(&dir)
        };
        let err = open_tree(&config).unwrap_err();
        assert!(err.to_string().contains("failed to open tree"));
    }
}
