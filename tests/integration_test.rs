//! Integration tests for bkindex
//!
//! These tests run the BK-tree over on-disk LMDB stores end to end.

use bkindex_core::{BkError, BkTree, Levenshtein, RootOverwriteMode, TreeConfig};
use bkindex_store::{KvStore, LmdbKvStore, LmdbStoreOptions};
use bytes::Bytes;
use rstest::rstest;
use std::collections::BTreeSet;
use std::path::Path;

fn open(dir: &Path, config: &TreeConfig) -> BkTree<LmdbKvStore> {
    BkTree::open_paths(
        dir.join("values"),
        dir.join("index"),
        LmdbStoreOptions::default().with_map_size(64 << 20),
        Levenshtein,
        config,
    )
    .unwrap()
}

fn values(items: &[&'static str]) -> BTreeSet<Bytes> {
    items.iter().map(|v| Bytes::from_static(v.as_bytes())).collect()
}

/// Test the two-key scenario survives a restart
#[rstest]
#[case::plain(TreeConfig::default())]
#[case::cached(TreeConfig::default().with_default_cache().with_children_keys(true))]
fn test_tree_survives_reopen(#[case] config: TreeConfig) {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut tree = open(dir.path(), &config);
        tree.insert(b"key1", b"value1").unwrap();
        tree.insert(b"key2", b"value2").unwrap();
    }

    let mut tree = open(dir.path(), &config);
    assert_eq!(tree.root_key(), Some(&Bytes::from_static(b"key1")));
    assert_eq!(
        tree.query(b"key1", 1000, 10).unwrap(),
        values(&["value1", "value2"])
    );

    // overwrite after reopen keeps the structure
    tree.insert(b"key1", b"value1b").unwrap();
    let root = tree.node(b"key1").unwrap().unwrap();
    assert_eq!(root.distances(), vec![1]);
    assert_eq!(
        tree.query(b"key1", 1000, 10).unwrap(),
        values(&["value1b", "value2"])
    );
}

/// Test a few thousand keys are all found again after a restart
#[test]
fn test_many_keys_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = TreeConfig::default().with_children_keys(true);
    let keys: Vec<String> = (0..3_000u32).map(|i| format!("word-{:05}", i * 7919 % 100_003)).collect();
    {
        let mut tree = open(dir.path(), &config);
        for key in &keys {
            tree.insert(key.as_bytes(), key.to_uppercase().as_bytes()).unwrap();
        }
    }

    let tree = open(dir.path(), &config);
    assert_eq!(tree.nodes().unwrap().len(), keys.len());
    assert!(!tree.index_store().is_empty().unwrap());
    for key in keys.iter().step_by(97) {
        let found = tree.query(key.as_bytes(), 1, 1).unwrap();
        assert_eq!(found, BTreeSet::from([Bytes::from(key.to_uppercase())]));
    }
}

/// Test reset followed by a new root under both overwrite modes
#[rstest]
#[case::clean(RootOverwriteMode::Clean, &["new-root"])]
#[case::value_only(RootOverwriteMode::ValueOnly, &["new-root", "value2"])]
fn test_reset_then_reinsert_root(
    #[case] mode: RootOverwriteMode,
    #[case] expected: &[&'static str],
) {
    let dir = tempfile::tempdir().unwrap();
    let config = TreeConfig::default().with_root_overwrite(mode);
    {
        let mut tree = open(dir.path(), &config);
        tree.insert(b"key1", b"value1").unwrap();
        tree.insert(b"key2", b"value2").unwrap();
        tree.reset().unwrap();
    }

    let mut tree = open(dir.path(), &config);
    assert!(tree.is_empty());
    tree.insert(b"key1", b"new-root").unwrap();

    assert_eq!(tree.query(b"key1", 1000, 10).unwrap(), values(expected));
}

/// Test keys from a reset tree come back as fresh leaves across a restart
#[test]
fn test_reset_then_reinsert_old_child() {
    let dir = tempfile::tempdir().unwrap();
    let config = TreeConfig::default();
    {
        let mut tree = open(dir.path(), &config);
        tree.insert(b"a", b"A").unwrap();
        tree.insert(b"ab", b"AB").unwrap();
        tree.insert(b"ac", b"AC").unwrap();
        tree.reset().unwrap();
        tree.insert(b"x", b"X").unwrap();
        tree.insert(b"ab", b"AB2").unwrap();
    }

    let mut tree = open(dir.path(), &config);
    tree.insert(b"ae", b"AE").unwrap();
    assert_eq!(
        tree.query(b"ae", 10, 100).unwrap(),
        values(&["X", "AB2", "AE"])
    );
}

/// Test keys are bounded so their index entries fit in LMDB
#[test]
fn test_oversized_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = open(dir.path(), &TreeConfig::default());
    tree.insert(b"root", b"r").unwrap();

    // the longest key still gets child pointers of its own
    let longest = vec![b'z'; 506];
    let mut sibling = longest.clone();
    sibling[0] = b'y';
    tree.insert(&longest, b"long").unwrap();
    tree.insert(&sibling, b"sibling").unwrap();
    assert_eq!(tree.node(&longest).unwrap().unwrap().distances().len(), 1);

    let too_long = vec![b'z'; 507];
    assert!(matches!(
        tree.insert(&too_long, b"v"),
        Err(BkError::InvalidKey(_))
    ));
    assert!(!tree.value_store().contains(&too_long).unwrap());
    assert_eq!(tree.nodes().unwrap().len(), 3);
}
