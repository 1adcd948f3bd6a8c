//! Basic usage example for bkindex
//!
//! This example demonstrates:
//! - Opening a tree over two on-disk LMDB stores
//! - Inserting keys and overwriting a value
//! - Range queries with different thresholds
//! - Reopening the stores and querying again
//!
//! Run with: cargo run --example basic_usage

use bkindex_core::{BkTree, Levenshtein, TreeConfig};
use bkindex_store::LmdbStoreOptions;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let dir = std::env::temp_dir().join(format!("bkindex-demo-{}", std::process::id()));
    let values_dir = dir.join("values");
    let index_dir = dir.join("index");
    let config = TreeConfig::default().with_default_cache().with_children_keys(true);

    println!("Opening tree under {}", dir.display());
    {
        let mut tree = BkTree::open_paths(
            &values_dir,
            &index_dir,
            LmdbStoreOptions::default(),
            Levenshtein,
            &config,
        )?;

        for word in ["book", "books", "cake", "boo", "cape", "cart", "boon", "cook"] {
            tree.insert(word.as_bytes(), format!("definition of {word}").as_bytes())?;
        }
        tree.insert(b"cake", b"a sweet baked food")?;

        for threshold in [1, 2, 3] {
            let found = tree.query(b"bock", threshold, 10)?;
            println!("\nwithin {threshold} of 'bock':");
            for value in &found {
                println!("   - {}", String::from_utf8_lossy(value));
            }
        }
    }

    println!("\nReopening...");
    let tree = BkTree::open_paths(
        &values_dir,
        &index_dir,
        LmdbStoreOptions::default().must_exist(),
        Levenshtein,
        &config,
    )?;
    println!("root: {:?}", tree.root_key());
    for value in tree.query(b"cake", 1, 10)? {
        println!("   - {}", String::from_utf8_lossy(&value));
    }

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
