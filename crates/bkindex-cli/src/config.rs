//! CLI configuration

use bkindex_core::TreeConfig;
use bkindex_store::LmdbStoreOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables read by [`CliConfig::load`]
pub const ENV_PREFIX: &str = "BKINDEX";

/// Settings for opening a tree from the command line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory of the value store
    pub values_dir: PathBuf,
    /// Directory of the index store
    pub index_dir: PathBuf,
    /// Create missing store directories
    pub create_if_missing: bool,
    /// Maximum size of each store in MiB
    pub map_size_mb: usize,
    /// Tree behavior
    pub tree: TreeConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            values_dir: PathBuf::from("bkindex-data/values"),
            index_dir: PathBuf::from("bkindex-data/index"),
            create_if_missing: true,
            map_size_mb: 1024,
            tree: TreeConfig::default(),
        }
    }
}

impl CliConfig {
    /// Layer defaults, an optional TOML file and `BKINDEX_*` variables
    ///
    /// Nested fields use a double underscore, e.g.
    /// `BKINDEX_TREE__CHILDREN_KEYS=true`.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Options for both LMDB stores
    pub fn store_options(&self) -> LmdbStoreOptions {
        LmdbStoreOptions {
            create_if_missing: self.create_if_missing,
            map_size: self.map_size_mb.saturating_mul(1024 * 1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkindex_core::{CacheConfig, RootOverwriteMode};
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = CliConfig::load(None).unwrap();
        assert_eq!(config.index_dir, CliConfig::default().index_dir);
        assert_eq!(config.tree, TreeConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
values_dir = "/tmp/v"
map_size_mb = 64

[tree]
children_keys = true
root_overwrite = "value_only"

[tree.cache]
kind = "lru"
capacity = 32
"#
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.values_dir, PathBuf::from("/tmp/v"));
        assert_eq!(config.map_size_mb, 64);
        assert!(config.tree.children_keys);
        assert_eq!(config.tree.root_overwrite, RootOverwriteMode::ValueOnly);
        assert_eq!(config.tree.cache, CacheConfig::Lru { capacity: 32 });
        assert_eq!(config.store_options().map_size, 64 << 20);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(CliConfig::load(Some(Path::new("/nonexistent/bkindex.toml"))).is_err());
    }
}
