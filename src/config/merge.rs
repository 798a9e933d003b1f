//! Hierarchical configuration merging.
//!
//! Configuration documents from every discovered directory are folded into a
//! single YAML tree. Ancestors are applied first so that directories closer to
//! the starting point override them.

use crate::context::DiscoveredDir;
use crate::error::{ProtokollError, Result};
use crate::storage::Storage;
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::debug;

/// Result of merging the configuration hierarchy.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Deep-merged configuration document.
    pub config: Value,
    /// Knowledge directories, nearest first.
    pub context_dirs: Vec<PathBuf>,
}

/// Recursively merge `overlay` into `base`.
///
/// Mappings merge key by key. Anything else in `overlay` (scalars, sequences,
/// null, or a mapping meeting a non-mapping) replaces the value in `base`.
/// Sequences are replaced, never concatenated.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge the configuration files of the discovered directories on top of `base`.
///
/// A missing or empty file contributes nothing. A file that does not parse, or
/// whose top level is not a mapping, is an error naming that file.
pub async fn merge(
    storage: &dyn Storage,
    discovered: &[DiscoveredDir],
    config_file: &str,
    context_dir: &str,
    base: Value,
) -> Result<MergedConfig> {
    let mut ordered: Vec<&DiscoveredDir> = discovered.iter().collect();
    ordered.sort_by(|a, b| b.level.cmp(&a.level));

    let mut config = match base {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    };

    for dir in ordered {
        let path = dir.path.join(config_file);
        let Some(content) = storage.read_optional(&path).await? else {
            continue;
        };

        let document: Value =
            serde_yaml::from_str(&content).map_err(|e| ProtokollError::parse(&path, e))?;

        match document {
            Value::Null => continue,
            Value::Mapping(_) => {
                debug!("Merging config from {} (level {})", path.display(), dir.level);
                deep_merge(&mut config, document);
            }
            _ => {
                return Err(ProtokollError::Config(format!(
                    "{} must contain a mapping at the top level",
                    path.display()
                )))
            }
        }
    }

    let mut context_dirs = Vec::new();
    for dir in discovered {
        let candidate = dir.path.join(context_dir);
        if storage.is_dir(&candidate).await {
            context_dirs.push(candidate);
        }
    }

    Ok(MergedConfig {
        config,
        context_dirs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_deep_merge_nested_keys() {
        let mut base = yaml("a: 1\nb:\n  x: 1\n");
        deep_merge(&mut base, yaml("b:\n  y: 2\nc: 3\n"));
        assert_eq!(base, yaml("a: 1\nb:\n  x: 1\n  y: 2\nc: 3\n"));
    }

    #[test]
    fn test_deep_merge_arrays_replace() {
        let mut base = yaml("tags: [a, b]\n");
        deep_merge(&mut base, yaml("tags: [c]\n"));
        assert_eq!(base, yaml("tags: [c]\n"));
    }

    #[test]
    fn test_deep_merge_type_mismatch_replaces() {
        let mut base = yaml("a:\n  x: 1\nb: 2\n");
        deep_merge(&mut base, yaml("a: flat\nb:\n  y: 3\n"));
        assert_eq!(base, yaml("a: flat\nb:\n  y: 3\n"));
    }

    fn discovered(root: &std::path::Path, rel: &str, level: usize) -> DiscoveredDir {
        DiscoveredDir {
            path: root.join(rel),
            level,
        }
    }

    #[tokio::test]
    async fn test_merge_nearest_wins() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let far = discovered(root.path(), ".protokoll", 2);
        let near = discovered(root.path(), "a/b/.protokoll", 0);
        storage
            .write(&far.path.join("config.yaml"), "a: 1\nb:\n  x: 1\n")
            .await
            .unwrap();
        storage
            .write(&near.path.join("config.yaml"), "b:\n  y: 2\nc: 3\n")
            .await
            .unwrap();
        storage.create_dir_all(&near.path.join("context")).await.unwrap();
        storage.create_dir_all(&far.path.join("context")).await.unwrap();

        // Deliberately pass nearest first; merge must still apply ancestors first.
        let merged = merge(&storage, &[near.clone(), far.clone()], "config.yaml", "context", Value::Null)
            .await
            .unwrap();

        assert_eq!(merged.config, yaml("a: 1\nb:\n  x: 1\n  y: 2\nc: 3\n"));
        assert_eq!(
            merged.context_dirs,
            vec![near.path.join("context"), far.path.join("context")]
        );
    }

    #[tokio::test]
    async fn test_merge_skips_missing_and_empty_files() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let empty = discovered(root.path(), "x/.protokoll", 0);
        let missing = discovered(root.path(), ".protokoll", 1);
        storage.write(&empty.path.join("config.yaml"), "").await.unwrap();
        storage.create_dir_all(&missing.path).await.unwrap();

        let merged = merge(&storage, &[empty, missing], "config.yaml", "context", yaml("k: v\n"))
            .await
            .unwrap();

        assert_eq!(merged.config, yaml("k: v\n"));
        assert!(merged.context_dirs.is_empty());
    }

    #[tokio::test]
    async fn test_merge_reports_malformed_file() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let dir = discovered(root.path(), ".protokoll", 0);
        storage
            .write(&dir.path.join("config.yaml"), "a: [1, 2\n")
            .await
            .unwrap();

        let err = merge(&storage, &[dir], "config.yaml", "context", Value::Null)
            .await
            .unwrap_err();
        match err {
            ProtokollError::Parse { path, .. } => assert!(path.ends_with("config.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
