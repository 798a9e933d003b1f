//! Upward directory discovery.

use crate::storage::Storage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A marker directory found while walking upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDir {
    /// Path of the marker directory itself.
    pub path: PathBuf,
    /// Hops from the starting directory (0 = the starting directory).
    pub level: usize,
}

/// Walk from `start` towards the filesystem root looking for `marker`.
///
/// The start is canonicalized once, so symlinks are resolved before the walk
/// and each step only moves to a lexical parent; the walk cannot revisit a
/// directory. At most `max_levels` directories are examined and the walk stops
/// at the root. Results are nearest first; finding nothing is not an error.
pub async fn discover(
    storage: &dyn Storage,
    start: &Path,
    marker: &str,
    max_levels: usize,
) -> Vec<DiscoveredDir> {
    let mut found = Vec::new();
    let mut current = storage
        .canonicalize(start)
        .await
        .unwrap_or_else(|| start.to_path_buf());

    for level in 0..max_levels {
        let candidate = current.join(marker);
        if storage.is_dir(&candidate).await {
            trace!("Found {} at level {}", candidate.display(), level);
            found.push(DiscoveredDir {
                path: candidate,
                level,
            });
        }

        match current.parent() {
            Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                current = parent.to_path_buf();
            }
            _ => break,
        }
    }

    debug!("Discovered {} marker directories from {}", found.len(), start.display());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[tokio::test]
    async fn test_discover_nearest_first() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let start = root.path().join("a").join("b").join("c");
        storage.create_dir_all(&start).await.unwrap();
        storage.create_dir_all(&root.path().join(".protokoll")).await.unwrap();
        storage
            .create_dir_all(&root.path().join("a").join("b").join(".protokoll"))
            .await
            .unwrap();

        let found = discover(&storage, &start, ".protokoll", 10).await;

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].level, 1);
        assert!(found[0].path.ends_with("a/b/.protokoll"));
        assert_eq!(found[1].level, 3);
        assert!(found[1].level > found[0].level);
    }

    #[tokio::test]
    async fn test_discover_respects_max_levels() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let start = root.path().join("a").join("b");
        storage.create_dir_all(&start).await.unwrap();
        storage.create_dir_all(&root.path().join(".protokoll")).await.unwrap();

        // root is two hops away, so examining two directories never reaches it.
        assert!(discover(&storage, &start, ".protokoll", 2).await.is_empty());
        assert_eq!(discover(&storage, &start, ".protokoll", 3).await.len(), 1);
    }

    #[tokio::test]
    async fn test_discover_nothing_found_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let found = discover(&storage, root.path(), ".no-such-marker-here", 10).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_marker_file_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        storage
            .write(&root.path().join(".protokoll"), "not a directory")
            .await
            .unwrap();

        let found = discover(&storage, root.path(), ".protokoll", 1).await;
        assert!(found.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_start_walks_real_parents() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let real = root.path().join("real").join("project");
        storage.create_dir_all(&real.join(".protokoll")).await.unwrap();
        storage.create_dir_all(&root.path().join("real").join(".protokoll")).await.unwrap();
        std::os::unix::fs::symlink(&real, root.path().join("link")).unwrap();

        let found = discover(&storage, &root.path().join("link"), ".protokoll", 10).await;

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].level, 0);
        assert!(found[1].path.ends_with("real/.protokoll"));
        let unique: std::collections::HashSet<_> = found.iter().map(|d| &d.path).collect();
        assert_eq!(unique.len(), found.len());
    }
}
