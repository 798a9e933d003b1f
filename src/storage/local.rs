//! Local filesystem storage backed by `tokio::fs`.

use super::Storage;
use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Storage on the local filesystem.
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn is_file(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        tokio::fs::canonicalize(path).await.ok()
    }

    async fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Follows symlinks, so linked entity files are listed like regular ones.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("Skipping dangling link {}", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
        files.sort();

        Ok(files)
    }

    async fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let content = storage.read_optional(&dir.path().join("nope.yaml")).await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parents_and_lists_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let nested = dir.path().join("a").join("b");

        storage.write(&nested.join("z.yaml"), "z: 1").await.unwrap();
        storage.write(&nested.join("m.yaml"), "m: 1").await.unwrap();
        storage.create_dir_all(&nested.join("sub")).await.unwrap();

        let files = storage.list_files(&nested).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["m.yaml", "z.yaml"]);
        assert!(storage.is_dir(&nested.join("sub")).await);
        assert!(storage.is_file(&nested.join("m.yaml")).await);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let files = storage.list_files(&dir.path().join("missing")).await.unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let shared = dir.path().join("shared").join("jane.yaml");
        let people = dir.path().join("people");

        storage.write(&shared, "id: jane\nname: Jane Smith\n").await.unwrap();
        storage.create_dir_all(&people).await.unwrap();
        std::os::unix::fs::symlink(&shared, people.join("jane.yaml")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.yaml"), people.join("gone.yaml")).unwrap();

        let files = storage.list_files(&people).await.unwrap();
        assert_eq!(files, vec![people.join("jane.yaml")]);
    }
}
