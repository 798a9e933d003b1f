//! Filesystem abstraction for Protokoll.
//!
//! Every component that touches disk goes through [`Storage`], so discovery,
//! configuration merging and the entity store share one read/stat/write surface.

mod local;

pub use local::LocalStorage;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Trait for filesystem backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Whether `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a regular file.
    async fn is_file(&self, path: &Path) -> bool;

    /// Resolve symlinks and relative components. `None` if the path cannot be resolved.
    async fn canonicalize(&self, path: &Path) -> Option<PathBuf>;

    /// Read a file, returning `None` if it does not exist.
    async fn read_optional(&self, path: &Path) -> Result<Option<String>>;

    /// List the regular files directly inside `dir`, sorted by file name.
    ///
    /// A missing directory yields an empty list.
    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Write a file, creating parent directories as needed.
    async fn write(&self, path: &Path, content: &str) -> Result<()>;

    /// Create a directory and all of its parents.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Delete a file.
    async fn remove_file(&self, path: &Path) -> Result<()>;
}
