use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

/// Port for the filesystem evidence the checks look at and the auto-fixer
/// writes to.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> bool;

    /// All regular files below `root`, skipping dependency and VCS
    /// directories.
    async fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>>;

    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()>;
}
