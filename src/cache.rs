//! On-disk cache directory for rendered results.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// A directory of cached files addressed by relative key.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    /// Opens the cache, creating its directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Cache root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every cached file at any depth, sorted.
    pub fn keys(&self) -> Result<Vec<PathBuf>> {
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1) {
            let entry = entry.context("Failed to walk cache directory")?;
            if entry.file_type().is_file() {
                keys.push(entry.into_path());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Removes everything inside the cache but keeps the directory itself.
    pub fn wipe(&self) -> Result<()> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read cache directory: {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Reads a cached entry; `None` when absent.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry: {}", path.display()))?;
        Ok(Some(content))
    }

    /// Stores an entry, creating intermediate directories.
    pub fn write(&self, key: &str, content: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write cache entry: {}", path.display()))
    }

    /// Keys are relative paths that stay inside the cache directory.
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !inside {
            bail!("Invalid cache key: {key:?}");
        }
        Ok(self.dir.join(relative))
    }
}
