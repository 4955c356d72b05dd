//! Git repository operations on a local working copy.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Blob, Repository};
use globset::GlobSet;

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository at the specified path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path.as_ref()).with_context(|| {
            format!("Failed to open git repository: {}", path.as_ref().display())
        })?;

        Ok(Self { repo })
    }

    /// Whether a usable repository exists at `path`.
    pub fn exists_at<P: AsRef<Path>>(path: P) -> bool {
        Repository::open(path.as_ref()).is_ok()
    }

    /// Returns the underlying `git2::Repository`.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// The blob committed at `file` on HEAD.
    pub fn head_blob(&self, file: &Path) -> Result<Blob<'_>> {
        let tree = self
            .repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .context("Failed to resolve HEAD tree")?;
        let entry = tree
            .get_path(file)
            .with_context(|| format!("{} is not committed on HEAD", file.display()))?;
        entry
            .to_object(&self.repo)
            .and_then(|object| object.peel_to_blob())
            .with_context(|| format!("{} is not a file on HEAD", file.display()))
    }

    /// Lists tracked files at any depth under `folder`.
    ///
    /// An empty folder (or `/`) means the repository root. Only regular
    /// blobs are listed; symlinks and submodule entries have no lines to
    /// blame. Files matching `ignore` are dropped after the folder has been
    /// confirmed to exist.
    pub fn tracked_files_under(&self, folder: &str, ignore: &GlobSet) -> Result<Vec<PathBuf>> {
        let folder = folder.trim_matches('/');
        let prefix = (!folder.is_empty()).then(|| format!("{folder}/"));

        let index = self.repo.index().context("Failed to read repository index")?;
        let tracked: Vec<String> = index
            .iter()
            .filter(|entry| is_regular_file(entry.mode))
            .filter_map(|entry| String::from_utf8(entry.path).ok())
            .filter(|path| prefix.as_ref().map_or(true, |p| path.starts_with(p.as_str())))
            .collect();

        // The root always exists; a subfolder must hold something tracked
        if let Some(prefix) = &prefix {
            if tracked.is_empty() {
                anyhow::bail!("No tracked files under folder: {prefix}");
            }
        }

        let mut files: Vec<PathBuf> = tracked
            .into_iter()
            .filter(|path| !ignore.is_match(path))
            .map(PathBuf::from)
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Regular and executable blobs, as opposed to symlinks (`120000`) and
/// gitlinks (`160000`).
fn is_regular_file(mode: u32) -> bool {
    mode & 0o170000 == 0o100000
}
