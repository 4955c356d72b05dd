//! Working copies: fetching, walking, and blaming.
//!
//! The traits here are the seams the appraisal pipeline talks through; the
//! submodules provide the git2-backed implementations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::contributions::CodeLine;
use crate::store::ProjectReference;

pub mod blame;
pub mod error;
pub mod fetcher;
pub mod repository;

pub use blame::GitBlameReader;
pub use error::FetchError;
pub use fetcher::GitFetcher;
pub use repository::GitRepository;

/// Handle to a local checkout of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    /// `owner/name` of the project.
    pub fullname: String,
    /// Root directory of the checkout.
    pub path: PathBuf,
}

impl WorkingCopy {
    /// Creates a handle.
    pub fn new(fullname: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            fullname: fullname.into(),
            path: path.into(),
        }
    }

    /// Absolute path of a file inside the checkout.
    pub fn join(&self, relative: &Path) -> PathBuf {
        self.path.join(relative)
    }
}

/// Cooperative cancellation shared between a caller and a blocking fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an untripped flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns a guard that trips the flag when dropped.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

/// Trips its [`CancelFlag`] on drop, e.g. when an awaiting future is dropped.
#[derive(Debug)]
pub struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Makes a project available locally.
pub trait SourceFetcher: Send + Sync {
    /// Returns the local copy, cloning it first if absent.
    ///
    /// Must be a no-op when the copy already exists, and must stop promptly
    /// once `cancel` is tripped.
    fn ensure_local(
        &self,
        project: &ProjectReference,
        cancel: &CancelFlag,
    ) -> Result<WorkingCopy, FetchError>;
}

/// Enumerates files beneath a folder of a working copy.
pub trait FolderWalker: Send + Sync {
    /// Lists files at any depth beneath `folder` (empty for the root), as
    /// paths relative to the working copy root. Unknown folders are errors.
    fn files_under(&self, copy: &WorkingCopy, folder: &str) -> Result<Vec<PathBuf>>;
}

/// Reads per-line authorship.
pub trait BlameReader: Send + Sync {
    /// Returns one [`CodeLine`] per physical line of `file`.
    fn lines_for(&self, copy: &WorkingCopy, file: &Path) -> Result<Vec<CodeLine>>;
}
