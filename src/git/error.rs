//! Fetch error handling.

use thiserror::Error;

/// Why a working copy could not be made available.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The remote project exceeds the configured clone ceiling.
    #[error("Project is too large to clone ({size_kb} KB, limit {limit_kb} KB)")]
    TooLarge {
        /// Reported or observed size in KB.
        size_kb: u64,
        /// Configured ceiling in KB.
        limit_kb: u64,
    },

    /// The caller gave up while the transfer was running.
    #[error("Clone was cancelled")]
    Cancelled,

    /// libgit2 failed to clone or open the repository.
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Filesystem failure around the repository store.
    #[error("Repository store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
