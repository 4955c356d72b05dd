//! Per-line authorship from git blame.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use super::repository::GitRepository;
use super::{BlameReader, FolderWalker, WorkingCopy};
use crate::contributions::{CodeLine, ContributorIdentity};

/// Blame reader and folder walker backed by libgit2.
///
/// Stateless apart from its ignore patterns; each call opens its own
/// repository handle, so one reader can serve many threads at once.
#[derive(Debug, Clone)]
pub struct GitBlameReader {
    ignore: GlobSet,
}

impl Default for GitBlameReader {
    fn default() -> Self {
        Self {
            ignore: GlobSet::empty(),
        }
    }
}

impl GitBlameReader {
    /// Creates a reader that walks every tracked file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader that skips files matching any of `patterns`.
    pub fn with_ignore(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid ignore pattern: {pattern}"))?;
            builder.add(glob);
        }
        let ignore = builder.build().context("Failed to build ignore patterns")?;

        Ok(Self { ignore })
    }
}

impl FolderWalker for GitBlameReader {
    fn files_under(&self, copy: &WorkingCopy, folder: &str) -> Result<Vec<PathBuf>> {
        let repo = GitRepository::open_at(&copy.path)?;
        let files = repo.tracked_files_under(folder, &self.ignore)?;
        debug!(project = %copy.fullname, folder, count = files.len(), "Walked folder");
        Ok(files)
    }
}

impl BlameReader for GitBlameReader {
    fn lines_for(&self, copy: &WorkingCopy, file: &Path) -> Result<Vec<CodeLine>> {
        let repo = GitRepository::open_at(&copy.path)?;
        let blame = repo
            .repository()
            .blame_file(file, None)
            .with_context(|| format!("Failed to blame {}", file.display()))?;

        // Blame describes the committed blob, so read that rather than the
        // checkout, which may differ (symlinks, autocrlf, local edits).
        let blob = repo.head_blob(file)?;
        let content = String::from_utf8_lossy(blob.content());

        let mut lines = Vec::new();
        for (index, code) in content.lines().enumerate() {
            let number = index + 1;
            let hunk = blame
                .get_line(number)
                .with_context(|| format!("No blame data for {}:{number}", file.display()))?;
            let signature = hunk.final_signature();
            // Non-UTF-8 names still identify their author.
            let contributor = ContributorIdentity::new(
                String::from_utf8_lossy(signature.name_bytes()),
                String::from_utf8_lossy(signature.email_bytes()),
            );
            lines.push(CodeLine::new(number, code, contributor));
        }

        Ok(lines)
    }
}
