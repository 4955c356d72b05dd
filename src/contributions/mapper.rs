//! Turns a folder of a working copy into a [`FolderContribution`].

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::debug;

use super::file::FileContribution;
use super::folder::FolderContribution;
use super::language::LanguageRegistry;
use crate::git::{BlameReader, FolderWalker, WorkingCopy};

/// Binds a working copy to the collaborators that read it.
pub struct ContributionsMapper<'a> {
    copy: &'a WorkingCopy,
    walker: &'a dyn FolderWalker,
    blame: &'a dyn BlameReader,
    registry: &'a LanguageRegistry,
}

impl<'a> ContributionsMapper<'a> {
    /// Creates a mapper over `copy`.
    pub fn new(
        copy: &'a WorkingCopy,
        walker: &'a dyn FolderWalker,
        blame: &'a dyn BlameReader,
        registry: &'a LanguageRegistry,
    ) -> Self {
        Self {
            copy,
            walker,
            blame,
            registry,
        }
    }

    /// Blames every wanted file beneath `folder` and rolls them up.
    ///
    /// `""` and `"/"` both mean the project root. Files of unregistered
    /// languages are skipped without being blamed.
    pub fn for_folder(&self, folder: &str) -> Result<FolderContribution> {
        let folder = folder.trim_matches('/');
        let files = self
            .walker
            .files_under(self.copy, folder)
            .with_context(|| format!("Failed to list folder '{folder}'"))?;

        let wanted: Vec<_> = files
            .into_iter()
            .filter(|path| self.registry.resolve_path(path).is_wanted())
            .collect();
        debug!(project = %self.copy.fullname, folder, files = wanted.len(), "Blaming files");

        let contributions = wanted
            .par_iter()
            .map(|path| {
                let lines = self.blame.lines_for(self.copy, path)?;
                Ok(FileContribution::new(path.clone(), lines, self.registry))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FolderContribution::from_files(folder, contributions))
    }
}
