//! Folder rollups.

use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::OnceLock;

use rayon::prelude::*;

use super::credit_share::CreditShare;
use super::file::FileContribution;
use super::identity::ContributorIdentity;

/// Attribution for a folder: its direct files, nested folders, and the
/// merged credit of everything beneath it.
#[derive(Debug)]
pub struct FolderContribution {
    path: String,
    files: Vec<FileContribution>,
    subfolders: Vec<FolderContribution>,
    aggregate: OnceLock<CreditShare>,
}

impl FolderContribution {
    /// Creates a folder from already-grouped children.
    pub fn new(
        path: impl Into<String>,
        files: Vec<FileContribution>,
        subfolders: Vec<Self>,
    ) -> Self {
        Self {
            path: path.into(),
            files,
            subfolders,
            aggregate: OnceLock::new(),
        }
    }

    /// Builds the folder tree rooted at `path` from files anywhere beneath it.
    ///
    /// File paths are relative to the working copy root, as is `path`
    /// (empty for the root itself).
    pub fn from_files(path: impl Into<String>, files: Vec<FileContribution>) -> Self {
        let path = path.into();
        let mut direct = Vec::new();
        let mut nested: BTreeMap<String, Vec<FileContribution>> = BTreeMap::new();

        for file in files {
            let relative = file.path().strip_prefix(&path).unwrap_or(file.path());
            match first_subfolder(relative) {
                Some(name) => nested.entry(name).or_default().push(file),
                None => direct.push(file),
            }
        }

        direct.sort_by(|a, b| a.path().cmp(b.path()));
        let subfolders = nested
            .into_iter()
            .map(|(name, files)| Self::from_files(join_folder(&path, &name), files))
            .collect();

        Self::new(path, direct, subfolders)
    }

    /// Folder path relative to the working copy root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Files directly inside this folder.
    pub fn files(&self) -> &[FileContribution] {
        &self.files
    }

    /// Folders directly inside this folder.
    pub fn subfolders(&self) -> &[Self] {
        &self.subfolders
    }

    /// Merged credit of every file beneath this folder, computed once.
    pub fn credit_share(&self) -> &CreditShare {
        self.aggregate.get_or_init(|| {
            let nested = self
                .subfolders
                .par_iter()
                .map(|folder| folder.credit_share().clone())
                .reduce(CreditShare::new, |a, b| a.merge(&b));
            self.files
                .iter()
                .fold(nested, |acc, file| acc.merge(file.credit_share()))
        })
    }

    /// Total credited lines beneath this folder.
    pub fn total_credits(&self) -> u64 {
        self.credit_share().total_credits()
    }

    /// Canonical contributors beneath this folder.
    pub fn contributors(&self) -> impl Iterator<Item = &ContributorIdentity> {
        self.credit_share().contributors()
    }

    /// Contributors with their credit, highest first.
    pub fn ranked_credits(&self) -> Vec<(ContributorIdentity, u64)> {
        self.credit_share().ranked()
    }
}

fn first_subfolder(relative: &Path) -> Option<String> {
    let mut components = relative
        .components()
        .filter(|c| matches!(c, Component::Normal(_)));
    let first = components.next()?;
    components.next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}

fn join_folder(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
