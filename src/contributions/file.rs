//! Per-file attribution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::credit_share::CreditShare;
use super::identity::ContributorIdentity;
use super::language::{LanguageDescriptor, LanguageRegistry, LineKind};
use super::line::CodeLine;

/// Credit earned by the blamed lines of one file.
#[derive(Debug, Clone)]
pub struct FileContribution {
    path: PathBuf,
    language: Arc<LanguageDescriptor>,
    lines: Vec<CodeLine>,
    credit_share: CreditShare,
}

impl FileContribution {
    /// Classifies `lines` by the language of `path` and credits the wanted ones.
    pub fn new(path: impl Into<PathBuf>, lines: Vec<CodeLine>, registry: &LanguageRegistry) -> Self {
        let path = path.into();
        let mut file = Self {
            language: registry.resolve_path(&path),
            path,
            lines,
            credit_share: CreditShare::new(),
        };

        // Unwanted languages earn nothing, whatever their lines look like.
        if file.is_wanted() {
            let mut credit_share = CreditShare::new();
            for line in file.wanted_lines() {
                credit_share.add_credit(&line.contributor, line.credit);
            }
            file.credit_share = credit_share;
        }
        file
    }

    /// Path relative to the working copy root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Language inferred from the extension.
    pub fn language(&self) -> &LanguageDescriptor {
        &self.language
    }

    /// Whether the file's language counts toward attribution.
    pub fn is_wanted(&self) -> bool {
        self.language.is_wanted()
    }

    /// Every physical line, wanted or not.
    pub fn lines(&self) -> &[CodeLine] {
        &self.lines
    }

    /// Lines that earned credit.
    pub fn wanted_lines(&self) -> impl Iterator<Item = &CodeLine> {
        self.lines
            .iter()
            .filter(|line| self.language.classify_line(&line.code) == LineKind::Wanted)
    }

    /// Credit share of this file; empty when the language is unwanted.
    pub fn credit_share(&self) -> &CreditShare {
        &self.credit_share
    }

    /// Contributors holding credit in this file.
    pub fn contributors(&self) -> impl Iterator<Item = &ContributorIdentity> {
        self.credit_share.contributors()
    }

    /// Total credited lines.
    pub fn total_credits(&self) -> u64 {
        self.credit_share.total_credits()
    }
}
