//! Blamed lines of code.

use super::identity::ContributorIdentity;

/// One physical line of a file with the contributor blame credits for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    /// 1-based line number.
    pub number: usize,
    /// Line text without the trailing newline.
    pub code: String,
    /// Identity of the commit that last touched the line.
    pub contributor: ContributorIdentity,
    /// Credit earned by the line when it is wanted.
    pub credit: u64,
}

impl CodeLine {
    /// Creates a line worth one credit.
    pub fn new(number: usize, code: impl Into<String>, contributor: ContributorIdentity) -> Self {
        Self {
            number,
            code: code.into(),
            contributor,
            credit: 1,
        }
    }

    /// Overrides the credit weight.
    pub fn with_credit(mut self, credit: u64) -> Self {
        self.credit = credit;
        self
    }
}
