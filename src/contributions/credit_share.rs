//! Credit accumulation and the merge algebra used for rollups.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::ops::Add;

use super::identity::{group_by_identity, ContributorIdentity};

/// Lines credited per contributor for a file, folder, or project.
///
/// `add_credit` keys by exact identity. Identities of the same person are
/// only unified by [`merge`](Self::merge), which is associative and
/// commutative with the empty share as its identity element.
///
/// Every credited identity is its own key, so [`ranked`](Self::ranked)
/// always lists each credit exactly once.
#[derive(Debug, Clone, Default)]
pub struct CreditShare {
    credits: BTreeMap<ContributorIdentity, u64>,
    /// Every identity ever folded into this share, representatives or not.
    aliases: BTreeSet<ContributorIdentity>,
}

impl CreditShare {
    /// Creates an empty share.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `count` lines to `contributor`.
    pub fn add_credit(&mut self, contributor: &ContributorIdentity, count: u64) -> &mut Self {
        *self.credits.entry(contributor.clone()).or_insert(0) += count;
        self.aliases.insert(contributor.clone());
        self
    }

    /// Sum of all credits.
    pub fn total_credits(&self) -> u64 {
        self.credits.values().sum()
    }

    /// Whether nothing has been credited.
    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    /// Credits keyed by contributor, sorted by `(username, email)`.
    pub fn credits(&self) -> &BTreeMap<ContributorIdentity, u64> {
        &self.credits
    }

    /// Contributors holding credit, sorted.
    pub fn contributors(&self) -> impl Iterator<Item = &ContributorIdentity> {
        self.credits.keys()
    }

    /// Credits held by exactly `contributor`.
    pub fn credit_for(&self, contributor: &ContributorIdentity) -> u64 {
        self.credits.get(contributor).copied().unwrap_or(0)
    }

    /// Credits held by the contributor registered under `email`.
    pub fn credit_by_email(&self, email: &str) -> u64 {
        self.credits
            .iter()
            .find(|(c, _)| c.email == email)
            .map_or(0, |(_, credit)| *credit)
    }

    /// Contributors paired with their credit, highest first, ties by name.
    pub fn ranked(&self) -> Vec<(ContributorIdentity, u64)> {
        let mut ranked: Vec<_> = self
            .credits
            .iter()
            .map(|(c, credit)| (c.clone(), *credit))
            .collect();
        ranked.sort_by(|(a, a_credit), (b, b_credit)| b_credit.cmp(a_credit).then_with(|| a.cmp(b)));
        ranked
    }

    /// Combines two shares, unifying identities of the same person.
    ///
    /// Each same-person group is credited to one representative with the
    /// sum of every member's raw credit.
    pub fn merge(&self, other: &Self) -> Self {
        let mut raw: BTreeMap<&ContributorIdentity, u64> = BTreeMap::new();
        for (contributor, count) in self.credits.iter().chain(&other.credits) {
            *raw.entry(contributor).or_insert(0) += count;
        }

        // Regroup every identity seen on either side, then total each group
        let observed = self.aliases.iter().chain(&other.aliases).cloned();

        let mut merged = Self::new();
        for group in group_by_identity(observed) {
            let total: u64 = group.iter().filter_map(|member| raw.get(member)).sum();
            merged.credit_group(group, total);
        }
        merged
    }

    fn credit_group(&mut self, group: Vec<ContributorIdentity>, total: u64) {
        let Some(representative) = representative_of(&group) else {
            return;
        };
        *self.credits.entry(representative.clone()).or_insert(0) += total;
        self.aliases.extend(group);
    }
}

/// Smallest member with a username, falling back to the smallest member.
///
/// Groups are sorted, so the choice depends only on membership.
fn representative_of(group: &[ContributorIdentity]) -> Option<&ContributorIdentity> {
    group
        .iter()
        .find(|member| !member.username.trim().is_empty())
        .or_else(|| group.first())
}

impl Add for CreditShare {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.merge(&other)
    }
}

impl<'a> Add<&'a CreditShare> for &'a CreditShare {
    type Output = CreditShare;

    fn add(self, other: &'a CreditShare) -> CreditShare {
        self.merge(other)
    }
}

impl PartialEq for CreditShare {
    fn eq(&self, other: &Self) -> bool {
        self.credits == other.credits
    }
}

impl Eq for CreditShare {}

impl Hash for CreditShare {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.credits.hash(state);
    }
}

impl FromIterator<(ContributorIdentity, u64)> for CreditShare {
    fn from_iter<T: IntoIterator<Item = (ContributorIdentity, u64)>>(iter: T) -> Self {
        let mut share = Self::new();
        for (contributor, count) in iter {
            share.add_credit(&contributor, count);
        }
        share
    }
}
