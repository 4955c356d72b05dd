//! Contributor identities and the resolver that unions fragmented ones.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A person as seen by a single commit: the username and email recorded on it.
///
/// Identities compare by `(username, email)`. Whether two identities belong
/// to the same person is decided by [`group_by_identity`], not by equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContributorIdentity {
    /// Username (commit author name).
    pub username: String,
    /// Email address; may be empty.
    pub email: String,
}

impl ContributorIdentity {
    /// Creates a new identity.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }

    fn username_key(&self) -> Option<IdentityKey> {
        non_blank(&self.username).map(IdentityKey::Username)
    }

    fn email_key(&self) -> Option<IdentityKey> {
        non_blank(&self.email).map(IdentityKey::Email)
    }
}

impl fmt::Display for ContributorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.username, self.email)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Join key; usernames and emails live in separate namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IdentityKey {
    Username(String),
    Email(String),
}

/// Incremental partition of identities into same-person groups.
///
/// Two identities end up in one group iff a chain of shared usernames or
/// shared emails connects them. Blank usernames and emails never join.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    /// Group slots; a slot is emptied when it is absorbed by another group.
    groups: Vec<Vec<ContributorIdentity>>,
    index: HashMap<IdentityKey, usize>,
}

impl IdentityResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identity, merging groups it bridges.
    pub fn insert(&mut self, identity: ContributorIdentity) {
        let by_username = identity
            .username_key()
            .and_then(|key| self.index.get(&key).copied());
        let by_email = identity
            .email_key()
            .and_then(|key| self.index.get(&key).copied());

        // Join the group owning either key, merging two groups it bridges
        let slot = match (by_username, by_email) {
            (Some(a), Some(b)) if a != b => self.union(a, b),
            (Some(slot), _) | (None, Some(slot)) => slot,
            (None, None) => {
                self.groups.push(Vec::new());
                self.groups.len() - 1
            }
        };

        if !self.groups[slot].contains(&identity) {
            self.register(slot, &identity);
            self.groups[slot].push(identity);
        }
    }

    /// Consumes the resolver, returning the non-empty groups.
    ///
    /// Members are sorted and groups are ordered by their smallest member,
    /// so the output does not depend on insertion order.
    pub fn into_groups(self) -> Vec<Vec<ContributorIdentity>> {
        let mut groups: Vec<_> = self
            .groups
            .into_iter()
            .filter(|group| !group.is_empty())
            .map(|mut group| {
                group.sort();
                group
            })
            .collect();
        // Groups are non-empty, so a[0] is the smallest member
        groups.sort_by(|a, b| a[0].cmp(&b[0]));
        groups
    }

    /// Folds the smaller group into the larger and repoints its keys.
    fn union(&mut self, a: usize, b: usize) -> usize {
        let (keep, absorb) = if self.groups[a].len() >= self.groups[b].len() {
            (a, b)
        } else {
            (b, a)
        };

        let moved = std::mem::take(&mut self.groups[absorb]);
        for member in &moved {
            self.register(keep, member);
        }
        self.groups[keep].extend(moved);
        keep
    }

    fn register(&mut self, slot: usize, identity: &ContributorIdentity) {
        for key in [identity.username_key(), identity.email_key()]
            .into_iter()
            .flatten()
        {
            self.index.insert(key, slot);
        }
    }
}

/// Partitions identities into groups connected by shared usernames or emails.
pub fn group_by_identity<I>(identities: I) -> Vec<Vec<ContributorIdentity>>
where
    I: IntoIterator<Item = ContributorIdentity>,
{
    let mut resolver = IdentityResolver::new();
    for identity in identities {
        resolver.insert(identity);
    }
    resolver.into_groups()
}
