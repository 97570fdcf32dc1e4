//! Canonical participant sets.

use std::collections::BTreeSet;

/// The users of a chat, compared as a set.
///
/// Iteration order is ascending user id, which makes [`signature`] a stable
/// key for "exactly these participants".
///
/// [`signature`]: ParticipantSet::signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSet(BTreeSet<i64>);

impl ParticipantSet {
    /// Returns `false` if the user was already present.
    pub fn insert(&mut self, user_id: i64) -> bool {
        self.0.insert(user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Chats with more than two participants are groups.
    pub fn is_group(&self) -> bool {
        self.0.len() > 2
    }

    pub fn ids(&self) -> Vec<i64> {
        self.0.iter().copied().collect()
    }

    /// Sorted ids joined by `,`; equal sets yield equal signatures.
    pub fn signature(&self) -> String {
        self.0
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<i64> for ParticipantSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
