//! Full-membership snapshots emitted by a target source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Target;

/// A complete, authoritative view of source membership at one instant.
///
/// Never a delta: each snapshot replaces the previous one entirely.
/// Duplicate targets collapse by identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    targets: BTreeSet<Target>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.targets.contains(target)
    }

    /// Iterate targets in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// First target whose address matches, regardless of port.
    pub fn find_address(&self, address: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.address == address)
    }
}

impl FromIterator<Target> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self { targets: iter.into_iter().collect() }
    }
}

impl IntoIterator for Snapshot {
    type Item = Target;
    type IntoIter = std::collections::btree_set::IntoIter<Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Target;
    type IntoIter = std::collections::btree_set::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
