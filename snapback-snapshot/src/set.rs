//! Read-only, time-ordered view over the snapshots of one backup target.
//!
//! A `SnapshotSet` is always rebuilt from a fresh directory listing; it is
//! never cached across invocations. The filesystem is the source of truth,
//! which keeps every operation safe to re-run after a crash.

use crate::name::SnapshotName;

/// Ordered set of snapshot names, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotSet {
    names: Vec<SnapshotName>,
}

impl SnapshotSet {
    /// Build a set from already-parsed names. Sorts ascending.
    pub fn from_names(mut names: Vec<SnapshotName>) -> Self {
        names.sort();
        names.dedup();
        Self { names }
    }

    /// Build a set from raw directory-entry names.
    ///
    /// Entries that do not parse as snapshot names are skipped, so foreign
    /// files coexisting in the backup root never break listing.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(
            entries
                .into_iter()
                .filter_map(|entry| SnapshotName::parse(entry.as_ref()).ok())
                .collect(),
        )
    }

    /// All snapshot names, oldest first.
    pub fn all(&self) -> &[SnapshotName] {
        &self.names
    }

    /// The most recent snapshot, if any. An empty set is a valid state
    /// meaning "no backups yet", not an error.
    pub fn latest(&self) -> Option<&SnapshotName> {
        self.names.last()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SnapshotName> {
        self.names.iter()
    }

    pub fn contains(&self, name: &SnapshotName) -> bool {
        self.names.binary_search(name).is_ok()
    }
}

impl<'a> IntoIterator for &'a SnapshotSet {
    type Item = &'a SnapshotName;
    type IntoIter = std::slice::Iter<'a, SnapshotName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
