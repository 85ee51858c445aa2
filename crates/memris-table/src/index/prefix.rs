use crate::rowid::RowId;
use crate::rowid_set::{DEFAULT_DENSE_UPGRADE_THRESHOLD, RowIdSet};

use super::{Buckets, IndexKey};

fn prefixes(s: &str) -> impl Iterator<Item = &str> {
    s.char_indices().map(move |(i, c)| &s[..i + c.len_utf8()])
}

/// String prefix index (spec.md §4.3 "prefix: every inserted string
/// contributes one entry per prefix length; `startsWith` is an exact
/// lookup on the prefix map, and equality falls through to it because the
/// full string is itself one of its own prefixes").
pub struct PrefixIndex {
    map: Buckets<IndexKey>,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_UPGRADE_THRESHOLD)
    }
}

impl PrefixIndex {
    pub fn new(dense_upgrade_threshold: usize) -> Self {
        Self { map: Buckets::new(dense_upgrade_threshold) }
    }

    pub fn add(&self, full: &str, row: RowId) {
        for p in prefixes(full) {
            self.map.add(IndexKey::Str(p.to_string()), row);
        }
    }

    /// Removes `row` from every prefix bucket derived from `full` — the
    /// correct way to fully retract a single row, since other rows'
    /// strings may share a shorter prefix.
    pub fn remove(&self, full: &str, row: RowId) {
        for p in prefixes(full) {
            self.map.remove(&IndexKey::Str(p.to_string()), row);
        }
    }

    /// Clears only the exact-match bucket for `full` (the bucket a
    /// `startsWith(full)`/`eq(full)` probe would hit), matching the
    /// generic index `remove_all(key)` contract where `key` is the value
    /// originally passed to `add`.
    pub fn remove_all(&self, full: &str) {
        self.map.remove_all(&IndexKey::Str(full.to_string()));
    }

    pub fn clear(&self) {
        self.map.clear();
    }

    pub fn starts_with(&self, prefix: &str) -> RowIdSet {
        self.map.lookup(&IndexKey::Str(prefix.to_string())).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_and_exact_equality() {
        let idx = PrefixIndex::default();
        idx.add("Johnson", RowId::new(0, 1));
        idx.add("Johnston", RowId::new(0, 2));
        idx.add("Smith", RowId::new(0, 3));
        assert_eq!(idx.starts_with("John").len(), 2);
        assert_eq!(idx.starts_with("Johnson").len(), 1);
    }

    #[test]
    fn remove_retracts_only_that_row() {
        let idx = PrefixIndex::default();
        idx.add("John", RowId::new(0, 1));
        idx.add("Johnny", RowId::new(0, 2));
        idx.remove("Johnny", RowId::new(0, 2));
        assert_eq!(idx.starts_with("John").len(), 1);
        assert_eq!(idx.starts_with("Johnny").len(), 0);
    }
}
