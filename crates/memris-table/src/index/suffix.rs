use crate::rowid::RowId;
use crate::rowid_set::{DEFAULT_DENSE_UPGRADE_THRESHOLD, RowIdSet};

use super::prefix::PrefixIndex;

fn reversed(s: &str) -> String {
    s.chars().rev().collect()
}

/// String suffix index (spec.md §4.3 "suffix: same structure as prefix,
/// keyed on the reversed string"). Delegates entirely to [`PrefixIndex`]
/// over reversed strings.
pub struct SuffixIndex {
    reversed: PrefixIndex,
}

impl Default for SuffixIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_UPGRADE_THRESHOLD)
    }
}

impl SuffixIndex {
    pub fn new(dense_upgrade_threshold: usize) -> Self {
        Self { reversed: PrefixIndex::new(dense_upgrade_threshold) }
    }

    pub fn add(&self, full: &str, row: RowId) {
        self.reversed.add(&reversed(full), row);
    }

    pub fn remove(&self, full: &str, row: RowId) {
        self.reversed.remove(&reversed(full), row);
    }

    pub fn remove_all(&self, full: &str) {
        self.reversed.remove_all(&reversed(full));
    }

    pub fn clear(&self) {
        self.reversed.clear();
    }

    pub fn ends_with(&self, suffix: &str) -> RowIdSet {
        self.reversed.starts_with(&reversed(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_with_matches_suffix() {
        let idx = SuffixIndex::default();
        idx.add("alice@example.com", RowId::new(0, 1));
        idx.add("bob@example.com", RowId::new(0, 2));
        idx.add("carol@other.org", RowId::new(0, 3));
        assert_eq!(idx.ends_with("@example.com").len(), 2);
    }
}
