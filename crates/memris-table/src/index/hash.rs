use crate::rowid::RowId;
use crate::rowid_set::{DEFAULT_DENSE_UPGRADE_THRESHOLD, RowIdSet};

use super::{Buckets, IndexKey};

/// Single-column equality index (spec.md §4.3 "hash: any hashable key;
/// O(1) equality").
pub struct HashIndex {
    buckets: Buckets<IndexKey>,
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_UPGRADE_THRESHOLD)
    }
}

impl HashIndex {
    pub fn new(dense_upgrade_threshold: usize) -> Self {
        Self { buckets: Buckets::new(dense_upgrade_threshold) }
    }

    pub fn add(&self, key: IndexKey, row: RowId) {
        self.buckets.add(key, row);
    }

    pub fn remove(&self, key: &IndexKey, row: RowId) {
        self.buckets.remove(key, row);
    }

    pub fn remove_all(&self, key: &IndexKey) {
        self.buckets.remove_all(key);
    }

    pub fn clear(&self) {
        self.buckets.clear();
    }

    pub fn eq(&self, key: &IndexKey) -> RowIdSet {
        self.buckets.lookup(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_probe_round_trips() {
        let idx = HashIndex::default();
        idx.add(IndexKey::Int(7), RowId::new(0, 1));
        idx.add(IndexKey::Int(7), RowId::new(0, 2));
        idx.add(IndexKey::Int(8), RowId::new(0, 3));
        assert_eq!(idx.eq(&IndexKey::Int(7)).len(), 2);
        assert_eq!(idx.eq(&IndexKey::Int(9)).len(), 0);
    }

    #[test]
    fn remove_and_remove_all() {
        let idx = HashIndex::default();
        idx.add(IndexKey::Str("a".into()), RowId::new(0, 1));
        idx.add(IndexKey::Str("a".into()), RowId::new(0, 2));
        idx.remove(&IndexKey::Str("a".into()), RowId::new(0, 1));
        assert_eq!(idx.eq(&IndexKey::Str("a".into())).len(), 1);
        idx.remove_all(&IndexKey::Str("a".into()));
        assert_eq!(idx.eq(&IndexKey::Str("a".into())).len(), 0);
    }
}
