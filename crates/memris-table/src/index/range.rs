use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::rowid::RowId;
use crate::rowid_set::{DEFAULT_DENSE_UPGRADE_THRESHOLD, RowIdSet};

use super::IndexKey;

/// Single-column ordered index (spec.md §4.3 "range: ordered map; supports
/// gt/ge/lt/le/between in addition to equality").
pub struct RangeIndex {
    tree: RwLock<BTreeMap<IndexKey, std::sync::Arc<RwLock<RowIdSet>>>>,
    threshold: usize,
}

impl Default for RangeIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_UPGRADE_THRESHOLD)
    }
}

impl RangeIndex {
    pub fn new(dense_upgrade_threshold: usize) -> Self {
        Self { tree: RwLock::new(BTreeMap::new()), threshold: dense_upgrade_threshold }
    }

    fn bucket(&self, key: &IndexKey) -> std::sync::Arc<RwLock<RowIdSet>> {
        if let Some(b) = self.tree.read().get(key) {
            return b.clone();
        }
        let mut w = self.tree.write();
        w.entry(key.clone()).or_insert_with(|| std::sync::Arc::new(RwLock::new(RowIdSet::new()))).clone()
    }

    pub fn add(&self, key: IndexKey, row: RowId) {
        self.bucket(&key).write().insert(row, self.threshold);
    }

    pub fn remove(&self, key: &IndexKey, row: RowId) {
        if let Some(b) = self.tree.read().get(key) {
            b.write().remove(row);
        }
    }

    pub fn remove_all(&self, key: &IndexKey) {
        self.tree.write().remove(key);
    }

    pub fn clear(&self) {
        self.tree.write().clear();
    }

    fn collect(&self, range: impl std::ops::RangeBounds<IndexKey>) -> RowIdSet {
        let tree = self.tree.read();
        let mut out = RowIdSet::new();
        for (_, bucket) in tree.range(range) {
            for id in bucket.read().iter() {
                out.insert(id, self.threshold);
            }
        }
        out
    }

    pub fn eq(&self, key: &IndexKey) -> RowIdSet {
        self.tree.read().get(key).map(|b| b.read().clone()).unwrap_or_default()
    }

    pub fn gt(&self, key: IndexKey) -> RowIdSet {
        self.collect((std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded))
    }

    pub fn ge(&self, key: IndexKey) -> RowIdSet {
        self.collect((std::ops::Bound::Included(key), std::ops::Bound::Unbounded))
    }

    pub fn lt(&self, key: IndexKey) -> RowIdSet {
        self.collect((std::ops::Bound::Unbounded, std::ops::Bound::Excluded(key)))
    }

    pub fn le(&self, key: IndexKey) -> RowIdSet {
        self.collect((std::ops::Bound::Unbounded, std::ops::Bound::Included(key)))
    }

    pub fn between(&self, lo: IndexKey, hi: IndexKey) -> RowIdSet {
        self.collect(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_is_inclusive() {
        let idx = RangeIndex::default();
        idx.add(IndexKey::Int(1), RowId::new(0, 1));
        idx.add(IndexKey::Int(5), RowId::new(0, 2));
        idx.add(IndexKey::Int(10), RowId::new(0, 3));
        assert_eq!(idx.between(IndexKey::Int(1), IndexKey::Int(5)).len(), 2);
    }

    #[test]
    fn gt_excludes_the_bound() {
        let idx = RangeIndex::default();
        idx.add(IndexKey::Int(5), RowId::new(0, 1));
        idx.add(IndexKey::Int(6), RowId::new(0, 2));
        assert_eq!(idx.gt(IndexKey::Int(5)).len(), 1);
        assert_eq!(idx.ge(IndexKey::Int(5)).len(), 2);
    }
}
