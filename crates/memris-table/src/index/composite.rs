use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::rowid::RowId;
use crate::rowid_set::{DEFAULT_DENSE_UPGRADE_THRESHOLD, RowIdSet};

use super::{Buckets, IndexKey};

/// Tuple-key equality index (spec.md §4.3 "composite-hash: tuple key, same
/// shape as hash but over several columns").
pub struct CompositeHashIndex {
    buckets: Buckets<Vec<IndexKey>>,
}

impl Default for CompositeHashIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_UPGRADE_THRESHOLD)
    }
}

impl CompositeHashIndex {
    pub fn new(dense_upgrade_threshold: usize) -> Self {
        Self { buckets: Buckets::new(dense_upgrade_threshold) }
    }

    pub fn add(&self, key: Vec<IndexKey>, row: RowId) {
        debug_assert!(key.len() >= 2, "composite index keys have at least two components");
        self.buckets.add(key, row);
    }

    pub fn remove(&self, key: &Vec<IndexKey>, row: RowId) {
        self.buckets.remove(key, row);
    }

    pub fn remove_all(&self, key: &Vec<IndexKey>) {
        self.buckets.remove_all(key);
    }

    pub fn clear(&self) {
        self.buckets.clear();
    }

    pub fn eq(&self, key: &Vec<IndexKey>) -> RowIdSet {
        self.buckets.lookup(key).unwrap_or_default()
    }
}

/// Tuple-key ordered index (spec.md §4.3 "composite-range: ordered tuple
/// key; a probe on a prefix of the key uses `MinSentinel`/`MaxSentinel`
/// (see [`IndexKey`]) to fill the unbound trailing components").
pub struct CompositeRangeIndex {
    tree: RwLock<BTreeMap<Vec<IndexKey>, std::sync::Arc<RwLock<RowIdSet>>>>,
    threshold: usize,
}

impl Default for CompositeRangeIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_UPGRADE_THRESHOLD)
    }
}

impl CompositeRangeIndex {
    pub fn new(dense_upgrade_threshold: usize) -> Self {
        Self { tree: RwLock::new(BTreeMap::new()), threshold: dense_upgrade_threshold }
    }

    fn bucket(&self, key: &Vec<IndexKey>) -> std::sync::Arc<RwLock<RowIdSet>> {
        if let Some(b) = self.tree.read().get(key) {
            return b.clone();
        }
        let mut w = self.tree.write();
        w.entry(key.clone()).or_insert_with(|| std::sync::Arc::new(RwLock::new(RowIdSet::new()))).clone()
    }

    pub fn add(&self, key: Vec<IndexKey>, row: RowId) {
        debug_assert!(key.len() >= 2, "composite index keys have at least two components");
        self.bucket(&key).write().insert(row, self.threshold);
    }

    pub fn remove(&self, key: &Vec<IndexKey>, row: RowId) {
        if let Some(b) = self.tree.read().get(key) {
            b.write().remove(row);
        }
    }

    pub fn remove_all(&self, key: &Vec<IndexKey>) {
        self.tree.write().remove(key);
    }

    pub fn clear(&self) {
        self.tree.write().clear();
    }

    pub fn eq(&self, key: &Vec<IndexKey>) -> RowIdSet {
        self.tree.read().get(key).map(|b| b.read().clone()).unwrap_or_default()
    }

    /// Ordered-range probe between two fully-formed tuple bounds
    /// (spec.md §4.3 "longest-prefix match, narrower key on ties" is the
    /// executor's job of constructing `lo`/`hi`; this just walks the
    /// resulting tuple range).
    pub fn between(&self, lo: Vec<IndexKey>, hi: Vec<IndexKey>) -> RowIdSet {
        let tree = self.tree.read();
        let mut out = RowIdSet::new();
        for (_, bucket) in tree.range(lo..=hi) {
            for id in bucket.read().iter() {
                out.insert(id, self.threshold);
            }
        }
        out
    }
}
