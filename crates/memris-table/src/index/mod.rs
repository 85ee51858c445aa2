mod composite;
mod hash;
mod prefix;
mod range;
mod suffix;

pub use composite::{CompositeHashIndex, CompositeRangeIndex};
pub use hash::HashIndex;
pub use prefix::PrefixIndex;
pub use range::RangeIndex;
pub use suffix::SuffixIndex;

use memris_sats::StorageValue;

use crate::rowid::RowId;
use crate::rowid_set::RowIdSet;

/// The comparable projection of a [`StorageValue`] used as an index key
/// (spec.md §4.3). Declaration order matters: `MinSentinel` sorts before
/// every real key and `MaxSentinel` after, which is exactly spec.md §6
/// "Composite key sentinels" and makes `#[derive(Ord)]` do the right thing
/// without a hand-written comparator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    MinSentinel,
    Int(i64),
    Str(String),
    MaxSentinel,
}

impl IndexKey {
    /// `None` for `Null` / non-indexable values — nulls are never stored in
    /// an index (spec.md §4.3 probes never need to find a null; `IS NULL`
    /// is not index-supported, see `memris_primitives::Operator`).
    pub fn from_storage(value: &StorageValue) -> Option<IndexKey> {
        if let Some(s) = value.as_str() {
            return Some(IndexKey::Str(s.to_string()));
        }
        value.as_sortable_i64().map(IndexKey::Int)
    }
}

/// Sentinel "no index" probe result (spec.md §4.3 "unsupported operators
/// return a sentinel 'no index' result so the executor falls back to a
/// scan"). Modeled as `Option<RowIdSet>` at the Rust level: `None` is the
/// sentinel, `Some` (possibly empty) is a real hit.
pub type ProbeResult = Option<RowIdSet>;

pub(crate) fn empty_hit() -> ProbeResult {
    Some(RowIdSet::new())
}

/// Helper shared by every index family: inserting `row` under `key` into
/// a lazily-created, independently lockable bucket approximates spec.md §5
/// "Index mutations use lock-free maps (compare-and-swap on a key's
/// bucket)" in safe Rust — the outer map is guarded coarsely for bucket
/// creation only, while reads/writes to an existing bucket take just that
/// bucket's lock (see `DESIGN.md` for the tradeoff against a literal
/// lock-free map).
pub(crate) struct Buckets<K> {
    map: parking_lot::RwLock<hashbrown::HashMap<K, std::sync::Arc<parking_lot::RwLock<RowIdSet>>>>,
    threshold: usize,
}

impl<K: std::hash::Hash + Eq + Clone + Ord> Buckets<K> {
    pub(crate) fn new(threshold: usize) -> Self {
        Self { map: parking_lot::RwLock::new(hashbrown::HashMap::new()), threshold }
    }

    fn bucket(&self, key: &K) -> std::sync::Arc<parking_lot::RwLock<RowIdSet>> {
        if let Some(b) = self.map.read().get(key) {
            return b.clone();
        }
        let mut w = self.map.write();
        w.entry(key.clone()).or_insert_with(|| std::sync::Arc::new(parking_lot::RwLock::new(RowIdSet::new()))).clone()
    }

    pub(crate) fn add(&self, key: K, row: RowId) {
        self.bucket(&key).write().insert(row, self.threshold);
    }

    pub(crate) fn remove(&self, key: &K, row: RowId) {
        if let Some(b) = self.map.read().get(key) {
            b.write().remove(row);
        }
    }

    pub(crate) fn remove_all(&self, key: &K) {
        self.map.write().remove(key);
    }

    pub(crate) fn clear(&self) {
        self.map.write().clear();
    }

    pub(crate) fn lookup(&self, key: &K) -> Option<RowIdSet> {
        self.map.read().get(key).map(|b| b.read().clone())
    }

    pub(crate) fn range(&self, pred: impl Fn(&K) -> bool) -> RowIdSet {
        let map = self.map.read();
        let mut out = RowIdSet::new();
        for (k, bucket) in map.iter() {
            if pred(k) {
                for id in bucket.read().iter() {
                    out.insert(id, self.threshold);
                }
            }
        }
        out
    }
}
