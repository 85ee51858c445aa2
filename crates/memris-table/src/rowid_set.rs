use smallvec::SmallVec;

use crate::rowid::RowId;

/// Default threshold at which a sparse [`RowIdSet`] upgrades to dense
/// (spec.md §3 "Upgrade: once a sparse set's size crosses a threshold
/// (default ≈4096)").
pub const DEFAULT_DENSE_UPGRADE_THRESHOLD: usize = 4096;

/// A bitset over raw [`RowId`] values, O(1) insert and membership, bounded
/// by the maximum RowId value seen so far (spec.md §3 "dense").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DenseBits {
    words: Vec<u64>,
}

impl DenseBits {
    fn word_index(raw: u64) -> (usize, u32) {
        ((raw / 64) as usize, (raw % 64) as u32)
    }

    fn ensure_capacity(&mut self, word_idx: usize) {
        if self.words.len() <= word_idx {
            self.words.resize(word_idx + 1, 0);
        }
    }

    fn insert(&mut self, raw: u64) -> bool {
        let (idx, bit) = Self::word_index(raw);
        self.ensure_capacity(idx);
        let mask = 1u64 << bit;
        let was_set = self.words[idx] & mask != 0;
        self.words[idx] |= mask;
        !was_set
    }

    fn remove(&mut self, raw: u64) -> bool {
        let (idx, bit) = Self::word_index(raw);
        if idx >= self.words.len() {
            return false;
        }
        let mask = 1u64 << bit;
        let was_set = self.words[idx] & mask != 0;
        self.words[idx] &= !mask;
        was_set
    }

    fn contains(&self, raw: u64) -> bool {
        let (idx, bit) = Self::word_index(raw);
        self.words.get(idx).is_some_and(|w| w & (1 << bit) != 0)
    }

    fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn iter(&self) -> impl Iterator<Item = RowId> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            (0..64).filter_map(move |bit| {
                (word & (1 << bit) != 0).then(|| RowId::from_raw(word_idx as u64 * 64 + bit))
            })
        })
    }
}

/// The two [`RowIdSet`] representations of spec.md §3 sharing one interface:
/// an unsorted unique array for small sets, and a bitset once the set grows
/// past [`DEFAULT_DENSE_UPGRADE_THRESHOLD`] (or a caller-chosen threshold).
/// Insert and remove are idempotent (set semantics); `export` is a snapshot
/// unaffected by later mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIdSet {
    Sparse(SmallVec<[RowId; 8]>),
    Dense(DenseBits),
}

impl Default for RowIdSet {
    fn default() -> Self {
        RowIdSet::Sparse(SmallVec::new())
    }
}

impl RowIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold_hint(expected_len: usize, threshold: usize) -> Self {
        if expected_len > threshold {
            RowIdSet::Dense(DenseBits::default())
        } else {
            RowIdSet::Sparse(SmallVec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RowIdSet::Sparse(v) => v.len(),
            RowIdSet::Dense(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: RowId) -> bool {
        match self {
            RowIdSet::Sparse(v) => v.contains(&id),
            RowIdSet::Dense(d) => d.contains(id.raw()),
        }
    }

    /// Inserts `id`, upgrading sparse → dense once `threshold` is crossed.
    /// Returns `true` if `id` was newly inserted.
    pub fn insert(&mut self, id: RowId, threshold: usize) -> bool {
        match self {
            RowIdSet::Sparse(v) => {
                if v.contains(&id) {
                    return false;
                }
                v.push(id);
                if v.len() > threshold {
                    self.upgrade_to_dense();
                }
                true
            }
            RowIdSet::Dense(d) => d.insert(id.raw()),
        }
    }

    /// Idempotent removal (spec.md §3 invariant).
    pub fn remove(&mut self, id: RowId) -> bool {
        match self {
            RowIdSet::Sparse(v) => {
                if let Some(pos) = v.iter().position(|&x| x == id) {
                    v.swap_remove(pos);
                    true
                } else {
                    false
                }
            }
            RowIdSet::Dense(d) => d.remove(id.raw()),
        }
    }

    fn upgrade_to_dense(&mut self) {
        let RowIdSet::Sparse(v) = self else { return };
        let mut dense = DenseBits::default();
        for id in v.iter() {
            dense.insert(id.raw());
        }
        *self = RowIdSet::Dense(dense);
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = RowId> + '_> {
        match self {
            RowIdSet::Sparse(v) => Box::new(v.iter().copied()),
            RowIdSet::Dense(d) => Box::new(d.iter()),
        }
    }

    pub fn to_vec(&self) -> Vec<RowId> {
        self.iter().collect()
    }

    pub fn union(&self, other: &RowIdSet, threshold: usize) -> RowIdSet {
        let mut out = RowIdSet::with_threshold_hint(self.len() + other.len(), threshold);
        for id in self.iter().chain(other.iter()) {
            out.insert(id, threshold);
        }
        out
    }

    pub fn intersect(&self, other: &RowIdSet, threshold: usize) -> RowIdSet {
        let (smaller, larger) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        let mut out = RowIdSet::with_threshold_hint(smaller.len(), threshold);
        for id in smaller.iter() {
            if larger.contains(id) {
                out.insert(id, threshold);
            }
        }
        out
    }

    pub fn subtract(&self, other: &RowIdSet, threshold: usize) -> RowIdSet {
        let mut out = RowIdSet::with_threshold_hint(self.len(), threshold);
        for id in self.iter() {
            if !other.contains(id) {
                out.insert(id, threshold);
            }
        }
        out
    }
}

impl FromIterator<RowId> for RowIdSet {
    fn from_iter<T: IntoIterator<Item = RowId>>(iter: T) -> Self {
        let mut set = RowIdSet::new();
        for id in iter {
            set.insert(id, DEFAULT_DENSE_UPGRADE_THRESHOLD);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut set = RowIdSet::new();
        assert!(set.insert(RowId::ZERO, 4096));
        assert!(!set.insert(RowId::ZERO, 4096));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = RowIdSet::new();
        set.insert(RowId::new(0, 1), 4096);
        assert!(set.remove(RowId::new(0, 1)));
        assert!(!set.remove(RowId::new(0, 1)));
        assert!(set.is_empty());
    }

    #[test]
    fn upgrades_to_dense_at_exactly_the_threshold() {
        let mut set = RowIdSet::new();
        for i in 0..=10u16 {
            set.insert(RowId::new(0, i), 10);
        }
        assert!(matches!(set, RowIdSet::Dense(_)));
        assert_eq!(set.len(), 11);
    }

    #[test]
    fn stays_sparse_at_the_threshold_boundary() {
        let mut set = RowIdSet::new();
        for i in 0..10u16 {
            set.insert(RowId::new(0, i), 10);
        }
        assert!(matches!(set, RowIdSet::Sparse(_)));
    }

    #[test]
    fn upgrade_preserves_contents_and_membership() {
        let mut set = RowIdSet::new();
        let ids: Vec<_> = (0..5000u32).map(|i| RowId::from_global_offset(i as u64, 4096)).collect();
        for &id in &ids {
            set.insert(id, DEFAULT_DENSE_UPGRADE_THRESHOLD);
        }
        assert!(matches!(set, RowIdSet::Dense(_)));
        for &id in &ids {
            assert!(set.contains(id));
        }
        assert_eq!(set.len(), ids.len());
    }

    #[test]
    fn export_snapshot_unaffected_by_later_mutation() {
        let mut set = RowIdSet::new();
        set.insert(RowId::new(0, 1), 4096);
        let snapshot = set.to_vec();
        set.insert(RowId::new(0, 2), 4096);
        assert_eq!(snapshot, vec![RowId::new(0, 1)]);
    }

    #[test]
    fn union_intersect_subtract() {
        let a: RowIdSet = (0..5).map(|i| RowId::new(0, i)).collect();
        let b: RowIdSet = (3..8).map(|i| RowId::new(0, i)).collect();
        let u = a.union(&b, 4096);
        assert_eq!(u.len(), 8);
        let i = a.intersect(&b, 4096);
        assert_eq!(i.len(), 2);
        let s = a.subtract(&b, 4096);
        assert_eq!(s.len(), 3);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::collection::hash_set;
    use proptest::prelude::*;

    fn rows_from(ids: &std::collections::HashSet<u32>) -> Vec<RowId> {
        ids.iter().map(|&i| RowId::from_global_offset(i as u64, 4096)).collect()
    }

    proptest! {
        // spec.md §3: insert/contains/len agree for any inserted set,
        // regardless of the sparse/dense threshold crossed.
        #[test]
        fn contains_and_len_agree_with_inserted_ids(
            ids in hash_set(0u32..20_000, 0..2000),
            threshold in 1usize..8192,
        ) {
            let rows = rows_from(&ids);
            let mut set = RowIdSet::new();
            for &id in &rows {
                set.insert(id, threshold);
            }
            for &id in &rows {
                prop_assert!(set.contains(id));
            }
            prop_assert_eq!(set.len(), rows.len());
        }

        // spec.md §3 "Upgrade: once a sparse set's size crosses a
        // threshold... preserve contents" for any threshold/id set.
        #[test]
        fn upgrade_preserves_contents_for_any_threshold(
            ids in hash_set(0u32..20_000, 0..4000),
            threshold in 1usize..4096,
        ) {
            let rows = rows_from(&ids);
            let mut set = RowIdSet::new();
            for &id in &rows {
                set.insert(id, threshold);
            }
            if rows.len() > threshold {
                prop_assert!(matches!(set, RowIdSet::Dense(_)));
            }
            for &id in &rows {
                prop_assert!(set.contains(id));
            }
            prop_assert_eq!(set.len(), rows.len());
        }

        // Removing every inserted id always empties the set, on either side
        // of the sparse/dense threshold.
        #[test]
        fn remove_all_empties_the_set(
            ids in hash_set(0u32..20_000, 0..2000),
            threshold in 1usize..8192,
        ) {
            let rows = rows_from(&ids);
            let mut set = RowIdSet::new();
            for &id in &rows {
                set.insert(id, threshold);
            }
            for &id in &rows {
                prop_assert!(set.remove(id));
            }
            prop_assert!(set.is_empty());
        }
    }
}
