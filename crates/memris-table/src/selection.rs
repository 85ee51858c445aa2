use crate::rowid::{Generation, RowId};
use crate::rowid_set::{RowIdSet, DEFAULT_DENSE_UPGRADE_THRESHOLD};

/// A single packed row reference: a `RowId` plus the generation the table
/// reported for that offset when the reference was produced (spec.md §3
/// "Selection").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub id: RowId,
    pub generation: Generation,
}

/// An immutable, ordered sequence of [`RowRef`]s — the handoff unit between
/// scans, indexes, joins, ordering, and the executor (spec.md §4.4). Order
/// is preserved from construction (insertion order for a fresh scan, sort
/// order after an `ORDER BY` stage) since spec.md §8 scenario 1 requires
/// `findByAgeBetween` to return rows "in insertion order".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    refs: Vec<RowRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_refs(refs: Vec<RowRef>) -> Self {
        Self { refs }
    }

    /// Builds a selection from a scan's offsets, stamping each with the
    /// table's current generation (spec.md §4.2 "current_generation").
    pub fn from_offsets(ids: impl IntoIterator<Item = RowId>, generation_of: impl Fn(RowId) -> Generation) -> Self {
        let refs = ids.into_iter().map(|id| RowRef { id, generation: generation_of(id) }).collect();
        Self { refs }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RowRef> + '_ {
        self.refs.iter().copied()
    }

    pub fn contains_id(&self, id: RowId) -> bool {
        self.refs.iter().any(|r| r.id == id)
    }

    pub fn to_offsets(&self) -> Vec<RowId> {
        self.refs.iter().map(|r| r.id).collect()
    }

    pub fn truncate(&mut self, limit: usize) {
        self.refs.truncate(limit);
    }

    pub fn push(&mut self, r: RowRef) {
        self.refs.push(r);
    }

    pub fn sort_by(&mut self, cmp: impl FnMut(&RowRef, &RowRef) -> std::cmp::Ordering) {
        self.refs.sort_by(cmp);
    }

    /// Filters out stale references: for each, if `current_generation`
    /// disagrees with the stamped generation, the entry is dropped
    /// (spec.md §4.4 "Materialization filters stale references").
    pub fn materializable(&self, current_generation: impl Fn(RowId) -> Option<Generation>) -> Selection {
        let refs = self
            .refs
            .iter()
            .copied()
            .filter(|r| current_generation(r.id) == Some(r.generation))
            .collect();
        Selection { refs }
    }

    fn as_row_id_set(&self, threshold: usize) -> RowIdSet {
        self.refs.iter().map(|r| r.id).collect::<RowIdSetWithThreshold>().into_inner(threshold)
    }

    /// Size-hinted union: builds a generation lookup from both operands
    /// (later operand wins on conflicting generation, matching "most
    /// recently observed" semantics) and combines via [`RowIdSet`].
    pub fn union(&self, other: &Selection) -> Selection {
        self.combine(other, |a, b, threshold| a.union(&b, threshold))
    }

    pub fn intersect(&self, other: &Selection) -> Selection {
        self.combine(other, |a, b, threshold| a.intersect(&b, threshold))
    }

    pub fn subtract(&self, other: &Selection) -> Selection {
        self.combine(other, |a, b, threshold| a.subtract(&b, threshold))
    }

    fn combine(&self, other: &Selection, f: impl Fn(RowIdSet, RowIdSet, usize) -> RowIdSet) -> Selection {
        let threshold = DEFAULT_DENSE_UPGRADE_THRESHOLD;
        let mut gen_of = hashbrown::HashMap::new();
        for r in self.refs.iter().chain(other.refs.iter()) {
            gen_of.insert(r.id, r.generation);
        }
        let combined = f(self.as_row_id_set(threshold), other.as_row_id_set(threshold), threshold);
        let refs = combined
            .iter()
            .map(|id| RowRef { id, generation: gen_of.get(&id).copied().unwrap_or_default() })
            .collect();
        Selection { refs }
    }
}

/// Helper so `Selection::as_row_id_set` can reuse `FromIterator<RowId>` for
/// `RowIdSet` while still choosing a size-hinted representation.
struct RowIdSetWithThreshold(Vec<RowId>);

impl FromIterator<RowId> for RowIdSetWithThreshold {
    fn from_iter<T: IntoIterator<Item = RowId>>(iter: T) -> Self {
        RowIdSetWithThreshold(iter.into_iter().collect())
    }
}

impl RowIdSetWithThreshold {
    fn into_inner(self, threshold: usize) -> RowIdSet {
        let mut set = RowIdSet::with_threshold_hint(self.0.len(), threshold);
        for id in self.0 {
            set.insert(id, threshold);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rref(offset: u16, gen: u32) -> RowRef {
        RowRef { id: RowId::new(0, offset), generation: Generation(gen) }
    }

    #[test]
    fn union_intersect_subtract_preserve_membership() {
        let a = Selection::from_refs(vec![rref(1, 0), rref(2, 0), rref(3, 0)]);
        let b = Selection::from_refs(vec![rref(2, 0), rref(3, 0), rref(4, 0)]);
        assert_eq!(a.union(&b).len(), 4);
        assert_eq!(a.intersect(&b).len(), 2);
        assert_eq!(a.subtract(&b).len(), 1);
    }

    #[test]
    fn materialization_filters_stale_generations() {
        let sel = Selection::from_refs(vec![rref(1, 0), rref(2, 5)]);
        let current = |id: RowId| if id.offset() == 1 { Some(Generation(0)) } else { Some(Generation(99)) };
        let live = sel.materializable(current);
        assert_eq!(live.len(), 1);
        assert_eq!(live.to_offsets(), vec![RowId::new(0, 1)]);
    }

    #[test]
    fn materialization_drops_deleted_rows() {
        let sel = Selection::from_refs(vec![rref(1, 0)]);
        let live = sel.materializable(|_| None);
        assert!(live.is_empty());
    }
}
