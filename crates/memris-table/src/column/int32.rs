use hashbrown::HashSet;
use memris_primitives::TypeCode;

use crate::rowid::RowId;

use super::store::PagedStore;

/// One of the three column families (spec.md §3 "Column"): backs `I8`,
/// `I16`, `I32`, `Bool`, `Char`, sortable-encoded `F32`, and epoch-day
/// `LocalDate`/`Date` — every type whose storage representation fits a
/// 32-bit lane.
pub struct Int32Column {
    store: PagedStore<i32>,
    type_code: TypeCode,
}

impl Int32Column {
    pub fn new(type_code: TypeCode, page_capacity: usize) -> Self {
        assert!(
            matches!(
                type_code,
                TypeCode::I8 | TypeCode::I16 | TypeCode::I32 | TypeCode::Bool | TypeCode::Char | TypeCode::F32 | TypeCode::LocalDate | TypeCode::Date
            ),
            "{type_code:?} does not fit the int32 column family"
        );
        Self { store: PagedStore::new(page_capacity), type_code }
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn page_capacity(&self) -> usize {
        self.store.page_capacity()
    }

    pub fn published(&self) -> u64 {
        self.store.published()
    }

    pub fn put(&self, global_offset: u64, value: i32) {
        self.store.put(global_offset, value);
    }

    pub fn put_null(&self, global_offset: u64) {
        self.store.put_null(global_offset);
    }

    pub fn get(&self, global_offset: u64) -> Option<i32> {
        self.store.get(global_offset)
    }

    fn rows(&self, offsets: Vec<u64>) -> Vec<RowId> {
        self.store.to_row_ids(offsets)
    }

    pub fn scan_all(&self) -> Vec<RowId> {
        self.rows(self.store.scan(|v| v.is_some(), None))
    }

    pub fn scan_equals(&self, v: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| cell == Some(&v), limit))
    }

    pub fn scan_not_equals(&self, v: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x != v), limit))
    }

    pub fn scan_gt(&self, v: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x > v), limit))
    }

    pub fn scan_ge(&self, v: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x >= v), limit))
    }

    pub fn scan_lt(&self, v: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x < v), limit))
    }

    pub fn scan_le(&self, v: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x <= v), limit))
    }

    /// Inclusive bounds (spec.md §4.1 "scan_between(lo, hi, limit)
    /// (inclusive)").
    pub fn scan_between(&self, lo: i32, hi: i32, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x >= lo && *x <= hi), limit))
    }

    /// Builds the target hash set once, then scans with O(1) membership per
    /// cell (spec.md §4.1 "scan_in").
    pub fn scan_in(&self, values: &[i32], limit: Option<usize>) -> Vec<RowId> {
        let set: HashSet<i32> = values.iter().copied().collect();
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if set.contains(x)), limit))
    }

    pub fn scan_null(&self, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| cell.is_none(), limit))
    }

    pub fn scan_not_null(&self, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| cell.is_some(), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_between_is_inclusive() {
        let col = Int32Column::new(TypeCode::I32, 4096);
        for (i, v) in [20, 30, 40].into_iter().enumerate() {
            col.put(i as u64, v);
        }
        let hits = col.scan_between(20, 30, None);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn null_is_non_matching_in_comparisons() {
        let col = Int32Column::new(TypeCode::I32, 4096);
        col.put(0, 5);
        col.put_null(1);
        col.put(2, 10);
        assert_eq!(col.scan_gt(0, None).len(), 2);
        assert_eq!(col.scan_null(None).len(), 1);
    }

    #[test]
    fn scan_in_with_empty_set_yields_empty_selection() {
        let col = Int32Column::new(TypeCode::I32, 4096);
        col.put(0, 5);
        assert!(col.scan_in(&[], None).is_empty());
    }

    #[test]
    fn page_boundary_round_trips() {
        let col = Int32Column::new(TypeCode::I32, 4096);
        for offset in [4095u64, 4096, 4097] {
            col.put(offset, offset as i32);
        }
        for offset in [4095u64, 4096, 4097] {
            assert_eq!(col.get(offset), Some(offset as i32));
        }
    }
}
