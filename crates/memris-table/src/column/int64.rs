use hashbrown::HashSet;
use memris_primitives::TypeCode;

use crate::rowid::RowId;

use super::store::PagedStore;

/// One of the three column families (spec.md §3 "Column"): backs `I64`,
/// sortable-encoded `F64`, epoch-milli `Instant`/`LocalDateTime`.
pub struct Int64Column {
    store: PagedStore<i64>,
    type_code: TypeCode,
}

impl Int64Column {
    pub fn new(type_code: TypeCode, page_capacity: usize) -> Self {
        assert!(
            matches!(type_code, TypeCode::I64 | TypeCode::F64 | TypeCode::Instant | TypeCode::LocalDateTime),
            "{type_code:?} does not fit the int64 column family"
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

    pub fn put(&self, global_offset: u64, value: i64) {
        self.store.put(global_offset, value);
    }

    pub fn put_null(&self, global_offset: u64) {
        self.store.put_null(global_offset);
    }

    pub fn get(&self, global_offset: u64) -> Option<i64> {
        self.store.get(global_offset)
    }

    fn rows(&self, offsets: Vec<u64>) -> Vec<RowId> {
        self.store.to_row_ids(offsets)
    }

    pub fn scan_all(&self) -> Vec<RowId> {
        self.rows(self.store.scan(|v| v.is_some(), None))
    }

    pub fn scan_equals(&self, v: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| cell == Some(&v), limit))
    }

    pub fn scan_not_equals(&self, v: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x != v), limit))
    }

    pub fn scan_gt(&self, v: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x > v), limit))
    }

    pub fn scan_ge(&self, v: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x >= v), limit))
    }

    pub fn scan_lt(&self, v: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x < v), limit))
    }

    pub fn scan_le(&self, v: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x <= v), limit))
    }

    pub fn scan_between(&self, lo: i64, hi: i64, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if *x >= lo && *x <= hi), limit))
    }

    pub fn scan_in(&self, values: &[i64], limit: Option<usize>) -> Vec<RowId> {
        let set: HashSet<i64> = values.iter().copied().collect();
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
    fn scan_between_inclusive_on_epoch_millis() {
        let col = Int64Column::new(TypeCode::Instant, 4096);
        col.put(0, 1_000);
        col.put(1, 2_000);
        col.put(2, 3_000);
        assert_eq!(col.scan_between(1_000, 2_000, None).len(), 2);
    }
}
