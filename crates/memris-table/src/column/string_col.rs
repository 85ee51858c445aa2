use hashbrown::HashSet;

use crate::rowid::RowId;

use super::store::PagedStore;

/// The third column family (spec.md §3 "Column"): `String`.
pub struct StringColumn {
    store: PagedStore<String>,
}

impl Default for StringColumn {
    fn default() -> Self {
        Self::new(crate::page::DEFAULT_PAGE_CAPACITY)
    }
}

impl StringColumn {
    pub fn new(page_capacity: usize) -> Self {
        Self { store: PagedStore::new(page_capacity) }
    }

    pub fn page_capacity(&self) -> usize {
        self.store.page_capacity()
    }

    pub fn published(&self) -> u64 {
        self.store.published()
    }

    pub fn put(&self, global_offset: u64, value: String) {
        self.store.put(global_offset, value);
    }

    pub fn put_null(&self, global_offset: u64) {
        self.store.put_null(global_offset);
    }

    pub fn get(&self, global_offset: u64) -> Option<String> {
        self.store.get(global_offset)
    }

    fn rows(&self, offsets: Vec<u64>) -> Vec<RowId> {
        self.store.to_row_ids(offsets)
    }

    pub fn scan_all(&self) -> Vec<RowId> {
        self.rows(self.store.scan(|v| v.is_some(), None))
    }

    pub fn scan_equals(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x == v), limit))
    }

    pub fn scan_not_equals(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x != v), limit))
    }

    pub fn scan_equals_ignore_case(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.eq_ignore_ascii_case(v)), limit))
    }

    pub fn scan_gt(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.as_str() > v), limit))
    }

    pub fn scan_ge(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.as_str() >= v), limit))
    }

    pub fn scan_lt(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.as_str() < v), limit))
    }

    pub fn scan_le(&self, v: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.as_str() <= v), limit))
    }

    pub fn scan_between(&self, lo: &str, hi: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.as_str() >= lo && x.as_str() <= hi), limit))
    }

    pub fn scan_in(&self, values: &[String], limit: Option<usize>) -> Vec<RowId> {
        let set: HashSet<&str> = values.iter().map(String::as_str).collect();
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if set.contains(x.as_str())), limit))
    }

    pub fn scan_null(&self, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| cell.is_none(), limit))
    }

    pub fn scan_not_null(&self, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| cell.is_some(), limit))
    }

    pub fn scan_starts_with(&self, prefix: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.starts_with(prefix)), limit))
    }

    pub fn scan_ends_with(&self, suffix: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.ends_with(suffix)), limit))
    }

    pub fn scan_contains(&self, needle: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if x.contains(needle)), limit))
    }

    pub fn scan_not_contains(&self, needle: &str, limit: Option<usize>) -> Vec<RowId> {
        self.rows(self.store.scan(|cell| matches!(cell, Some(x) if !x.contains(needle)), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_ignore_case() {
        let col = StringColumn::default();
        col.put(0, "Johnson".to_string());
        assert_eq!(col.scan_equals_ignore_case("johnson", None).len(), 1);
        assert_eq!(col.scan_equals("johnson", None).len(), 0);
    }

    #[test]
    fn starts_with_matches_prefix() {
        let col = StringColumn::default();
        col.put(0, "Johnson".to_string());
        col.put(1, "Johnston".to_string());
        col.put(2, "Smith".to_string());
        assert_eq!(col.scan_starts_with("John", None).len(), 2);
    }
}
