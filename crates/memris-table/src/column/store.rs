use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::page::Page;
use crate::rowid::RowId;

/// The paged storage shared by every column family (spec.md §4.1): a lazily
/// allocated page vector and a monotonically non-decreasing `published`
/// watermark guarding reader visibility.
///
/// Readers read `published` with an acquire load and only ever iterate `[0,
/// published)`; a writer advances it with a release store strictly after
/// the cell write completes, which is the one ordering guarantee spec.md §5
/// ("Column watermark") actually asks for.
pub struct PagedStore<T> {
    page_capacity: usize,
    pages: RwLock<Vec<Option<Arc<Page<T>>>>>,
    published: AtomicU64,
}

impl<T> PagedStore<T> {
    pub fn new(page_capacity: usize) -> Self {
        Self {
            page_capacity,
            pages: RwLock::new(Vec::new()),
            published: AtomicU64::new(0),
        }
    }

    pub fn page_capacity(&self) -> usize {
        self.page_capacity
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    fn split(&self, global_offset: u64) -> (usize, usize) {
        ((global_offset as usize) / self.page_capacity, (global_offset as usize) % self.page_capacity)
    }

    fn page_for_write(&self, page_idx: usize) -> Arc<Page<T>> {
        {
            let pages = self.pages.read();
            if let Some(Some(p)) = pages.get(page_idx) {
                return p.clone();
            }
        }
        let mut pages = self.pages.write();
        if pages.len() <= page_idx {
            pages.resize_with(page_idx + 1, || None);
        }
        if pages[page_idx].is_none() {
            log::trace!("allocating column page {page_idx} (capacity {})", self.page_capacity);
            pages[page_idx] = Some(Arc::new(Page::new(self.page_capacity)));
        }
        pages[page_idx].clone().unwrap()
    }

    fn page_for_read(&self, page_idx: usize) -> Option<Arc<Page<T>>> {
        self.pages.read().get(page_idx).and_then(|p| p.clone())
    }

    /// Writer-side: must be called by a single writer per offset (external
    /// serialization by the table's sequence lock, spec.md §4.1).
    pub fn put(&self, global_offset: u64, value: T) {
        let (page_idx, in_page) = self.split(global_offset);
        let page = self.page_for_write(page_idx);
        page.put(in_page, value);
        self.advance_published(global_offset + 1);
    }

    pub fn put_null(&self, global_offset: u64) {
        let (page_idx, in_page) = self.split(global_offset);
        let page = self.page_for_write(page_idx);
        page.put_null(in_page);
        self.advance_published(global_offset + 1);
    }

    fn advance_published(&self, at_least: u64) {
        self.published.fetch_max(at_least, Ordering::Release);
    }

    pub fn get(&self, global_offset: u64) -> Option<T>
    where
        T: Clone,
    {
        if global_offset >= self.published() {
            return None;
        }
        let (page_idx, in_page) = self.split(global_offset);
        self.page_for_read(page_idx).and_then(|p| p.get(in_page))
    }

    pub fn is_present(&self, global_offset: u64) -> bool {
        if global_offset >= self.published() {
            return false;
        }
        let (page_idx, in_page) = self.split(global_offset);
        self.page_for_read(page_idx).is_some_and(|p| p.is_present(in_page))
    }

    /// Iterates every published global offset, regardless of presence.
    /// Scan primitives build on this to stay within `[0, published)` (spec.md
    /// §4.1 "Reader discipline").
    pub fn scan(&self, mut pred: impl FnMut(Option<&T>) -> bool, limit: Option<usize>) -> Vec<u64> {
        let published = self.published();
        let mut out = Vec::new();
        let mut offset = 0u64;
        while offset < published {
            let (page_idx, in_page_start) = self.split(offset);
            let page = self.page_for_read(page_idx);
            let remaining_in_page = self.page_capacity - in_page_start;
            let span = remaining_in_page.min((published - offset) as usize);
            match &page {
                Some(p) => {
                    for i in 0..span {
                        if p.with(in_page_start + i, |v| pred(v)) {
                            out.push(offset + i as u64);
                            if limit.is_some_and(|l| out.len() >= l) {
                                return out;
                            }
                        }
                    }
                }
                None => {
                    // An unallocated page has no present cells; a null
                    // predicate still needs a chance to match `None`.
                    for i in 0..span {
                        if pred(None) {
                            out.push(offset + i as u64);
                            if limit.is_some_and(|l| out.len() >= l) {
                                return out;
                            }
                        }
                    }
                }
            }
            offset += span as u64;
        }
        out
    }

    pub fn to_row_ids(&self, offsets: Vec<u64>) -> Vec<RowId> {
        offsets.into_iter().map(|o| RowId::from_global_offset(o, self.page_capacity as u32)).collect()
    }
}
