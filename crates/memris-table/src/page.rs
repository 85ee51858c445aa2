use parking_lot::RwLock;

/// Default page capacity (spec.md §3 "Page": "organized into pages of fixed
/// capacity (typically 4096)").
pub const DEFAULT_PAGE_CAPACITY: usize = 4096;

/// One fixed-capacity chunk of a column (spec.md §4.1). Each cell is an
/// `Option<T>` behind its own lock so a single writer can mutate cell `i`
/// without taking a lock that would block readers of cell `j != i`; the
/// column's `published` watermark (not this type) is what actually
/// guarantees cross-thread visibility of a committed write (spec.md §5
/// "Column watermark") — the per-cell lock exists only to satisfy Rust's
/// aliasing rules, matching spec.md §4.1's "single writer per offset"
/// discipline in safe code.
pub struct Page<T> {
    cells: Box<[RwLock<Option<T>>]>,
}

impl<T> Page<T> {
    pub fn new(capacity: usize) -> Self {
        let cells = std::iter::repeat_with(|| RwLock::new(None)).take(capacity).collect();
        Self { cells }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn put(&self, offset_in_page: usize, value: T) {
        *self.cells[offset_in_page].write() = Some(value);
    }

    pub fn put_null(&self, offset_in_page: usize) {
        *self.cells[offset_in_page].write() = None;
    }

    pub fn get(&self, offset_in_page: usize) -> Option<T>
    where
        T: Clone,
    {
        self.cells[offset_in_page].read().clone()
    }

    pub fn is_present(&self, offset_in_page: usize) -> bool {
        self.cells[offset_in_page].read().is_some()
    }

    pub fn with<R>(&self, offset_in_page: usize, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.cells[offset_in_page].read().as_ref())
    }
}
