use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use hashbrown::HashMap;
use memris_primitives::{ColumnPosition, IndexId};
use memris_sats::StorageValue;
use parking_lot::RwLock;

use crate::column::ColumnHandle;
use crate::index::{CompositeHashIndex, CompositeRangeIndex, HashIndex, IndexKey, PrefixIndex, RangeIndex, SuffixIndex};
use crate::rowid::{Generation, RowId};
use crate::rowid_set::{DEFAULT_DENSE_UPGRADE_THRESHOLD, RowIdSet};
use crate::seqlock::{DEFAULT_MAX_RETRIES, RowSeqlock};
use crate::selection::{RowRef, Selection};

/// A single named, typed column slot in a table's schema (spec.md §3
/// "Table").
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub position: ColumnPosition,
    pub type_code: memris_primitives::TypeCode,
}

/// One of the five index families, bound to the column(s) it was built
/// over (spec.md §4.3).
pub enum IndexHandle {
    Hash { index: HashIndex, column: ColumnPosition },
    Range { index: RangeIndex, column: ColumnPosition },
    Prefix { index: PrefixIndex, column: ColumnPosition },
    Suffix { index: SuffixIndex, column: ColumnPosition },
    CompositeHash { index: CompositeHashIndex, columns: Vec<ColumnPosition> },
    CompositeRange { index: CompositeRangeIndex, columns: Vec<ColumnPosition> },
}

impl IndexHandle {
    fn columns(&self) -> Vec<ColumnPosition> {
        match self {
            IndexHandle::Hash { column, .. }
            | IndexHandle::Range { column, .. }
            | IndexHandle::Prefix { column, .. }
            | IndexHandle::Suffix { column, .. } => vec![*column],
            IndexHandle::CompositeHash { columns, .. } | IndexHandle::CompositeRange { columns, .. } => columns.clone(),
        }
    }

    fn add(&self, values: &[StorageValue], row: RowId) {
        match self {
            IndexHandle::Hash { index, column } => {
                if let Some(key) = IndexKey::from_storage(&values[column.0 as usize]) {
                    index.add(key, row);
                }
            }
            IndexHandle::Range { index, column } => {
                if let Some(key) = IndexKey::from_storage(&values[column.0 as usize]) {
                    index.add(key, row);
                }
            }
            IndexHandle::Prefix { index, column } => {
                if let Some(s) = values[column.0 as usize].as_str() {
                    index.add(s, row);
                }
            }
            IndexHandle::Suffix { index, column } => {
                if let Some(s) = values[column.0 as usize].as_str() {
                    index.add(s, row);
                }
            }
            IndexHandle::CompositeHash { index, columns } => {
                if let Some(key) = composite_key(values, columns) {
                    index.add(key, row);
                }
            }
            IndexHandle::CompositeRange { index, columns } => {
                if let Some(key) = composite_key(values, columns) {
                    index.add(key, row);
                }
            }
        }
    }

    fn remove(&self, values: &[StorageValue], row: RowId) {
        match self {
            IndexHandle::Hash { index, column } => {
                if let Some(key) = IndexKey::from_storage(&values[column.0 as usize]) {
                    index.remove(&key, row);
                }
            }
            IndexHandle::Range { index, column } => {
                if let Some(key) = IndexKey::from_storage(&values[column.0 as usize]) {
                    index.remove(&key, row);
                }
            }
            IndexHandle::Prefix { index, column } => {
                if let Some(s) = values[column.0 as usize].as_str() {
                    index.remove(s, row);
                }
            }
            IndexHandle::Suffix { index, column } => {
                if let Some(s) = values[column.0 as usize].as_str() {
                    index.remove(s, row);
                }
            }
            IndexHandle::CompositeHash { index, columns } => {
                if let Some(key) = composite_key(values, columns) {
                    index.remove(&key, row);
                }
            }
            IndexHandle::CompositeRange { index, columns } => {
                if let Some(key) = composite_key(values, columns) {
                    index.remove(&key, row);
                }
            }
        }
    }
}

fn composite_key(values: &[StorageValue], columns: &[ColumnPosition]) -> Option<Vec<IndexKey>> {
    columns.iter().map(|c| IndexKey::from_storage(&values[c.0 as usize])).collect()
}

/// Lazily-growing per-offset slot array, used for the per-row seqlock and
/// generation-counter vectors (spec.md §3 "Generation", §5 "per-row
/// sequence lock"). Growth takes the write lock only on the slow path;
/// steady-state access is a read-lock-and-clone of an `Arc`.
struct GrowableSlots<T> {
    inner: RwLock<Vec<Arc<T>>>,
}

impl<T: Default> GrowableSlots<T> {
    fn new() -> Self {
        Self { inner: RwLock::new(Vec::new()) }
    }

    fn ensure(&self, idx: usize) -> Arc<T> {
        if let Some(slot) = self.inner.read().get(idx) {
            return slot.clone();
        }
        let mut w = self.inner.write();
        if w.len() <= idx {
            w.resize_with(idx + 1, || Arc::new(T::default()));
        }
        w[idx].clone()
    }

    fn get(&self, idx: usize) -> Option<Arc<T>> {
        self.inner.read().get(idx).cloned()
    }
}

/// Row lifecycle and primary-key lookup for one table (spec.md §4.2
/// "Table"). Owns its columns, its declared indexes, and the per-row
/// bookkeeping (seqlocks, generations, tombstones, free list) that the
/// rest of the crate's types build on.
pub struct Table {
    name: String,
    schema: Vec<ColumnDef>,
    by_name: HashMap<String, ColumnPosition>,
    columns: Vec<ColumnHandle>,
    id_position: ColumnPosition,
    page_capacity: usize,
    next_offset: AtomicU64,
    free_list: SegQueue<u64>,
    tombstones: RwLock<RowIdSet>,
    seqlocks: GrowableSlots<RowSeqlock>,
    generations: GrowableSlots<AtomicU32>,
    id_map: RwLock<HashMap<IndexKey, u64>>,
    indexes: RwLock<HashMap<IndexId, IndexHandle>>,
    seqlock_max_retries: u32,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Vec<ColumnDef>, id_position: ColumnPosition, page_capacity: usize) -> Self {
        Self::with_seqlock_retries(name, schema, id_position, page_capacity, DEFAULT_MAX_RETRIES)
    }

    pub fn with_seqlock_retries(
        name: impl Into<String>,
        schema: Vec<ColumnDef>,
        id_position: ColumnPosition,
        page_capacity: usize,
        seqlock_max_retries: u32,
    ) -> Self {
        let mut by_name = HashMap::new();
        let mut columns = Vec::with_capacity(schema.len());
        for def in &schema {
            by_name.insert(def.name.clone(), def.position);
            columns.push(ColumnHandle::new(def.type_code, page_capacity));
        }
        Self {
            name: name.into(),
            schema,
            by_name,
            columns,
            id_position,
            page_capacity,
            next_offset: AtomicU64::new(0),
            free_list: SegQueue::new(),
            tombstones: RwLock::new(RowIdSet::new()),
            seqlocks: GrowableSlots::new(),
            generations: GrowableSlots::new(),
            id_map: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashMap::new()),
            seqlock_max_retries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &[ColumnDef] {
        &self.schema
    }

    pub fn column_position(&self, field: &str) -> Option<ColumnPosition> {
        self.by_name.get(field).copied()
    }

    pub fn column(&self, position: ColumnPosition) -> &ColumnHandle {
        &self.columns[position.0 as usize]
    }

    pub fn declare_index(&self, id: IndexId, handle: IndexHandle) {
        self.indexes.write().insert(id, handle);
    }

    pub fn index(&self, id: IndexId) -> Option<parking_lot::MappedRwLockReadGuard<'_, IndexHandle>> {
        parking_lot::RwLockReadGuard::try_map(self.indexes.read(), |m| m.get(&id)).ok()
    }

    fn generation_of(&self, offset: u64) -> Generation {
        self.generations.get(offset as usize).map(|s| Generation(s.load(Ordering::Acquire))).unwrap_or_default()
    }

    /// `None` once the row has been deleted (spec.md §4.4 "Materialization
    /// filters stale references").
    pub fn current_generation(&self, id: RowId) -> Option<Generation> {
        if self.tombstones.read().contains(id) {
            return None;
        }
        Some(self.generation_of(id.to_global_offset(self.page_capacity as u32)))
    }

    fn alloc_offset(&self) -> u64 {
        if let Some(recycled) = self.free_list.pop() {
            return recycled;
        }
        self.next_offset.fetch_add(1, Ordering::Relaxed)
    }

    /// Writes a new row and returns its reference (spec.md §4.2 "insert").
    /// Updates the id map and every declared index.
    pub fn insert(&self, values: &[StorageValue]) -> RowRef {
        assert_eq!(values.len(), self.schema.len(), "value count matches column count");
        let offset = self.alloc_offset();
        let id = RowId::from_global_offset(offset, self.page_capacity as u32);
        let seqlock = self.seqlocks.ensure(offset as usize);
        let generation = self.generations.ensure(offset as usize);
        seqlock.write(|| {
            for (pos, value) in values.iter().enumerate() {
                self.columns[pos].put(offset, value);
            }
        });
        if let Some(key) = IndexKey::from_storage(&values[self.id_position.0 as usize]) {
            self.id_map.write().insert(key, offset);
        }
        for handle in self.indexes.read().values() {
            handle.add(values, id);
        }
        log::trace!("table {}: inserted row {id}", self.name);
        RowRef { id, generation: Generation(generation.load(Ordering::Acquire)) }
    }

    /// Applies in-place field updates (spec.md §4.2 "update_in_place").
    /// Index maintenance for the changed columns is the caller's
    /// responsibility (spec.md §5 "indexes are updated by the caller, outside
    /// the lock").
    pub fn update_in_place(&self, id: RowId, changes: &[(ColumnPosition, StorageValue)]) -> bool {
        if self.tombstones.read().contains(id) {
            return false;
        }
        let offset = id.to_global_offset(self.page_capacity as u32);
        let Some(seqlock) = self.seqlocks.get(offset as usize) else { return false };
        seqlock.write(|| {
            for (pos, value) in changes {
                self.columns[pos.0 as usize].put(offset, value);
            }
        });
        true
    }

    /// Removes a row, retracting it from the id map, every declared index,
    /// and marking its offset free for reuse (spec.md §4.2 "delete", §3
    /// "Deleting a row ... removes entries from every index that referenced
    /// the row").
    pub fn delete(&self, id: RowId) -> bool {
        let offset = id.to_global_offset(self.page_capacity as u32);
        let mut tombstones = self.tombstones.write();
        if tombstones.contains(id) {
            return false;
        }
        let Some(old_values) = self.read_row_unlocked(offset) else {
            return false;
        };
        if let Some(key) = IndexKey::from_storage(&old_values[self.id_position.0 as usize]) {
            self.id_map.write().remove(&key);
        }
        for handle in self.indexes.read().values() {
            handle.remove(&old_values, id);
        }
        tombstones.insert(id, DEFAULT_DENSE_UPGRADE_THRESHOLD);
        drop(tombstones);
        let generation = self.generations.ensure(offset as usize);
        generation.fetch_add(1, Ordering::Release);
        self.free_list.push(offset);
        log::trace!("table {}: deleted row {id}", self.name);
        true
    }

    fn read_row_unlocked(&self, offset: u64) -> Option<Vec<StorageValue>> {
        let values: Vec<StorageValue> =
            self.columns.iter().map(|c| c.get(offset, c.type_code()).unwrap_or(StorageValue::Null)).collect();
        if values.iter().all(|v| v.is_null()) {
            return None;
        }
        Some(values)
    }

    /// Optimistic-read a row's full set of values, retrying per spec.md §5's
    /// bounded seqlock protocol.
    pub fn read_row(&self, id: RowId) -> Option<Vec<StorageValue>> {
        if self.tombstones.read().contains(id) {
            return None;
        }
        let offset = id.to_global_offset(self.page_capacity as u32);
        let seqlock = self.seqlocks.get(offset as usize)?;
        seqlock.read(self.seqlock_max_retries, || self.read_row_unlocked(offset))
    }

    pub fn lookup_by_id(&self, key: &StorageValue) -> Option<RowRef> {
        let key = IndexKey::from_storage(key)?;
        let offset = *self.id_map.read().get(&key)?;
        let id = RowId::from_global_offset(offset, self.page_capacity as u32);
        Some(RowRef { id, generation: self.generation_of(offset) })
    }

    /// Every live row, in insertion order (spec.md §8 scenario 1).
    pub fn scan_all(&self) -> Selection {
        let published = self.columns.first().map(|c| c.published()).unwrap_or(0);
        let tombstones = self.tombstones.read();
        let mut refs = Vec::new();
        for offset in 0..published {
            let id = RowId::from_global_offset(offset, self.page_capacity as u32);
            if tombstones.contains(id) {
                continue;
            }
            if self.read_row_unlocked(offset).is_none() {
                continue;
            }
            refs.push(RowRef { id, generation: self.generation_of(offset) });
        }
        Selection::from_refs(refs)
    }
}
