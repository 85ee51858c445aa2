use hashbrown::HashMap;
use memris_primitives::{Result, TableId};
use parking_lot::RwLock;

use crate::options::{PageOptions, RowIdSetOptions, SeqlockOptions};
use crate::table::Table;

/// Bundles the three sizing knobs a fresh arena hands to every table it
/// creates (spec.md §12).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaOptions {
    pub page: PageOptions,
    pub row_id_set: RowIdSetOptions,
    pub seqlock: SeqlockOptions,
    pub initial_table_capacity: usize,
}

/// A named region owning a set of tables (spec.md §4.2 "Arena"). Tables are
/// addressed by [`TableId`] once created; `close` drops every table the
/// arena owns, releasing their storage.
pub struct Arena {
    name: String,
    options: ArenaOptions,
    tables: RwLock<HashMap<TableId, Table>>,
    next_table_id: RwLock<u32>,
}

impl Arena {
    pub fn new(name: impl Into<String>, options: ArenaOptions) -> Self {
        Self {
            name: name.into(),
            options,
            tables: RwLock::new(HashMap::with_capacity(options.initial_table_capacity)),
            next_table_id: RwLock::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> ArenaOptions {
        self.options
    }

    /// Creates and registers a table, using the arena's page/seqlock sizing
    /// (spec.md §12).
    pub fn create_table(
        &self,
        name: impl Into<String>,
        schema: Vec<crate::table::ColumnDef>,
        id_position: memris_primitives::ColumnPosition,
    ) -> TableId {
        let table = Table::with_seqlock_retries(
            name,
            schema,
            id_position,
            self.options.page.page_capacity,
            self.options.seqlock.max_retries,
        );
        let mut next = self.next_table_id.write();
        let id = TableId(*next);
        *next += 1;
        self.tables.write().insert(id, table);
        log::debug!("arena {}: created table {id:?}", self.name);
        id
    }

    pub fn table(&self, id: TableId) -> Option<parking_lot::MappedRwLockReadGuard<'_, Table>> {
        parking_lot::RwLockReadGuard::try_map(self.tables.read(), |m| m.get(&id)).ok()
    }

    pub fn table_by_name(&self, name: &str) -> Option<parking_lot::MappedRwLockReadGuard<'_, Table>> {
        parking_lot::RwLockReadGuard::try_map(self.tables.read(), |m| m.values().find(|t| t.name() == name)).ok()
    }

    pub fn drop_table(&self, id: TableId) -> bool {
        self.tables.write().remove(&id).is_some()
    }

    /// Releases every table the arena owns (spec.md §4.2 "coordinated
    /// close()"). Memris carries no persistence layer (spec.md Non-goals),
    /// so close is just a coordinated drop — there is nothing to flush.
    pub fn close(&self) -> Result<()> {
        let mut tables = self.tables.write();
        log::debug!("arena {}: closing {} tables", self.name, tables.len());
        tables.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnDef;
    use memris_primitives::{ColumnPosition, TypeCode};
    use memris_sats::StorageValue;

    #[test]
    fn create_lookup_and_close() {
        let arena = Arena::new("default", ArenaOptions::default());
        let id = arena.create_table(
            "person",
            vec![
                ColumnDef { name: "id".into(), position: ColumnPosition(0), type_code: TypeCode::I64 },
                ColumnDef { name: "name".into(), position: ColumnPosition(1), type_code: TypeCode::String },
            ],
            ColumnPosition(0),
        );
        {
            let table = arena.table(id).unwrap();
            table.insert(&[StorageValue::I64(1), StorageValue::String("Ada".into())]);
            assert_eq!(table.scan_all().len(), 1);
        }
        assert!(arena.table_by_name("person").is_some());
        arena.close().unwrap();
        assert!(arena.table(id).is_none());
    }
}
