use hashbrown::HashMap;
use memris_primitives::{ColumnPosition, IndexId};

/// Maps an entity's declared indexes to the runtime `IndexId`s a `Table`
/// was given them under. Built once when a repository is wired up (spec.md
/// §4.7 "runtime wiring ... attached later by the external wiring step when
/// the repository is built") and handed to every `execute` call for that
/// entity.
#[derive(Debug, Clone, Default)]
pub struct IndexCatalog {
    single: HashMap<ColumnPosition, IndexId>,
    named: HashMap<String, IndexId>,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single-column index (hash/range/prefix/suffix).
    pub fn register_single(&mut self, column: ColumnPosition, id: IndexId) {
        self.single.insert(column, id);
    }

    /// Registers a composite index under the name the schema declared it
    /// with — the same name `CompositeShape::index_name` carries.
    pub fn register_composite(&mut self, name: impl Into<String>, id: IndexId) {
        self.named.insert(name.into(), id);
    }

    pub fn single_index(&self, column: ColumnPosition) -> Option<IndexId> {
        self.single.get(&column).copied()
    }

    pub fn composite_index(&self, name: &str) -> Option<IndexId> {
        self.named.get(name).copied()
    }
}
