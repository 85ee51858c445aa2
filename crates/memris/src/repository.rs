use hashbrown::HashMap;
use memris_execution::{execute, ExecutionOutcome, IndexCatalog, JoinRuntime};
use memris_primitives::{Error, Result, TableId};
use memris_query::MethodSource;
use memris_sats::StorageValue;
use memris_schema::{EntityDef, Materializer, Saver};
use memris_table::{Arena, Table};

use crate::cache::PlanCache;

/// The interpreter a generated repository implementation drives per call
/// (spec.md §9 "generate once from the metadata descriptor at startup ...
/// or a small interpreter driven by the `CompiledQuery`"). Binds one
/// entity's table, its joined entities' tables, and a compiled-plan cache;
/// `M` is the host's materializer/saver for this entity.
pub struct Repository<'a, M> {
    arena: &'a Arena,
    table_id: TableId,
    entity: EntityDef,
    entities: HashMap<String, EntityDef>,
    entity_tables: HashMap<String, TableId>,
    catalog: IndexCatalog,
    cache: PlanCache,
    materializer: M,
}

impl<'a, M> Repository<'a, M>
where
    M: Materializer,
    M: Saver<Input = <M as Materializer>::Output>,
{
    pub fn new(
        arena: &'a Arena,
        table_id: TableId,
        entity: EntityDef,
        entities: HashMap<String, EntityDef>,
        entity_tables: HashMap<String, TableId>,
        catalog: IndexCatalog,
        materializer: M,
    ) -> Self {
        Self { arena, table_id, entity, entities, entity_tables, catalog, cache: PlanCache::new(), materializer }
    }

    fn root(&self) -> parking_lot::MappedRwLockReadGuard<'_, Table> {
        self.arena.table(self.table_id).expect("repository's table was dropped out from under it")
    }

    /// Plans (from cache when possible), compiles, and executes a
    /// condition-driven method — everything except the entity-shaped
    /// built-ins, which bypass this path entirely (see `save`/`delete`
    /// below).
    fn dispatch(&self, method_key: &str, source: &MethodSource, params: &[StorageValue]) -> Result<ExecutionOutcome> {
        let root = self.root();
        let compiled = self.cache.get_or_compile(method_key, source, &self.entity, &self.entities)?;

        let join_tables: Vec<_> = compiled
            .joins
            .iter()
            .map(|j| {
                let id = *self
                    .entity_tables
                    .get(&j.target_entity)
                    .ok_or_else(|| Error::invalid_query(format!("no table registered for joined entity '{}'", j.target_entity)))?;
                self.arena
                    .table(id)
                    .ok_or_else(|| Error::invalid_query(format!("joined table for entity '{}' is not open", j.target_entity)))
            })
            .collect::<Result<Vec<_>>>()?;
        let join_refs: Vec<&Table> = join_tables.iter().map(|g| &**g).collect();
        let joins = JoinRuntime::new(&compiled.joins, join_refs);

        execute(&compiled, &root, &joins, &self.catalog, params)
    }

    /// Runs a `find`-family method and materializes every matching row.
    pub fn find_list(&self, method_key: &str, source: &MethodSource, params: &[StorageValue]) -> Result<Vec<M::Output>> {
        match self.dispatch(method_key, source, params)? {
            ExecutionOutcome::Rows(sel) => {
                let root = self.root();
                sel.iter().map(|r| self.materializer.materialize(&root, r)).collect()
            }
            other => Err(Error::invalid_query(format!("'{method_key}' did not produce a row selection ({other:?})")).with_method(method_key)),
        }
    }

    /// Runs a method whose return kind is a single optional row (spec.md
    /// §4.8 "Cardinality"), erroring if more than one row matched.
    pub fn find_optional(&self, method_key: &str, source: &MethodSource, params: &[StorageValue]) -> Result<Option<M::Output>> {
        match self.dispatch(method_key, source, params)? {
            ExecutionOutcome::Rows(sel) => {
                if sel.len() > 1 {
                    return Err(Error::cardinality(format!("expected at most one row, found {}", sel.len())).with_method(method_key));
                }
                let root = self.root();
                sel.iter().next().map(|r| self.materializer.materialize(&root, r)).transpose()
            }
            other => Err(Error::invalid_query(format!("'{method_key}' did not produce a row selection ({other:?})")).with_method(method_key)),
        }
    }

    pub fn count(&self, method_key: &str, source: &MethodSource, params: &[StorageValue]) -> Result<usize> {
        match self.dispatch(method_key, source, params)? {
            ExecutionOutcome::Count(n) => Ok(n),
            other => Err(Error::invalid_query(format!("'{method_key}' did not produce a count ({other:?})")).with_method(method_key)),
        }
    }

    pub fn exists(&self, method_key: &str, source: &MethodSource, params: &[StorageValue]) -> Result<bool> {
        match self.dispatch(method_key, source, params)? {
            ExecutionOutcome::Exists(b) => Ok(b),
            other => Err(Error::invalid_query(format!("'{method_key}' did not produce an existence check ({other:?})")).with_method(method_key)),
        }
    }

    /// Runs an embedded `UPDATE`/`DELETE` or a derived `deleteById`,
    /// returning the affected row count.
    pub fn execute_modifying(&self, method_key: &str, source: &MethodSource, params: &[StorageValue]) -> Result<usize> {
        match self.dispatch(method_key, source, params)? {
            ExecutionOutcome::Affected(n) => Ok(n),
            other => Err(Error::invalid_query(format!("'{method_key}' did not produce an affected-row count ({other:?})")).with_method(method_key)),
        }
    }

    /// `save` (spec.md §4.5's entity-shaped built-in): applied directly by
    /// the `Saver`, never through the condition pipeline — there are no
    /// conditions, only a whole object to write.
    pub fn save(&self, object: &M::Output) -> Result<StorageValue> {
        let root = self.root();
        self.materializer.save(&root, object)
    }

    pub fn save_all(&self, objects: &[M::Output]) -> Result<Vec<StorageValue>> {
        objects.iter().map(|o| self.save(o)).collect()
    }

    /// `delete` (entity-shaped): looks the object's id up directly and
    /// removes the matching row, retracting it from every declared index —
    /// the same row-removal path `deleteById`/`deleteAll` use, just reached
    /// by id lookup instead of a compiled condition group.
    pub fn delete(&self, object: &M::Output) -> Result<usize> {
        let Some(id) = self.materializer.extract_id(object) else {
            return Ok(0);
        };
        let root = self.root();
        let Some(row) = root.lookup_by_id(&id) else {
            return Ok(0);
        };
        Ok(usize::from(root.delete(row.id)))
    }

    pub fn delete_all(&self, objects: &[M::Output]) -> Result<usize> {
        let mut affected = 0;
        for o in objects {
            affected += self.delete(o)?;
        }
        Ok(affected)
    }
}
