use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use hashbrown::HashMap;
use memris_physical_plan::CompiledQuery;
use memris_primitives::Result;
use memris_query::MethodSource;
use memris_schema::EntityDef;
use parking_lot::RwLock;

/// Caches compiled dispatch per repository method, keyed by a stable shape
/// hash over the entity's field layout rather than the entity's identity
/// (spec.md §9, "cache the compiled dispatch ... keyed by a stable shape
/// hash that includes field layout and converter identity" — converter
/// identity is folded in by the caller via `method_key` when a repository
/// binds more than one converter set to the same entity name).
pub struct PlanCache {
    entries: RwLock<HashMap<(String, u64), Arc<CompiledQuery>>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Returns the cached plan for `method_key` against `entity`'s current
    /// shape, compiling (and caching) it on first use or whenever the
    /// entity's shape hash changes (a schema reload).
    pub fn get_or_compile(
        &self,
        method_key: &str,
        source: &MethodSource,
        entity: &EntityDef,
        entities: &HashMap<String, EntityDef>,
    ) -> Result<Arc<CompiledQuery>> {
        let key = (method_key.to_string(), shape_hash(entity));
        if let Some(plan) = self.entries.read().get(&key) {
            return Ok(plan.clone());
        }
        let compiled = Arc::new(memris_query::compile_method(source, entity, entities)?);
        log::debug!("compiled and cached plan for {method_key} ({} group(s))", compiled.groups.len());
        self.entries.write().insert(key, compiled.clone());
        Ok(compiled)
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new()
    }
}

fn shape_hash(entity: &EntityDef) -> u64 {
    let mut h = DefaultHasher::new();
    entity.name.hash(&mut h);
    entity.id_field.hash(&mut h);
    for field in &entity.fields {
        field.property_name.hash(&mut h);
        field.column_name.hash(&mut h);
        field.position.map(|p| p.0).hash(&mut h);
        field.type_code.hash(&mut h);
        if let Some(rel) = &field.relationship {
            rel.target_entity.hash(&mut h);
            rel.fk_column.hash(&mut h);
        }
    }
    for index in &entity.indexes {
        index.name.hash(&mut h);
        index.fields.hash(&mut h);
    }
    h.finish()
}
