use hashbrown::HashMap;
use memris_execution::{execute, ExecutionOutcome, IndexCatalog, JoinRuntime};
use memris_expr::LogicalQuery;
use memris_physical_plan::CompiledQuery;
use memris_sats::StorageValue;
use memris_schema::EntityDef;
use memris_sql_parser::QueryContext;
use memris_table::Table;

use crate::error::Result;
use crate::source::MethodSource;

/// Runs whichever front-end `source` names, producing the `LogicalQuery`
/// both front-ends converge on (spec.md §9).
pub fn plan_logical(source: &MethodSource, entity: &EntityDef, entities: &HashMap<String, EntityDef>) -> Result<LogicalQuery> {
    match source {
        MethodSource::Derived { method_name, param_shape, return_hint } => {
            memris_derived_query::plan_method(method_name, *param_shape, *return_hint, entity, entities).map_err(Into::into)
        }
        MethodSource::Embedded { src, param_names, modifying, native_query, return_arity } => {
            let ctx = QueryContext {
                entity,
                entities,
                param_names,
                modifying: *modifying,
                native_query: *native_query,
                return_arity: *return_arity,
            };
            memris_sql_parser::parse(src, &ctx).map_err(Into::into)
        }
    }
}

/// Plans, then lowers the result against entity metadata into a
/// `CompiledQuery` (spec.md §4.7, the "optimizer entry point" of
/// SPEC_FULL.md's component table).
pub fn compile_method(source: &MethodSource, entity: &EntityDef, entities: &HashMap<String, EntityDef>) -> Result<CompiledQuery> {
    let logical = plan_logical(source, entity, entities)?;
    memris_physical_plan::compile(&logical, entity, entities).map_err(Into::into)
}

/// Plans, compiles, and executes a method in one call: the full front-end
/// to back-end path a repository dispatch interpreter drives per call
/// (spec.md §4.8; the per-method compiled-dispatch cache spec.md §9 asks
/// for is the caller's concern — the `memris` facade crate keeps it keyed
/// by a stable shape hash, not this wiring layer).
pub fn run(
    source: &MethodSource,
    entity: &EntityDef,
    entities: &HashMap<String, EntityDef>,
    table: &Table,
    joins: &JoinRuntime,
    catalog: &IndexCatalog,
    params: &[StorageValue],
) -> Result<ExecutionOutcome> {
    let plan = compile_method(source, entity, entities)?;
    log::debug!("dispatching {} against entity {}", op_name(source), entity.name);
    execute(&plan, table, joins, catalog, params)
}

fn op_name(source: &MethodSource) -> &str {
    match source {
        MethodSource::Derived { method_name, .. } => method_name,
        MethodSource::Embedded { src, .. } => src,
    }
}
