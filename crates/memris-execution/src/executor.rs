use memris_expr::Direction;
use memris_physical_plan::{CompiledCondition, CompiledJoin, CompiledOrderItem, CompiledProjection, CompiledQuery};
use memris_primitives::{ColumnPosition, Error, OpCode, Operator, Result, ReturnKind};
use memris_sats::StorageValue;
use memris_table::{RowId, RowIdSet, RowRef, Selection, Table};

use crate::args::{resolve_arg, resolve_args};
use crate::catalog::IndexCatalog;
use crate::outcome::ExecutionOutcome;
use crate::probe;

/// Matches [`memris_table::rowid_set::DEFAULT_DENSE_UPGRADE_THRESHOLD`],
/// which isn't re-exported; the executor only ever combines already-probed
/// sets, so the threshold only affects representation, never correctness.
const SCAN_DENSE_THRESHOLD: usize = 4096;

/// Resolved runtime backing for a `CompiledQuery`'s `joins`: one target
/// `Table` per `CompiledJoin`, in the same order (spec.md §4.7 "runtime
/// wiring ... attached later by the external wiring step when the
/// repository is built").
pub struct JoinRuntime<'t> {
    joins: &'t [CompiledJoin],
    tables: Vec<&'t Table>,
}

impl<'t> JoinRuntime<'t> {
    pub fn new(joins: &'t [CompiledJoin], tables: Vec<&'t Table>) -> Self {
        assert_eq!(joins.len(), tables.len(), "one target table per compiled join");
        Self { joins, tables }
    }

    fn target_rows(&self, idx: usize, root: &Table, row: RowId) -> Vec<RowId> {
        let join = &self.joins[idx];
        let target = self.tables[idx];
        let Some(source_values) = root.read_row(row) else { return Vec::new() };
        let Some(source_value) = source_values.get(join.source_column.0 as usize) else { return Vec::new() };
        match join.target_column {
            None => target.lookup_by_id(source_value).map(|r| vec![r.id]).unwrap_or_default(),
            Some(col) => target.column(col).scan_op(Operator::Eq, std::slice::from_ref(source_value), false, None),
        }
    }

    /// The value a condition/order item/projection item sees for `row`,
    /// crossing the named join if one applies. `None` both for a deleted
    /// row and for a join with no matching target row (spec.md §4.8 "a
    /// join-crossing condition with no matching target row").
    pub(crate) fn value_at(&self, join: Option<usize>, column: ColumnPosition, root: &Table, row: RowId) -> Option<StorageValue> {
        match join {
            None => root.read_row(row)?.into_iter().nth(column.0 as usize),
            Some(idx) => {
                let target_row = self.target_rows(idx, root, row).into_iter().next()?;
                self.tables[idx].read_row(target_row)?.into_iter().nth(column.0 as usize)
            }
        }
    }

    fn evaluate(&self, cond: &CompiledCondition, args: &[StorageValue], root: &Table, row: RowId) -> bool {
        let idx = cond.join.expect("evaluate is only called for join-crossing conditions");
        let targets = self.target_rows(idx, root, row);
        if targets.is_empty() {
            return cond.operator == Operator::IsNull;
        }
        let target = self.tables[idx];
        targets.into_iter().any(|t| {
            target
                .read_row(t)
                .is_some_and(|values| eval_operator(cond.operator, &values[cond.column.0 as usize], args, cond.case_ignore))
        })
    }
}

fn values_eq(a: &StorageValue, b: &StorageValue, case_ignore: bool) -> bool {
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) if case_ignore => x.eq_ignore_ascii_case(y),
        _ => a.partial_cmp(b) == Some(std::cmp::Ordering::Equal),
    }
}

fn str_pair(value: &StorageValue, arg: &StorageValue, case_ignore: bool) -> Option<(String, String)> {
    let (v, a) = (value.as_str()?, arg.as_str()?);
    Some(if case_ignore { (v.to_lowercase(), a.to_lowercase()) } else { (v.to_string(), a.to_string()) })
}

/// Single-value predicate evaluator used for join-crossing conditions,
/// which have no cross-table index to probe and so are always evaluated
/// row by row (spec.md §4.8 "a condition crossing a relationship has no
/// index to probe and is evaluated per candidate row").
fn eval_operator(op: Operator, value: &StorageValue, args: &[StorageValue], case_ignore: bool) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match op {
        Operator::IsNull => value.is_null(),
        Operator::IsNotNull => !value.is_null(),
        Operator::Eq => values_eq(value, &args[0], case_ignore),
        Operator::Ne => !values_eq(value, &args[0], case_ignore),
        Operator::Gt => matches!(value.partial_cmp(&args[0]), Some(Greater)),
        Operator::Ge => matches!(value.partial_cmp(&args[0]), Some(Greater | Equal)),
        Operator::Lt => matches!(value.partial_cmp(&args[0]), Some(Less)),
        Operator::Le => matches!(value.partial_cmp(&args[0]), Some(Less | Equal)),
        Operator::Between => {
            matches!(value.partial_cmp(&args[0]), Some(Greater | Equal)) && matches!(value.partial_cmp(&args[1]), Some(Less | Equal))
        }
        Operator::In => args.iter().any(|a| values_eq(value, a, case_ignore)),
        Operator::NotIn => !args.iter().any(|a| values_eq(value, a, case_ignore)),
        Operator::StartsWith => str_pair(value, &args[0], case_ignore).is_some_and(|(v, a)| v.starts_with(&a)),
        Operator::EndsWith => str_pair(value, &args[0], case_ignore).is_some_and(|(v, a)| v.ends_with(&a)),
        Operator::Contains => str_pair(value, &args[0], case_ignore).is_some_and(|(v, a)| v.contains(&a)),
        Operator::NotContains => str_pair(value, &args[0], case_ignore).is_some_and(|(v, a)| !v.contains(&a)),
        Operator::Like => str_pair(value, &args[0], case_ignore).is_some_and(|(v, a)| v.contains(a.trim_matches('%'))),
        Operator::NotLike => str_pair(value, &args[0], case_ignore).is_some_and(|(v, a)| !v.contains(a.trim_matches('%'))),
        Operator::ILike => str_pair(value, &args[0], true).is_some_and(|(v, a)| v.contains(a.trim_matches('%'))),
    }
}

fn intersect_opt(acc: Option<RowIdSet>, hit: RowIdSet) -> RowIdSet {
    match acc {
        Some(existing) => existing.intersect(&hit, SCAN_DENSE_THRESHOLD),
        None => hit,
    }
}

/// Runs spec.md §4.8's index-selection algorithm for one AND-group:
/// composite probe, then per-condition single-column probes, then a
/// column-scan fallback for whatever's left, then a per-row filter for any
/// condition crossing a relationship.
fn evaluate_group(
    group: &memris_physical_plan::ConditionGroup,
    root: &Table,
    joins: &JoinRuntime,
    catalog: &IndexCatalog,
    params: &[StorageValue],
) -> Result<RowIdSet> {
    let resolved: Vec<Vec<StorageValue>> = group.conditions.iter().map(|c| resolve_args(&c.args, params)).collect::<Result<_>>()?;
    let mut consumed = vec![false; group.conditions.len()];
    let mut acc: Option<RowIdSet> = None;

    if let Some(shape) = &group.composite {
        if let Some(id) = catalog.composite_index(&shape.index_name) {
            if let Some(handle) = root.index(id) {
                let hit = probe::probe_composite(&handle, shape, &group.conditions, &resolved)?;
                log::debug!("group served by composite index {} ({id:?})", shape.index_name);
                acc = Some(intersect_opt(acc, hit));
                for &i in &shape.consumed {
                    consumed[i] = true;
                }
            }
        }
    }

    for (i, cond) in group.conditions.iter().enumerate() {
        if consumed[i] || cond.join.is_some() {
            continue;
        }
        let Some(id) = catalog.single_index(cond.column) else { continue };
        let Some(handle) = root.index(id) else { continue };
        if let Some(hit) = probe::probe_single(&handle, cond, &resolved[i])? {
            log::debug!("condition on {} served by index {id:?}", cond.column);
            acc = Some(intersect_opt(acc, hit));
            consumed[i] = true;
        }
    }

    for (i, cond) in group.conditions.iter().enumerate() {
        if consumed[i] || cond.join.is_some() {
            continue;
        }
        #[cfg(feature = "unindexed_scan_warn")]
        log::warn!("condition on {} fell back to a full column scan (no usable index)", cond.column);
        let hits: RowIdSet = root.column(cond.column).scan_op(cond.operator, &resolved[i], cond.case_ignore, None).into_iter().collect();
        acc = Some(intersect_opt(acc, hits));
    }

    let mut ids = match acc {
        Some(set) => set.to_vec(),
        None => root.scan_all().to_offsets(),
    };

    let join_conditions: Vec<(usize, &CompiledCondition)> = group.conditions.iter().enumerate().filter(|(_, c)| c.join.is_some()).collect();
    if !join_conditions.is_empty() {
        ids.retain(|&row| join_conditions.iter().all(|(i, cond)| joins.evaluate(cond, &resolved[*i], root, row)));
    }

    Ok(ids.into_iter().collect())
}

fn base_selection(plan: &CompiledQuery, root: &Table, joins: &JoinRuntime, catalog: &IndexCatalog, params: &[StorageValue]) -> Result<Selection> {
    let ids: Vec<RowId> = if plan.groups.is_empty() {
        root.scan_all().to_offsets()
    } else {
        let mut union: Option<RowIdSet> = None;
        for group in &plan.groups {
            let hit = evaluate_group(group, root, joins, catalog, params)?;
            union = Some(match union {
                Some(existing) => existing.union(&hit, SCAN_DENSE_THRESHOLD),
                None => hit,
            });
        }
        union.unwrap_or_default().to_vec()
    };
    let selection = Selection::from_offsets(ids, |id| root.current_generation(id).unwrap_or_default());
    Ok(selection.materializable(|id| root.current_generation(id)))
}

fn compare_rows(order_by: &[CompiledOrderItem], joins: &JoinRuntime, root: &Table, a: RowId, b: RowId) -> std::cmp::Ordering {
    for item in order_by {
        let va = joins.value_at(item.join, item.column, root, a);
        let vb = joins.value_at(item.join, item.column, root, b);
        let ord = match (va, vb) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        let ord = if item.direction == Direction::Desc { ord.reverse() } else { ord };
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}

/// Linear-scan dedup: `StorageValue` carries `f32`/`f64` lanes and so has
/// no `Eq`/`Hash` impl, ruling out a hash-set-based version.
fn dedup_selection(projection: &Option<CompiledProjection>, joins: &JoinRuntime, root: &Table, selection: Selection) -> Selection {
    let mut seen: Vec<Vec<Option<StorageValue>>> = Vec::new();
    let mut out = Vec::new();
    for r in selection.iter() {
        let key: Vec<Option<StorageValue>> = match projection {
            Some(p) => p.items.iter().map(|item| joins.value_at(item.join, item.column, root, r.id)).collect(),
            None => root.read_row(r.id).map(|values| values.into_iter().map(Some).collect()).unwrap_or_default(),
        };
        if !seen.contains(&key) {
            seen.push(key);
            out.push(r);
        }
    }
    Selection::from_refs(out)
}

fn select_rows(plan: &CompiledQuery, root: &Table, joins: &JoinRuntime, catalog: &IndexCatalog, params: &[StorageValue]) -> Result<Selection> {
    let mut selection = base_selection(plan, root, joins, catalog, params)?;

    if !plan.order_by.is_empty() {
        let mut rows: Vec<RowRef> = selection.iter().collect();
        rows.sort_by(|a, b| compare_rows(&plan.order_by, joins, root, a.id, b.id));
        selection = Selection::from_refs(rows);
    }
    if plan.distinct {
        selection = dedup_selection(&plan.projection, joins, root, selection);
    }
    if let Some(limit) = plan.limit {
        selection.truncate(limit);
    }
    Ok(selection)
}

fn execute_update(plan: &CompiledQuery, root: &Table, joins: &JoinRuntime, catalog: &IndexCatalog, params: &[StorageValue]) -> Result<ExecutionOutcome> {
    let selection = base_selection(plan, root, joins, catalog, params)?;
    let mut changes = Vec::with_capacity(plan.update_assignments.len());
    for assignment in &plan.update_assignments {
        changes.push((assignment.column, resolve_arg(&assignment.value, params)?));
    }
    let affected = selection.iter().filter(|r| root.update_in_place(r.id, &changes)).count();
    log::debug!("update matched {} row(s), applied to {affected}", selection.len());
    Ok(ExecutionOutcome::Affected(affected))
}

fn execute_delete(plan: &CompiledQuery, root: &Table, joins: &JoinRuntime, catalog: &IndexCatalog, params: &[StorageValue]) -> Result<ExecutionOutcome> {
    let selection = base_selection(plan, root, joins, catalog, params)?;
    let affected = selection.iter().filter(|r| root.delete(r.id)).count();
    log::debug!("delete matched {} row(s), removed {affected}", selection.len());
    Ok(ExecutionOutcome::Affected(affected))
}

/// Runs a compiled query to completion against a live table (spec.md §4.8).
pub fn execute(plan: &CompiledQuery, root: &Table, joins: &JoinRuntime, catalog: &IndexCatalog, params: &[StorageValue]) -> Result<ExecutionOutcome> {
    match plan.op {
        OpCode::Update => return execute_update(plan, root, joins, catalog, params),
        OpCode::Delete => return execute_delete(plan, root, joins, catalog, params),
        OpCode::CountAll => return Ok(ExecutionOutcome::Count(root.scan_all().len())),
        OpCode::Find | OpCode::Count | OpCode::Exists => {}
    }

    let selection = select_rows(plan, root, joins, catalog, params)?;
    match plan.return_kind {
        ReturnKind::Count => Ok(ExecutionOutcome::Count(selection.len())),
        ReturnKind::Boolean => Ok(ExecutionOutcome::Exists(!selection.is_empty())),
        ReturnKind::Optional => {
            if selection.len() > 1 {
                return Err(Error::cardinality(format!("expected at most one row, found {}", selection.len())));
            }
            Ok(ExecutionOutcome::Rows(selection))
        }
        ReturnKind::List => Ok(ExecutionOutcome::Rows(selection)),
        ReturnKind::Modifying => unreachable!("Modifying only pairs with Update/Delete, handled above"),
    }
}
