use hashbrown::HashMap;
use memris_expr::{ArgRef, Combinator, Condition, ConditionArgs, LogicalQuery};
use memris_primitives::{ColumnPosition, JoinKind, Operator, TypeCode};
use memris_sats::StorageValue;
use memris_schema::{EntityDef, FieldDef, IndexKind};

use crate::compiled::{
    CompiledArgRef, CompiledArgs, CompiledCondition, CompiledJoin, CompiledOrderItem, CompiledProjection, CompiledProjectionItem, CompiledQuery, CompiledUpdateAssignment, CompositeShape,
    ConditionGroup,
};
use crate::error::CompileError;

fn find_by_column_name<'a>(entity: &'a EntityDef, column_name: &str) -> Option<&'a FieldDef> {
    entity.fields.iter().find(|f| f.column_name == column_name)
}

/// Accumulates the joins a compiled query needs, deduplicating on the
/// relationship-path prefix so two conditions crossing the same
/// relationship share one `CompiledJoin` (spec.md §4.7 "Join descriptors").
struct JoinBuilder<'a> {
    entities: &'a HashMap<String, EntityDef>,
    joins: Vec<CompiledJoin>,
    by_prefix: HashMap<Vec<String>, usize>,
}

impl<'a> JoinBuilder<'a> {
    fn new(entities: &'a HashMap<String, EntityDef>) -> Self {
        Self { entities, joins: Vec::new(), by_prefix: HashMap::new() }
    }

    /// Registers a join explicitly declared by the embedded-query parser
    /// (`LogicalQuery.joins`), keyed by the path it traverses.
    fn register_explicit(&mut self, entity: &EntityDef, join: &memris_expr::JoinDescriptor) -> Result<(), CompileError> {
        let field = find_by_column_name(entity, &join.join_column).or_else(|| entity.field(join.path.last().map(String::as_str).unwrap_or_default()));
        let field = field.ok_or_else(|| CompileError::UnknownProperty(join.join_column.clone()))?;
        let source_column = field.position.ok_or_else(|| CompileError::FieldNotStored(join.join_column.clone()))?;
        let target = self.entities.get(&join.target_entity).ok_or_else(|| CompileError::UnknownEntity(join.target_entity.clone()))?;
        let target_column = match &join.referenced_column {
            Some(name) => Some(find_by_column_name(target, name).and_then(|f| f.position).ok_or_else(|| CompileError::FieldNotStored(name.clone()))?),
            None => None,
        };
        let idx = self.joins.len();
        self.joins.push(CompiledJoin {
            source_column,
            source_type_code: field.type_code,
            target_entity: join.target_entity.clone(),
            target_column,
            kind: join.kind,
        });
        self.by_prefix.insert(join.path.clone(), idx);
        Ok(())
    }

    /// Resolves `path` against `root`, synthesizing a join the first time a
    /// relationship prefix is crossed implicitly (the derived-method
    /// front-end never emits `JoinDescriptor`s; it just walks relationships
    /// via `FieldDef::relationship`). Only a single relationship hop is
    /// supported: a path may name at most one relationship segment before
    /// its final field.
    fn resolve(&mut self, path: &[String], root: &EntityDef) -> Result<(Option<usize>, ColumnPosition, TypeCode), CompileError> {
        match path.len() {
            0 => Err(CompileError::UnknownProperty(String::new())),
            1 => {
                let field = root.field(&path[0]).ok_or_else(|| CompileError::UnknownProperty(path[0].clone()))?;
                let position = field.position.ok_or_else(|| CompileError::FieldNotStored(path[0].clone()))?;
                Ok((None, position, field.type_code))
            }
            2 => {
                let prefix = vec![path[0].clone()];
                if let Some(&idx) = self.by_prefix.get(&prefix) {
                    let join = &self.joins[idx];
                    let target = self.entities.get(&join.target_entity).ok_or_else(|| CompileError::UnknownEntity(join.target_entity.clone()))?;
                    let field = target.field(&path[1]).ok_or_else(|| CompileError::UnknownProperty(path[1].clone()))?;
                    let position = field.position.ok_or_else(|| CompileError::FieldNotStored(path[1].clone()))?;
                    return Ok((Some(idx), position, field.type_code));
                }
                let holder = root.field(&path[0]).ok_or_else(|| CompileError::UnknownProperty(path[0].clone()))?;
                let rel = holder.relationship.as_ref().ok_or_else(|| CompileError::NotARelationship(path[0].clone()))?;
                let target = self.entities.get(&rel.target_entity).ok_or_else(|| CompileError::UnknownEntity(rel.target_entity.clone()))?;
                let fk_field = find_by_column_name(root, &rel.fk_column).ok_or_else(|| CompileError::UnknownProperty(rel.fk_column.clone()))?;
                let source_column = fk_field.position.ok_or_else(|| CompileError::FieldNotStored(rel.fk_column.clone()))?;
                let idx = self.joins.len();
                self.joins.push(CompiledJoin {
                    source_column,
                    source_type_code: fk_field.type_code,
                    target_entity: rel.target_entity.clone(),
                    target_column: None,
                    kind: JoinKind::Inner,
                });
                self.by_prefix.insert(prefix, idx);
                let field = target.field(&path[1]).ok_or_else(|| CompileError::UnknownProperty(path[1].clone()))?;
                let position = field.position.ok_or_else(|| CompileError::FieldNotStored(path[1].clone()))?;
                Ok((Some(idx), position, field.type_code))
            }
            _ => Err(CompileError::NotARelationship(path.join("."))),
        }
    }
}

fn coerce_value(value: &StorageValue, type_code: TypeCode) -> Result<StorageValue, CompileError> {
    if matches!(value, StorageValue::Null) {
        return Ok(StorageValue::Null);
    }
    if value.type_code() == Some(type_code) {
        return Ok(value.clone());
    }
    let mismatch = || CompileError::LiteralTypeMismatch { expected: type_code, found: value.type_code().expect("non-null checked above") };
    match (value, type_code) {
        (StorageValue::I64(v), TypeCode::I32) => i32::try_from(*v).map(StorageValue::I32).map_err(|_| mismatch()),
        (StorageValue::I64(v), TypeCode::I16) => i16::try_from(*v).map(StorageValue::I16).map_err(|_| mismatch()),
        (StorageValue::I64(v), TypeCode::I8) => i8::try_from(*v).map(StorageValue::I8).map_err(|_| mismatch()),
        (StorageValue::I64(v), TypeCode::F64) => Ok(StorageValue::F64(*v as f64)),
        (StorageValue::I64(v), TypeCode::F32) => Ok(StorageValue::F32(*v as f32)),
        (StorageValue::I64(v), TypeCode::Instant) => Ok(StorageValue::Instant(*v)),
        (StorageValue::I64(v), TypeCode::LocalDateTime) => Ok(StorageValue::LocalDateTime(*v)),
        (StorageValue::I64(v), TypeCode::LocalDate) => i32::try_from(*v).map(StorageValue::LocalDate).map_err(|_| mismatch()),
        (StorageValue::I64(v), TypeCode::Date) => i32::try_from(*v).map(StorageValue::Date).map_err(|_| mismatch()),
        (StorageValue::F64(v), TypeCode::F32) => Ok(StorageValue::F32(*v as f32)),
        _ => Err(mismatch()),
    }
}

fn coerce_arg(arg: &ArgRef, type_code: TypeCode) -> Result<CompiledArgRef, CompileError> {
    match arg {
        ArgRef::Param(slot) => Ok(CompiledArgRef::Param(*slot)),
        ArgRef::Literal(value) => Ok(CompiledArgRef::Literal(coerce_value(value, type_code)?)),
    }
}

fn compile_args(args: &ConditionArgs, type_code: TypeCode) -> Result<CompiledArgs, CompileError> {
    Ok(match args {
        ConditionArgs::None => CompiledArgs::None,
        ConditionArgs::One(a) => CompiledArgs::One(coerce_arg(a, type_code)?),
        ConditionArgs::Two(a, b) => CompiledArgs::Two(coerce_arg(a, type_code)?, coerce_arg(b, type_code)?),
        ConditionArgs::Many(items) => CompiledArgs::Many(items.iter().map(|a| coerce_arg(a, type_code)).collect::<Result<_, _>>()?),
    })
}

/// Matches a group's root-table EQ conditions (plus an optional trailing
/// range condition) against the entity's declared composite indexes,
/// picking the longest-prefix match and, on ties, the index with fewer
/// components (spec.md §9 open question, resolved in `DESIGN.md`).
fn match_composite(conditions: &[CompiledCondition], entity: &EntityDef) -> Option<CompositeShape> {
    let mut best: Option<CompositeShape> = None;
    for index in entity.indexes.iter().filter(|i| i.is_composite()) {
        if !matches!(index.kind, IndexKind::Hash | IndexKind::Range) {
            continue;
        }
        let Some(columns) = index.fields.iter().map(|f| entity.column_position(f)).collect::<Option<Vec<_>>>() else { continue };

        let mut consumed = Vec::new();
        for column in &columns {
            let eq_hit = conditions
                .iter()
                .enumerate()
                .find(|(i, c)| c.join.is_none() && c.column == *column && c.operator == Operator::Eq && !consumed.contains(i));
            if let Some((ci, _)) = eq_hit {
                consumed.push(ci);
                continue;
            }
            break;
        }
        let mut trailing_range = false;
        if index.kind == IndexKind::Range && consumed.len() < columns.len() {
            let next_column = columns[consumed.len()];
            // Only operators expressible as an inclusive [lo, hi] tuple bound
            // are consumed here: `CompositeRangeIndex::between` walks an
            // inclusive BTreeMap range with no exclusive-bound counterpart,
            // unlike the single-column `RangeIndex`'s `gt`/`lt`. A trailing
            // `Gt`/`Lt` condition is left for the single-column index or the
            // condition-program fallback, both of which support it exactly.
            let range_hit = conditions.iter().enumerate().find(|(i, c)| {
                c.join.is_none() && c.column == next_column && matches!(c.operator, Operator::Ge | Operator::Le | Operator::Between) && !consumed.contains(i)
            });
            if let Some((ci, _)) = range_hit {
                consumed.push(ci);
                trailing_range = true;
            }
        }
        if consumed.is_empty() {
            continue;
        }
        let candidate = CompositeShape { index_name: index.name.clone(), columns, consumed, trailing_range };
        best = Some(match best {
            None => candidate,
            Some(current) if candidate.consumed.len() > current.consumed.len() => candidate,
            Some(current) if candidate.consumed.len() == current.consumed.len() && candidate.columns.len() < current.columns.len() => candidate,
            Some(current) => current,
        });
    }
    best
}

fn split_groups(conditions: &[Condition]) -> Vec<&[Condition]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for (i, cond) in conditions.iter().enumerate() {
        if cond.next == Combinator::Or {
            groups.push(&conditions[start..=i]);
            start = i + 1;
        }
    }
    if start < conditions.len() {
        groups.push(&conditions[start..]);
    }
    groups
}

/// Lowers a `LogicalQuery` into a `CompiledQuery` (spec.md §4.7).
pub fn compile(query: &LogicalQuery, entity: &EntityDef, entities: &HashMap<String, EntityDef>) -> Result<CompiledQuery, CompileError> {
    let op = query.op.expect("a planned LogicalQuery always carries an op");
    let return_kind = query.return_kind.expect("a planned LogicalQuery always carries a return kind");

    let mut builder = JoinBuilder::new(entities);
    for join in &query.joins {
        builder.register_explicit(entity, join)?;
    }

    let mut groups = Vec::new();
    for raw_group in split_groups(&query.conditions) {
        let mut conditions = Vec::with_capacity(raw_group.len());
        for cond in raw_group {
            let (join, column, type_code) = builder.resolve(&cond.path, entity)?;
            conditions.push(CompiledCondition {
                join,
                column,
                type_code,
                operator: cond.operator,
                args: compile_args(&cond.args, type_code)?,
                case_ignore: cond.case_ignore,
            });
        }
        let composite = match_composite(&conditions, entity);
        groups.push(ConditionGroup { conditions, composite });
    }

    let mut order_by = Vec::with_capacity(query.order_by.len());
    for item in &query.order_by {
        let (join, column, type_code) = builder.resolve(&item.path, entity)?;
        order_by.push(CompiledOrderItem { join, column, direction: item.direction, primitive_non_null: type_code.is_numeric() });
    }

    let projection = match &query.projection {
        Some(p) => {
            let mut items = Vec::with_capacity(p.items.len());
            for item in &p.items {
                let (join, column, _) = builder.resolve(&item.path, entity)?;
                items.push(CompiledProjectionItem { alias: item.alias.clone(), join, column });
            }
            Some(CompiledProjection { target_type: p.target_type.clone(), items })
        }
        None => None,
    };

    let mut update_assignments = Vec::with_capacity(query.update_assignments.len());
    for assignment in &query.update_assignments {
        let (join, column, type_code) = builder.resolve(&assignment.path, entity)?;
        if join.is_some() {
            return Err(CompileError::NotARelationship(assignment.path.join(".")));
        }
        update_assignments.push(CompiledUpdateAssignment { column, value: coerce_arg(&assignment.value, type_code)? });
    }

    log::debug!("compiled {op:?} over '{}': {} group(s), {} join(s)", entity.name, groups.len(), builder.joins.len());

    Ok(CompiledQuery {
        op,
        return_kind,
        groups,
        joins: builder.joins,
        order_by,
        limit: query.limit,
        distinct: query.distinct,
        projection,
        update_assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use memris_expr::ArgRef;
    use memris_primitives::{ArgSlot, OpCode, ReturnKind};
    use memris_schema::IndexDef;
    use pretty_assertions::assert_eq;

    fn user() -> EntityDef {
        EntityDef {
            name: "User".into(),
            id_field: "id".into(),
            fields: vec![
                FieldDef { property_name: "id".into(), column_name: "id".into(), position: Some(ColumnPosition(0)), type_code: TypeCode::I64, relationship: None },
                FieldDef { property_name: "age".into(), column_name: "age".into(), position: Some(ColumnPosition(1)), type_code: TypeCode::I32, relationship: None },
                FieldDef { property_name: "status".into(), column_name: "status".into(), position: Some(ColumnPosition(2)), type_code: TypeCode::String, relationship: None },
                FieldDef { property_name: "total".into(), column_name: "total".into(), position: Some(ColumnPosition(3)), type_code: TypeCode::I32, relationship: None },
            ],
            indexes: vec![IndexDef { name: "by_status_total".into(), fields: vec!["status".into(), "total".into()], kind: IndexKind::Range }],
        }
    }

    #[test]
    fn resolves_a_simple_condition_and_coerces_param() {
        let entities = HashMap::new();
        let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
        q.conditions.push(Condition::new(vec!["age".into()], Operator::Gt, ConditionArgs::One(ArgRef::Param(ArgSlot(0)))));
        let compiled = compile(&q, &user(), &entities).unwrap();
        assert_eq!(compiled.groups.len(), 1);
        assert_eq!(compiled.groups[0].conditions[0].column, ColumnPosition(1));
        assert_eq!(compiled.groups[0].conditions[0].type_code, TypeCode::I32);
    }

    #[test]
    fn composite_index_consumes_both_conditions() {
        let entities = HashMap::new();
        let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
        let mut c1 = Condition::new(vec!["status".into()], Operator::Eq, ConditionArgs::One(ArgRef::Literal(StorageValue::String("P".into()))));
        c1.next = Combinator::And;
        let c2 = Condition::new(vec!["total".into()], Operator::Ge, ConditionArgs::One(ArgRef::Literal(StorageValue::I32(10))));
        q.conditions = vec![c1, c2];
        let compiled = compile(&q, &user(), &entities).unwrap();
        let shape = compiled.groups[0].composite.as_ref().unwrap();
        assert_eq!(shape.index_name, "by_status_total");
        assert_eq!(shape.consumed, vec![0, 1]);
        assert!(shape.trailing_range);
    }

    #[test]
    fn wrong_literal_type_is_a_compile_error() {
        let entities = HashMap::new();
        let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
        q.conditions.push(Condition::new(vec!["age".into()], Operator::Eq, ConditionArgs::One(ArgRef::Literal(StorageValue::String("nope".into())))));
        let err = compile(&q, &user(), &entities).unwrap_err();
        assert!(matches!(err, CompileError::LiteralTypeMismatch { .. }));
    }

    #[test]
    fn or_groups_split_on_combinator() {
        let entities = HashMap::new();
        let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
        let mut c1 = Condition::new(vec!["age".into()], Operator::Gt, ConditionArgs::One(ArgRef::Param(ArgSlot(0))));
        c1.next = Combinator::Or;
        let c2 = Condition::new(vec!["status".into()], Operator::Eq, ConditionArgs::One(ArgRef::Param(ArgSlot(1))));
        q.conditions = vec![c1, c2];
        let compiled = compile(&q, &user(), &entities).unwrap();
        assert_eq!(compiled.groups.len(), 2);
    }
}
