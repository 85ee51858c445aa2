use hashbrown::HashMap;
use memris_expr::{ArgRef, Combinator, Condition, ConditionArgs, LogicalQuery};
use memris_primitives::{ArgSlot, ColumnPosition, IndexId, OpCode, Operator, ReturnKind, TypeCode};
use memris_sats::StorageValue;
use memris_schema::{EntityDef, FieldDef, IndexDef, IndexKind};
use memris_table::{ColumnDef, CompositeRangeIndex, IndexHandle, RangeIndex, Table};
use pretty_assertions::assert_eq;

use super::*;

fn user_entity() -> EntityDef {
    EntityDef {
        name: "User".into(),
        id_field: "id".into(),
        fields: vec![
            FieldDef { property_name: "id".into(), column_name: "id".into(), position: Some(ColumnPosition(0)), type_code: TypeCode::I64, relationship: None },
            FieldDef { property_name: "age".into(), column_name: "age".into(), position: Some(ColumnPosition(1)), type_code: TypeCode::I32, relationship: None },
            FieldDef { property_name: "status".into(), column_name: "status".into(), position: Some(ColumnPosition(2)), type_code: TypeCode::String, relationship: None },
            FieldDef { property_name: "total".into(), column_name: "total".into(), position: Some(ColumnPosition(3)), type_code: TypeCode::I32, relationship: None },
        ],
        indexes: vec![
            IndexDef { name: "by_age".into(), fields: vec!["age".into()], kind: IndexKind::Range },
            IndexDef { name: "by_status_total".into(), fields: vec!["status".into(), "total".into()], kind: IndexKind::Range },
        ],
    }
}

const AGE_INDEX: IndexId = IndexId(0);
const STATUS_TOTAL_INDEX: IndexId = IndexId(1);

fn seeded_table() -> (Table, IndexCatalog) {
    let table = Table::new(
        "user",
        vec![
            ColumnDef { name: "id".into(), position: ColumnPosition(0), type_code: TypeCode::I64 },
            ColumnDef { name: "age".into(), position: ColumnPosition(1), type_code: TypeCode::I32 },
            ColumnDef { name: "status".into(), position: ColumnPosition(2), type_code: TypeCode::String },
            ColumnDef { name: "total".into(), position: ColumnPosition(3), type_code: TypeCode::I32 },
        ],
        ColumnPosition(0),
        4096,
    );
    table.declare_index(AGE_INDEX, IndexHandle::Range { index: RangeIndex::default(), column: ColumnPosition(1) });
    table.declare_index(STATUS_TOTAL_INDEX, IndexHandle::CompositeRange {
        index: CompositeRangeIndex::default(),
        columns: vec![ColumnPosition(2), ColumnPosition(3)],
    });

    let rows = [
        (1i64, 25i32, "pending", 5i32),
        (2, 31, "pending", 40),
        (3, 42, "paid", 12),
        (4, 50, "paid", 90),
    ];
    for (id, age, status, total) in rows {
        table.insert(&[StorageValue::I64(id), StorageValue::I32(age), StorageValue::String(status.into()), StorageValue::I32(total)]);
    }

    let mut catalog = IndexCatalog::new();
    catalog.register_single(ColumnPosition(1), AGE_INDEX);
    catalog.register_composite("by_status_total", STATUS_TOTAL_INDEX);
    (table, catalog)
}

fn compile_query(q: &LogicalQuery) -> memris_physical_plan::CompiledQuery {
    let entities: HashMap<String, EntityDef> = HashMap::new();
    memris_physical_plan::compile(q, &user_entity(), &entities).unwrap()
}

fn no_joins() -> JoinRuntime<'static> {
    JoinRuntime::new(&[], Vec::new())
}

#[test]
fn range_index_probe_finds_matching_rows() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
    q.conditions.push(Condition::new(vec!["age".into()], Operator::Gt, ConditionArgs::One(ArgRef::Param(ArgSlot(0)))));
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[StorageValue::I32(30)]).unwrap();
    let ExecutionOutcome::Rows(sel) = outcome else { panic!("expected rows") };
    assert_eq!(sel.len(), 3);
}

#[test]
fn composite_index_serves_eq_plus_trailing_range() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
    let mut c1 = Condition::new(vec!["status".into()], Operator::Eq, ConditionArgs::One(ArgRef::Literal(StorageValue::String("paid".into()))));
    c1.next = Combinator::And;
    let c2 = Condition::new(vec!["total".into()], Operator::Ge, ConditionArgs::One(ArgRef::Literal(StorageValue::I32(50))));
    q.conditions = vec![c1, c2];
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    let ExecutionOutcome::Rows(sel) = outcome else { panic!("expected rows") };
    assert_eq!(sel.len(), 1);
    let row = table.read_row(sel.iter().next().unwrap().id).unwrap();
    assert_eq!(row[0], StorageValue::I64(4));
}

#[test]
fn unindexed_string_condition_falls_back_to_column_scan() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
    q.conditions.push(Condition::new(vec!["status".into()], Operator::Contains, ConditionArgs::One(ArgRef::Literal(StorageValue::String("end".into())))));
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    let ExecutionOutcome::Rows(sel) = outcome else { panic!("expected rows") };
    assert_eq!(sel.len(), 2);
}

#[test]
fn order_by_and_limit_are_applied() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::List);
    q.order_by.push(memris_expr::OrderItem { path: vec!["age".into()], direction: memris_expr::Direction::Desc });
    q.limit = Some(2);
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    let ExecutionOutcome::Rows(sel) = outcome else { panic!("expected rows") };
    let ids: Vec<i64> = sel
        .iter()
        .map(|r| match table.read_row(r.id).unwrap()[0] {
            StorageValue::I64(v) => v,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(ids, vec![4, 3]);
}

#[test]
fn count_all_returns_total_row_count_without_conditions() {
    let (table, catalog) = seeded_table();
    let plan = compile_query(&LogicalQuery::new(OpCode::CountAll, ReturnKind::Count));
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Count(4)));
}

#[test]
fn exists_reports_whether_any_row_matches() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Exists, ReturnKind::Boolean);
    q.conditions.push(Condition::new(vec!["age".into()], Operator::Gt, ConditionArgs::One(ArgRef::Literal(StorageValue::I32(100)))));
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Exists(false)));
}

#[test]
fn optional_return_kind_rejects_more_than_one_row() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Find, ReturnKind::Optional);
    q.conditions.push(Condition::new(vec!["status".into()], Operator::Eq, ConditionArgs::One(ArgRef::Literal(StorageValue::String("pending".into())))));
    let plan = compile_query(&q);
    let joins = no_joins();
    let err = execute(&plan, &table, &joins, &catalog, &[]).unwrap_err();
    assert_eq!(err.kind, memris_primitives::ErrorKind::Cardinality);
}

#[test]
fn update_applies_assignment_to_matching_rows_only() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Update, ReturnKind::Modifying);
    q.conditions.push(Condition::new(vec!["status".into()], Operator::Eq, ConditionArgs::One(ArgRef::Literal(StorageValue::String("pending".into())))));
    q.update_assignments.push(memris_expr::UpdateAssignment { path: vec!["total".into()], value: ArgRef::Literal(StorageValue::I32(0)) });
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Affected(2)));
    assert_eq!(table.read_row(table.lookup_by_id(&StorageValue::I64(3)).unwrap().id).unwrap()[3], StorageValue::I32(12));
}

#[test]
fn delete_removes_matching_rows_and_retracts_indexes() {
    let (table, catalog) = seeded_table();
    let mut q = LogicalQuery::new(OpCode::Delete, ReturnKind::Modifying);
    q.conditions.push(Condition::new(vec!["age".into()], Operator::Lt, ConditionArgs::One(ArgRef::Literal(StorageValue::I32(30)))));
    let plan = compile_query(&q);
    let joins = no_joins();
    let outcome = execute(&plan, &table, &joins, &catalog, &[]).unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Affected(1)));
    assert!(table.lookup_by_id(&StorageValue::I64(1)).is_none());
    let IndexHandle::Range { index, .. } = &*table.index(AGE_INDEX).unwrap() else { unreachable!() };
    assert_eq!(index.lt(memris_table::IndexKey::Int(30)).len(), 0);
}
