use hashbrown::HashMap;
use memris_execution::{ExecutionOutcome, IndexCatalog, JoinRuntime};
use memris_primitives::{ColumnPosition, IndexId, TypeCode};
use memris_sats::StorageValue;
use memris_schema::{EntityDef, FieldDef, IndexDef, IndexKind};
use memris_sql_parser::ReturnArity;
use memris_table::{ColumnDef, CompositeRangeIndex, IndexHandle, Table};

use super::*;

const BY_STATUS_TOTAL: IndexId = IndexId(0);

fn user_entity() -> EntityDef {
    EntityDef {
        name: "User".into(),
        id_field: "id".into(),
        fields: vec![
            FieldDef { property_name: "id".into(), column_name: "id".into(), position: Some(ColumnPosition(0)), type_code: TypeCode::I64, relationship: None },
            FieldDef { property_name: "age".into(), column_name: "age".into(), position: Some(ColumnPosition(1)), type_code: TypeCode::I32, relationship: None },
            FieldDef { property_name: "name".into(), column_name: "name".into(), position: Some(ColumnPosition(2)), type_code: TypeCode::String, relationship: None },
            FieldDef { property_name: "active".into(), column_name: "active".into(), position: Some(ColumnPosition(3)), type_code: TypeCode::Bool, relationship: None },
            FieldDef { property_name: "status".into(), column_name: "status".into(), position: Some(ColumnPosition(4)), type_code: TypeCode::String, relationship: None },
            FieldDef { property_name: "total".into(), column_name: "total".into(), position: Some(ColumnPosition(5)), type_code: TypeCode::I32, relationship: None },
        ],
        indexes: vec![IndexDef { name: "by_status_total".into(), fields: vec!["status".into(), "total".into()], kind: IndexKind::Range }],
    }
}

fn seeded_table() -> (Table, IndexCatalog, HashMap<String, EntityDef>) {
    let table = Table::new(
        "user",
        vec![
            ColumnDef { name: "id".into(), position: ColumnPosition(0), type_code: TypeCode::I64 },
            ColumnDef { name: "age".into(), position: ColumnPosition(1), type_code: TypeCode::I32 },
            ColumnDef { name: "name".into(), position: ColumnPosition(2), type_code: TypeCode::String },
            ColumnDef { name: "active".into(), position: ColumnPosition(3), type_code: TypeCode::Bool },
            ColumnDef { name: "status".into(), position: ColumnPosition(4), type_code: TypeCode::String },
            ColumnDef { name: "total".into(), position: ColumnPosition(5), type_code: TypeCode::I32 },
        ],
        ColumnPosition(0),
        4096,
    );
    table.declare_index(BY_STATUS_TOTAL, IndexHandle::CompositeRange {
        index: CompositeRangeIndex::default(),
        columns: vec![ColumnPosition(4), ColumnPosition(5)],
    });

    let mut catalog = IndexCatalog::new();
    catalog.register_composite("by_status_total", BY_STATUS_TOTAL);
    (table, catalog, HashMap::new())
}

fn insert(table: &Table, id: i64, age: i32, name: &str, active: bool, status: &str, total: i32) {
    table.insert(&[
        StorageValue::I64(id),
        StorageValue::I32(age),
        StorageValue::String(name.into()),
        StorageValue::Bool(active),
        StorageValue::String(status.into()),
        StorageValue::I32(total),
    ]);
}

fn no_joins() -> JoinRuntime<'static> {
    JoinRuntime::new(&[], Vec::new())
}

fn rows(outcome: ExecutionOutcome) -> memris_table::Selection {
    match outcome {
        ExecutionOutcome::Rows(sel) => sel,
        other => panic!("expected rows, got {other:?}"),
    }
}

/// spec.md §8 scenario 1: derived range query.
#[test]
fn derived_range_end_to_end() {
    let (table, catalog, entities) = seeded_table();
    insert(&table, 1, 20, "", false, "", 0);
    insert(&table, 2, 30, "", false, "", 0);
    insert(&table, 3, 40, "", false, "", 0);

    let source = MethodSource::Derived { method_name: "findByAgeBetween", param_shape: ParamShape::Unit, return_hint: ReturnHint::List };
    let joins = no_joins();
    let outcome = run(&source, &user_entity(), &entities, &table, &joins, &catalog, &[StorageValue::I32(25), StorageValue::I32(45)]).unwrap();
    let sel = rows(outcome);
    let ids: Vec<i64> = sel
        .iter()
        .map(|r| match table.read_row(r.id).unwrap()[0] {
            StorageValue::I64(v) => v,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

/// spec.md §8 scenario 2: derived string-match with StartingWith.
#[test]
fn derived_starts_with_end_to_end() {
    let (table, catalog, entities) = seeded_table();
    insert(&table, 1, 0, "Johnson", false, "", 0);
    insert(&table, 2, 0, "Johnston", false, "", 0);
    insert(&table, 3, 0, "Smith", false, "", 0);

    let source = MethodSource::Derived { method_name: "findByNameStartingWith", param_shape: ParamShape::Unit, return_hint: ReturnHint::List };
    let joins = no_joins();
    let outcome = run(&source, &user_entity(), &entities, &table, &joins, &catalog, &[StorageValue::String("John".into())]).unwrap();
    let sel = rows(outcome);
    assert_eq!(sel.len(), 2);
}

/// spec.md §8 scenario 3: embedded OR across an AND group.
#[test]
fn embedded_or_end_to_end() {
    let (table, catalog, entities) = seeded_table();
    insert(&table, 1, 0, "Alice", false, "", 5);
    insert(&table, 2, 0, "Bob", true, "", 20);
    insert(&table, 3, 0, "Carol", true, "", 10);

    let param_names = vec!["a".to_string(), "n".to_string()];
    let source = MethodSource::Embedded {
        src: "SELECT u FROM User u WHERE u.age > :a AND u.active = true OR u.name = :n",
        param_names: &param_names,
        modifying: false,
        native_query: false,
        return_arity: ReturnArity::NonNumeric,
    };
    let joins = no_joins();
    let outcome = run(&source, &user_entity(), &entities, &table, &joins, &catalog, &[StorageValue::I32(18), StorageValue::String("Alice".into())]).unwrap();
    let sel = rows(outcome);
    let mut ids: Vec<i64> = sel
        .iter()
        .map(|r| match table.read_row(r.id).unwrap()[0] {
            StorageValue::I64(v) => v,
            _ => unreachable!(),
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

/// spec.md §8 scenario 4: embedded UPDATE with a modifying marker.
#[test]
fn embedded_update_end_to_end() {
    let (table, catalog, entities) = seeded_table();
    insert(&table, 1, 0, "Anna", false, "", 0);
    insert(&table, 2, 0, "Bob", false, "", 0);

    let param_names = vec!["n".to_string(), "id".to_string()];
    let source = MethodSource::Embedded {
        src: "UPDATE User u SET u.name = :n WHERE u.id = :id",
        param_names: &param_names,
        modifying: true,
        native_query: false,
        return_arity: ReturnArity::Numeric,
    };
    let joins = no_joins();
    let outcome = run(&source, &user_entity(), &entities, &table, &joins, &catalog, &[StorageValue::String("Zed".into()), StorageValue::I64(2)]).unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Affected(1)));

    let id_source = MethodSource::Derived { method_name: "findById", param_shape: ParamShape::Id, return_hint: ReturnHint::Optional };
    let outcome = run(&id_source, &user_entity(), &entities, &table, &joins, &catalog, &[StorageValue::I64(2)]).unwrap();
    let sel = rows(outcome);
    let row = table.read_row(sel.iter().next().unwrap().id).unwrap();
    assert_eq!(row[2], StorageValue::String("Zed".into()));
}

/// spec.md §8 scenario 5: composite index consumes both conditions.
#[test]
fn derived_composite_index_end_to_end() {
    let (table, catalog, entities) = seeded_table();
    insert(&table, 1, 0, "", false, "P", 5);
    insert(&table, 2, 0, "", false, "P", 15);
    insert(&table, 3, 0, "", false, "S", 8);

    let source = MethodSource::Derived {
        method_name: "findByStatusAndTotalGreaterThanEqual",
        param_shape: ParamShape::Unit,
        return_hint: ReturnHint::List,
    };
    let joins = no_joins();
    let outcome = run(&source, &user_entity(), &entities, &table, &joins, &catalog, &[StorageValue::String("P".into()), StorageValue::I32(10)]).unwrap();
    let sel = rows(outcome);
    assert_eq!(sel.len(), 1);
    let row = table.read_row(sel.iter().next().unwrap().id).unwrap();
    assert_eq!(row[5], StorageValue::I32(15));
}

#[test]
fn unrecognized_derived_prefix_surfaces_invalid_query_error() {
    let (table, catalog, entities) = seeded_table();
    let source = MethodSource::Derived { method_name: "whatIsThis", param_shape: ParamShape::Unit, return_hint: ReturnHint::List };
    let joins = no_joins();
    let err = run(&source, &user_entity(), &entities, &table, &joins, &catalog, &[]).unwrap_err();
    assert_eq!(err.kind, memris_primitives::ErrorKind::InvalidQuery);
}
