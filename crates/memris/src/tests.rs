use std::thread;

use hashbrown::HashMap;
use memris_primitives::{ColumnPosition, Result, TypeCode};
use memris_sats::StorageValue;
use memris_schema::{EntityDef, FieldDef, Materializer, Saver};
use memris_table::{ColumnDef, RowRef, Table};

use super::*;

struct TestUser {
    id: i64,
    name: String,
}

struct UserIo;

impl Materializer for UserIo {
    type Output = TestUser;

    fn materialize(&self, table: &Table, row: RowRef) -> Result<TestUser> {
        let cells = table.read_row(row.id).ok_or_else(|| Error::cardinality("row retracted before materialization"))?;
        let (StorageValue::I64(id), StorageValue::String(name)) = (&cells[0], &cells[1]) else {
            return Err(Error::invalid_query("unexpected cell type"));
        };
        Ok(TestUser { id: *id, name: name.clone() })
    }
}

impl Saver for UserIo {
    type Input = TestUser;

    fn save(&self, table: &Table, object: &TestUser) -> Result<StorageValue> {
        let id = StorageValue::I64(object.id);
        if let Some(row) = table.lookup_by_id(&id) {
            table.update_in_place(row.id, &[(ColumnPosition(1), StorageValue::String(object.name.clone()))]);
        } else {
            table.insert(&[id.clone(), StorageValue::String(object.name.clone())]);
        }
        Ok(id)
    }

    fn extract_id(&self, object: &TestUser) -> Option<StorageValue> {
        Some(StorageValue::I64(object.id))
    }

    fn set_id(&self, object: &mut TestUser, id: StorageValue) {
        if let StorageValue::I64(v) = id {
            object.id = v;
        }
    }

    fn resolve_relationship_id(&self, _field_name: &str, _related: &TestUser) -> Option<StorageValue> {
        None
    }
}

fn user_entity() -> EntityDef {
    EntityDef {
        name: "User".into(),
        id_field: "id".into(),
        fields: vec![
            FieldDef { property_name: "id".into(), column_name: "id".into(), position: Some(ColumnPosition(0)), type_code: TypeCode::I64, relationship: None },
            FieldDef { property_name: "name".into(), column_name: "name".into(), position: Some(ColumnPosition(1)), type_code: TypeCode::String, relationship: None },
        ],
        indexes: vec![],
    }
}

fn seeded_repo(arena: &Arena) -> Repository<'_, UserIo> {
    let table_id = arena.create_table(
        "user",
        vec![
            ColumnDef { name: "id".into(), position: ColumnPosition(0), type_code: TypeCode::I64 },
            ColumnDef { name: "name".into(), position: ColumnPosition(1), type_code: TypeCode::String },
        ],
        ColumnPosition(0),
    );
    Repository::new(arena, table_id, user_entity(), HashMap::new(), HashMap::new(), IndexCatalog::new(), UserIo)
}

#[test]
fn save_find_and_delete_round_trip() {
    let arena = Arena::new("default", ArenaOptions::default());
    let repo = seeded_repo(&arena);

    repo.save(&TestUser { id: 1, name: "Ada".into() }).unwrap();

    let source = MethodSource::Derived { method_name: "findById", param_shape: ParamShape::Id, return_hint: ReturnHint::Optional };
    let found = repo.find_optional("findById", &source, &[StorageValue::I64(1)]).unwrap();
    assert_eq!(found.unwrap().name, "Ada");

    let affected = repo.delete(&TestUser { id: 1, name: String::new() }).unwrap();
    assert_eq!(affected, 1);

    let found = repo.find_optional("findById", &source, &[StorageValue::I64(1)]).unwrap();
    assert!(found.is_none());
}

/// spec.md §8 scenario 4, driven through the repository facade rather than
/// `memris-query` directly.
#[test]
fn embedded_update_through_repository() {
    let arena = Arena::new("default", ArenaOptions::default());
    let repo = seeded_repo(&arena);
    repo.save(&TestUser { id: 2, name: "Anna".into() }).unwrap();

    let param_names = vec!["n".to_string(), "id".to_string()];
    let source = MethodSource::Embedded {
        src: "UPDATE User u SET u.name = :n WHERE u.id = :id",
        param_names: &param_names,
        modifying: true,
        native_query: false,
        return_arity: ReturnArity::Numeric,
    };
    let affected = repo.execute_modifying("update#1", &source, &[StorageValue::String("Zed".into()), StorageValue::I64(2)]).unwrap();
    assert_eq!(affected, 1);

    let find_source = MethodSource::Derived { method_name: "findById", param_shape: ParamShape::Id, return_hint: ReturnHint::Optional };
    let found = repo.find_optional("findById", &find_source, &[StorageValue::I64(2)]).unwrap();
    assert_eq!(found.unwrap().name, "Zed");
}

/// spec.md §8 scenario 6: a writer flips one row's name from "A" to "B"
/// while 8 readers loop `findById` through the repository; every reader
/// must observe exactly "A" or exactly "B", never a torn mix.
#[test]
fn concurrent_readers_never_observe_a_torn_value() {
    let arena = Arena::new("default", ArenaOptions::default());
    let repo = seeded_repo(&arena);
    repo.save(&TestUser { id: 7, name: "A".into() }).unwrap();

    let source = MethodSource::Derived { method_name: "findById", param_shape: ParamShape::Id, return_hint: ReturnHint::Optional };

    thread::scope(|scope| {
        for _ in 0..8 {
            let repo = &repo;
            let source = &source;
            scope.spawn(move || {
                for _ in 0..2000 {
                    let user = repo.find_optional("findById", source, &[StorageValue::I64(7)]).unwrap().unwrap();
                    assert!(user.name == "A" || user.name == "B", "observed torn value {:?}", user.name);
                }
            });
        }
        for _ in 0..2000 {
            repo.save(&TestUser { id: 7, name: "B".into() }).unwrap();
            repo.save(&TestUser { id: 7, name: "A".into() }).unwrap();
        }
    });
}
