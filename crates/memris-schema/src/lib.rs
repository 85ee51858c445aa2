//! Entity metadata descriptors (spec.md §6 "Entity metadata descriptor"):
//! the boundary the host's annotation scanner / reflection layer is
//! expected to produce, and that everything else in the workspace consumes.

mod materialize;

pub use materialize::{Materializer, Saver};

use hashbrown::HashMap;
use memris_primitives::ColumnPosition;
use memris_primitives::TypeCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// A join-table descriptor for many-to-many relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTableDescriptor {
    pub table_name: String,
    pub source_column: String,
    pub target_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    pub target_entity: String,
    pub fk_column: String,
    pub cardinality: Cardinality,
    pub join_table: Option<JoinTableDescriptor>,
}

/// One field of an entity (spec.md §6). `position` is `None` for non-stored
/// fields such as relationship holders (the source language's `-1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub property_name: String,
    pub column_name: String,
    pub position: Option<ColumnPosition>,
    pub type_code: TypeCode,
    pub relationship: Option<RelationshipDescriptor>,
}

impl FieldDef {
    pub fn is_stored(&self) -> bool {
        self.position.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Hash,
    Range,
    Prefix,
    Suffix,
}

/// A declared index (spec.md §6). A single-field list selects the `Hash`/
/// `Range`/`Prefix`/`Suffix` family named by `kind`; a multi-field list
/// selects the composite-hash/composite-range counterpart, which one
/// decided by `kind` (`Hash`→composite-hash, `Range`→composite-range —
/// prefix/suffix indexes are never composite per spec.md §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub fields: Vec<String>,
    pub kind: IndexKind,
}

impl IndexDef {
    pub fn is_composite(&self) -> bool {
        self.fields.len() > 1
    }
}

/// An entity's full metadata (spec.md §6). Produced by a host collaborator
/// this workspace never implements (annotation scanning, reflection); the
/// query front-ends and compiler only ever read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    pub name: String,
    pub id_field: String,
    pub fields: Vec<FieldDef>,
    pub indexes: Vec<IndexDef>,
}

impl EntityDef {
    pub fn field(&self, property_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.property_name == property_name)
    }

    pub fn id_field_def(&self) -> &FieldDef {
        self.field(&self.id_field).expect("entity metadata always names a valid id field")
    }

    pub fn column_position(&self, property_name: &str) -> Option<ColumnPosition> {
        self.field(property_name).and_then(|f| f.position)
    }

    /// Resolves a dotted property path one relationship hop at a time,
    /// given a lookup from entity name to its `EntityDef` (spec.md §4.5
    /// "entering nested entities through relationship descriptors").
    pub fn resolve_path<'a>(&'a self, path: &[String], entities: &'a HashMap<String, EntityDef>) -> Option<(&'a EntityDef, &'a FieldDef)> {
        let mut current = self;
        for (i, segment) in path.iter().enumerate() {
            let field = current.field(segment)?;
            if i == path.len() - 1 {
                return Some((current, field));
            }
            let rel = field.relationship.as_ref()?;
            current = entities.get(&rel.target_entity)?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_entity() -> EntityDef {
        EntityDef {
            name: "User".into(),
            id_field: "id".into(),
            fields: vec![
                FieldDef { property_name: "id".into(), column_name: "id".into(), position: Some(ColumnPosition(0)), type_code: TypeCode::I64, relationship: None },
                FieldDef { property_name: "age".into(), column_name: "age".into(), position: Some(ColumnPosition(1)), type_code: TypeCode::I32, relationship: None },
            ],
            indexes: vec![],
        }
    }

    #[test]
    fn field_lookup_and_id_field() {
        let e = user_entity();
        assert_eq!(e.field("age").unwrap().type_code, TypeCode::I32);
        assert_eq!(e.id_field_def().property_name, "id");
    }

    #[test]
    fn resolve_single_segment_path() {
        let e = user_entity();
        let entities = HashMap::new();
        let (entity, field) = e.resolve_path(&["age".to_string()], &entities).unwrap();
        assert_eq!(entity.name, "User");
        assert_eq!(field.property_name, "age");
    }

    #[test]
    fn composite_index_detection() {
        let idx = IndexDef { name: "by_status_total".into(), fields: vec!["status".into(), "total".into()], kind: IndexKind::Range };
        assert!(idx.is_composite());
    }
}
