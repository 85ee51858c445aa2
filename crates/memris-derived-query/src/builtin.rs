use memris_primitives::{OpCode, ReturnKind};

use crate::error::DerivedQueryError;

/// The shape of a declared parameter, coarse enough to drive built-in
/// signature resolution (spec.md §4.5 "resolved by full signature key
/// (method name × declared parameter types)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// No parameters.
    Unit,
    /// The entity's id type.
    Id,
    /// An instance of the entity itself.
    Entity,
    /// A collection of ids.
    IdCollection,
    /// A collection of entity instances.
    EntityCollection,
}

/// A resolved built-in operation (spec.md §4.5 "save, saveAll, delete,
/// deleteAll, deleteById, findById, findAll, count, existsById").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub op: OpCode,
    pub return_kind: ReturnKind,
    /// Whether the sole argument is the entity's id, so the caller should
    /// bind an id-equality condition (`findById`/`deleteById`/`existsById`).
    pub takes_id: bool,
}

struct Row {
    name: &'static str,
    shape: ParamShape,
    op: OpCode,
    return_kind: ReturnKind,
    takes_id: bool,
    /// Lower is more specific; used to break ties when a future wildcard
    /// shape (not yet needed by this table) overlaps a concrete one.
    specificity: u8,
}

fn table() -> Vec<Row> {
    vec![
        Row { name: "save", shape: ParamShape::Entity, op: OpCode::Update, return_kind: ReturnKind::Modifying, takes_id: false, specificity: 0 },
        Row { name: "saveAll", shape: ParamShape::EntityCollection, op: OpCode::Update, return_kind: ReturnKind::Modifying, takes_id: false, specificity: 0 },
        Row { name: "delete", shape: ParamShape::Entity, op: OpCode::Delete, return_kind: ReturnKind::Modifying, takes_id: false, specificity: 0 },
        Row { name: "deleteAll", shape: ParamShape::EntityCollection, op: OpCode::Delete, return_kind: ReturnKind::Modifying, takes_id: false, specificity: 0 },
        Row { name: "deleteById", shape: ParamShape::Id, op: OpCode::Delete, return_kind: ReturnKind::Modifying, takes_id: true, specificity: 0 },
        Row { name: "findById", shape: ParamShape::Id, op: OpCode::Find, return_kind: ReturnKind::Optional, takes_id: true, specificity: 0 },
        Row { name: "findAll", shape: ParamShape::Unit, op: OpCode::Find, return_kind: ReturnKind::List, takes_id: false, specificity: 0 },
        Row { name: "count", shape: ParamShape::Unit, op: OpCode::CountAll, return_kind: ReturnKind::Count, takes_id: false, specificity: 0 },
        Row { name: "existsById", shape: ParamShape::Id, op: OpCode::Exists, return_kind: ReturnKind::Boolean, takes_id: true, specificity: 0 },
    ]
}

/// Resolves a method name plus its declared parameter shape against the
/// built-in table. Returns `None` when the name isn't a built-in at all, so
/// the caller falls through to derived-method parsing.
///
/// Resolution order (spec.md §4.5): exact shape match beats any wildcard;
/// among overlapping wildcards the most specific wins; an ambiguous tie
/// among incomparable wildcards fails with a diagnostic.
pub fn resolve_builtin(method_name: &str, shape: ParamShape) -> Option<Result<Builtin, DerivedQueryError>> {
    let rows = table();
    let candidates: Vec<&Row> = rows.iter().filter(|r| r.name == method_name).collect();
    if candidates.is_empty() {
        return None;
    }
    let matching: Vec<&Row> = candidates.into_iter().filter(|r| r.shape == shape).collect();
    if matching.is_empty() {
        return Some(Err(DerivedQueryError::NoMatchingBuiltinOverload(method_name.to_string())));
    }
    let best = matching.iter().map(|r| r.specificity).min().unwrap();
    let winners: Vec<&&Row> = matching.iter().filter(|r| r.specificity == best).collect();
    if winners.len() > 1 {
        return Some(Err(DerivedQueryError::AmbiguousBuiltin(method_name.to_string())));
    }
    let row = winners[0];
    Some(Ok(Builtin { op: row.op, return_kind: row.return_kind, takes_id: row.takes_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_find_by_id() {
        let b = resolve_builtin("findById", ParamShape::Id).unwrap().unwrap();
        assert_eq!(b.op, OpCode::Find);
        assert_eq!(b.return_kind, ReturnKind::Optional);
    }

    #[test]
    fn non_builtin_name_falls_through() {
        assert!(resolve_builtin("findByAge", ParamShape::Id).is_none());
    }

    #[test]
    fn wrong_shape_for_a_builtin_name_is_ambiguous() {
        let r = resolve_builtin("findById", ParamShape::Entity).unwrap();
        assert!(r.is_err());
    }
}
