//! Derived-method lexer and planner (spec.md §4.5): turns a repository
//! method signature into a `LogicalQuery`, either by built-in signature-key
//! resolution or by tokenizing the method name into prefix, modifiers,
//! property-path conditions, and a trailing `OrderBy` clause.

mod builtin;
mod error;
mod path;
mod planner;
mod suffix;
mod words;

pub use builtin::{Builtin, ParamShape};
pub use error::DerivedQueryError;

use hashbrown::HashMap;
use memris_expr::{ArgRef, Condition, ConditionArgs, Direction, LogicalQuery, OrderItem};
use memris_primitives::{ArgSlot, OpCode, Operator, ReturnKind};
use memris_schema::EntityDef;

use crate::builtin::resolve_builtin;
use crate::path::match_path;
use crate::planner::parse_conditions;
use crate::words::split_words;

/// What the caller's declared method return type implies for a derived
/// (non-built-in) `find`-family method. Real signature/return-type
/// reflection is an external collaborator's job (spec.md §5); callers of
/// this crate supply the hint they already have from that reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnHint {
    #[default]
    List,
    Optional,
}

/// Plans a repository method signature into a `LogicalQuery`. Tries
/// built-in resolution first; falls through to derived-method tokenizing
/// when the name isn't one of the nine built-ins.
pub fn plan_method(
    method_name: &str,
    param_shape: ParamShape,
    return_hint: ReturnHint,
    entity: &EntityDef,
    entities: &HashMap<String, EntityDef>,
) -> Result<LogicalQuery, DerivedQueryError> {
    if let Some(result) = resolve_builtin(method_name, param_shape) {
        let b = result?;
        return Ok(builtin_query(b, entity));
    }
    plan_derived(method_name, return_hint, entity, entities)
}

/// `findById`/`deleteById`/`existsById` all take the id as their sole
/// argument; model that as an id-equality condition so the compiler and
/// executor don't need a separate built-in code path. `findAll`/`count`
/// take no arguments and get no conditions; `save`/`saveAll`/`delete`/
/// `deleteAll` (entity-shaped) bypass the condition pipeline entirely and
/// are applied directly by the repository dispatcher.
fn builtin_query(b: Builtin, entity: &EntityDef) -> LogicalQuery {
    let mut query = LogicalQuery::new(b.op, b.return_kind);
    if b.takes_id {
        query.conditions.push(Condition::new(
            vec![entity.id_field.clone()],
            Operator::Eq,
            ConditionArgs::One(ArgRef::Param(ArgSlot(0))),
        ));
    }
    query
}

fn strip_numeric_modifier(word: &str, keyword: &str) -> Option<usize> {
    if word == keyword {
        return Some(1);
    }
    word.strip_prefix(keyword).and_then(|rest| rest.parse::<usize>().ok())
}

fn plan_derived(
    method_name: &str,
    return_hint: ReturnHint,
    entity: &EntityDef,
    entities: &HashMap<String, EntityDef>,
) -> Result<LogicalQuery, DerivedQueryError> {
    let words = split_words(method_name);
    if words.is_empty() {
        return Err(DerivedQueryError::UnrecognizedPrefix);
    }

    let op = resolve_prefix(&words[0]).ok_or(DerivedQueryError::UnrecognizedPrefix)?;

    let mut i = 1usize;
    let mut distinct = false;
    let mut limit = None;
    while i < words.len() && words[i] != "By" {
        let w = words[i].as_str();
        if w == "Distinct" {
            distinct = true;
            i += 1;
            continue;
        }
        if let Some(n) = strip_numeric_modifier(w, "First").or_else(|| strip_numeric_modifier(w, "Top")) {
            limit = Some(n);
            i += 1;
            continue;
        }
        return Err(DerivedQueryError::MissingBy);
    }
    if i >= words.len() {
        return Err(DerivedQueryError::MissingBy);
    }
    i += 1; // consume "By"

    let order_pos = (i..words.len().saturating_sub(1)).find(|&j| words[j] == "Order" && words[j + 1] == "By");
    let (condition_words, order_words) = match order_pos {
        Some(p) => (&words[i..p], &words[p + 2..]),
        None => (&words[i..], &words[words.len()..]),
    };

    let conditions = parse_conditions(condition_words, entity, entities)?;
    let order_by = parse_order_by(order_words, entity, entities)?;

    let return_kind = default_return_kind(op, return_hint);
    let mut query = LogicalQuery::new(op, return_kind);
    query.conditions = conditions;
    query.order_by = order_by;
    query.distinct = distinct;
    query.limit = limit;
    Ok(query)
}

fn resolve_prefix(word: &str) -> Option<OpCode> {
    match word {
        "find" | "query" | "get" | "read" | "stream" => Some(OpCode::Find),
        "count" => Some(OpCode::Count),
        "exists" => Some(OpCode::Exists),
        "delete" | "remove" => Some(OpCode::Delete),
        _ => None,
    }
}

fn default_return_kind(op: OpCode, hint: ReturnHint) -> ReturnKind {
    match op {
        OpCode::Count | OpCode::CountAll => ReturnKind::Count,
        OpCode::Exists => ReturnKind::Boolean,
        OpCode::Delete | OpCode::Update => ReturnKind::Modifying,
        OpCode::Find => match hint {
            ReturnHint::Optional => ReturnKind::Optional,
            ReturnHint::List => ReturnKind::List,
        },
    }
}

fn parse_order_by(words: &[String], entity: &EntityDef, entities: &HashMap<String, EntityDef>) -> Result<Vec<OrderItem>, DerivedQueryError> {
    let mut items = Vec::new();
    let mut i = 0usize;
    while i < words.len() {
        let (path, consumed) = match_path(words, i, entity, entities).ok_or_else(|| DerivedQueryError::unknown_property(words[i..].join("")))?;
        i += consumed;
        let direction = if i < words.len() && (words[i] == "Asc" || words[i] == "Desc") {
            let d = if words[i] == "Asc" { Direction::Asc } else { Direction::Desc };
            i += 1;
            d
        } else {
            Direction::Asc
        };
        items.push(OrderItem { path, direction });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memris_primitives::{ColumnPosition, TypeCode};
    use memris_schema::FieldDef;

    fn user() -> EntityDef {
        EntityDef {
            name: "User".into(),
            id_field: "id".into(),
            fields: vec![
                FieldDef { property_name: "id".into(), column_name: "id".into(), position: Some(ColumnPosition(0)), type_code: TypeCode::I64, relationship: None },
                FieldDef { property_name: "age".into(), column_name: "age".into(), position: Some(ColumnPosition(1)), type_code: TypeCode::I32, relationship: None },
                FieldDef { property_name: "name".into(), column_name: "name".into(), position: Some(ColumnPosition(2)), type_code: TypeCode::String, relationship: None },
            ],
            indexes: vec![],
        }
    }

    #[test]
    fn derived_range_query() {
        let entities = HashMap::new();
        let q = plan_method("findByAgeBetween", ParamShape::Unit, ReturnHint::List, &user(), &entities).unwrap();
        assert_eq!(q.op, Some(OpCode::Find));
        assert_eq!(q.conditions.len(), 1);
        assert_eq!(q.conditions[0].path, vec!["age".to_string()]);
        assert_eq!(q.conditions[0].operator, Operator::Between);
    }

    #[test]
    fn derived_string_starting_with() {
        let entities = HashMap::new();
        let q = plan_method("findByNameStartingWith", ParamShape::Unit, ReturnHint::List, &user(), &entities).unwrap();
        assert_eq!(q.conditions[0].operator, Operator::StartsWith);
        assert_eq!(q.conditions[0].path, vec!["name".to_string()]);
    }

    #[test]
    fn first_n_sets_limit() {
        let entities = HashMap::new();
        let q = plan_method("findFirst3ByAge", ParamShape::Unit, ReturnHint::List, &user(), &entities).unwrap();
        assert_eq!(q.limit, Some(3));
    }

    #[test]
    fn order_by_is_parsed() {
        let entities = HashMap::new();
        let q = plan_method("findByAgeOrderByNameDesc", ParamShape::Unit, ReturnHint::List, &user(), &entities).unwrap();
        assert_eq!(q.order_by.len(), 1);
        assert_eq!(q.order_by[0].direction, Direction::Desc);
    }

    #[test]
    fn find_by_id_is_a_builtin() {
        let entities = HashMap::new();
        let q = plan_method("findById", ParamShape::Id, ReturnHint::Optional, &user(), &entities).unwrap();
        assert_eq!(q.return_kind, Some(ReturnKind::Optional));
        assert_eq!(q.conditions.len(), 1);
        assert_eq!(q.conditions[0].path, vec!["id".to_string()]);
    }

    #[test]
    fn count_all_is_a_builtin() {
        let entities = HashMap::new();
        let q = plan_method("count", ParamShape::Unit, ReturnHint::List, &user(), &entities).unwrap();
        assert_eq!(q.op, Some(OpCode::CountAll));
        assert!(q.conditions.is_empty());
    }
}
