use hashbrown::HashMap;
use memris_primitives::{ArgSlot, Combinator, Operator};
use memris_expr::{ArgRef, Condition, ConditionArgs};
use memris_schema::EntityDef;

use crate::error::DerivedQueryError;
use crate::path::match_path;
use crate::suffix::{match_suffix, strip_ignore_case};

/// Parses the condition section of a derived method name (everything
/// between `By` and an optional trailing `OrderBy`) into a flat DNF
/// condition list (spec.md §4.5, §3 "LogicalQuery").
pub fn parse_conditions(
    words: &[String],
    entity: &EntityDef,
    entities: &HashMap<String, EntityDef>,
) -> Result<Vec<Condition>, DerivedQueryError> {
    let mut conditions = Vec::new();
    let mut arg_slot = 0u16;
    let mut i = 0usize;

    while i < words.len() {
        let (path, consumed) = match_path(words, i, entity, entities)
            .ok_or_else(|| DerivedQueryError::unknown_property(words[i..].join("")))?;
        i += consumed;

        let segment_end = words[i..].iter().position(|w| w == "And" || w == "Or").map(|p| i + p).unwrap_or(words.len());
        let segment = &words[i..segment_end];
        let (segment, case_ignore) = strip_ignore_case(segment);

        let (operator, args) = if segment.is_empty() {
            let args = ConditionArgs::One(ArgRef::Param(ArgSlot(arg_slot)));
            arg_slot += 1;
            (Operator::Eq, args)
        } else {
            let m = match_suffix(segment).ok_or_else(|| DerivedQueryError::unknown_suffix(segment.join("")))?;
            let args = if let Some(literal) = m.literal {
                ConditionArgs::One(ArgRef::Literal(literal))
            } else {
                let consumed_slots = m.arity as u16;
                let args = match m.arity {
                    0 => ConditionArgs::None,
                    1 => ConditionArgs::One(ArgRef::Param(ArgSlot(arg_slot))),
                    2 => ConditionArgs::Two(ArgRef::Param(ArgSlot(arg_slot)), ArgRef::Param(ArgSlot(arg_slot + 1))),
                    n => ConditionArgs::Many((0..n as u16).map(|k| ArgRef::Param(ArgSlot(arg_slot + k))).collect()),
                };
                arg_slot += consumed_slots;
                args
            };
            (m.operator, args)
        };

        let mut condition = Condition::new(path, operator, args);
        condition.case_ignore = case_ignore;

        i = segment_end;
        condition.next = if i < words.len() {
            let is_or = words[i] == "Or";
            i += 1;
            if is_or { Combinator::Or } else { Combinator::And }
        } else {
            Combinator::None
        };
        conditions.push(condition);
    }

    Ok(conditions)
}
