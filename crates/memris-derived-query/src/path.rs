use hashbrown::HashMap;
use memris_schema::EntityDef;

use crate::words::camel_join;

/// Greedily matches the longest run of `words[start..]` against a field of
/// `entity`, descending through relationship descriptors when the matched
/// field isn't stored (spec.md §4.5 "chooses the longest identifier prefix
/// that matches a field ... entering nested entities through relationship
/// descriptors"; §9 "resolve properties greedily first, then suffix").
///
/// Returns the dotted property path and how many words were consumed.
pub fn match_path(words: &[String], start: usize, entity: &EntityDef, entities: &HashMap<String, EntityDef>) -> Option<(Vec<String>, usize)> {
    let mut current_entity = entity;
    let mut consumed = start;
    let mut path = Vec::new();

    loop {
        let remaining = &words[consumed..];
        if remaining.is_empty() {
            return if path.is_empty() { None } else { Some((path, consumed - start)) };
        }
        let (field, len) = (1..=remaining.len()).rev().find_map(|len| {
            let candidate = camel_join(&remaining[..len]);
            current_entity.field(&candidate).map(|f| (f, len))
        })?;
        path.push(field.property_name.clone());
        consumed += len;
        match &field.relationship {
            Some(rel) if consumed < words.len() => {
                current_entity = entities.get(&rel.target_entity)?;
            }
            _ => return Some((path, consumed - start)),
        }
    }
}
