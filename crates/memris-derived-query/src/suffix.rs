use memris_primitives::Operator;
use memris_sats::StorageValue;

/// A matched operator suffix: the resolved operator, how many parameters
/// it consumes, and an optional bound literal for the boolean suffix forms
/// (spec.md §4.5 "the Boolean True/False suffixes bind a literal boolean
/// instead of consuming a parameter").
pub struct SuffixMatch {
    pub operator: Operator,
    pub arity: usize,
    pub literal: Option<StorageValue>,
}

struct Entry {
    words: &'static [&'static str],
    operator: Operator,
    arity: usize,
    literal: Option<StorageValue>,
    rank: u8,
}

/// The suffix table of spec.md §4.5, flattened to one row per spelling
/// variant. Entries are tried longest-word-count first; ties are broken by
/// `rank` (ascending — the table's declared order).
fn table() -> Vec<Entry> {
    vec![
        Entry { words: &["Greater", "Than", "Equal"], operator: Operator::Ge, arity: 1, literal: None, rank: 1 },
        Entry { words: &["Less", "Than", "Equal"], operator: Operator::Le, arity: 1, literal: None, rank: 1 },
        Entry { words: &["Greater", "Than"], operator: Operator::Gt, arity: 1, literal: None, rank: 2 },
        Entry { words: &["Less", "Than"], operator: Operator::Lt, arity: 1, literal: None, rank: 2 },
        Entry { words: &["Between"], operator: Operator::Between, arity: 2, literal: None, rank: 3 },
        Entry { words: &["Starting", "With"], operator: Operator::StartsWith, arity: 1, literal: None, rank: 3 },
        Entry { words: &["Starts", "With"], operator: Operator::StartsWith, arity: 1, literal: None, rank: 3 },
        Entry { words: &["Ending", "With"], operator: Operator::EndsWith, arity: 1, literal: None, rank: 3 },
        Entry { words: &["Ends", "With"], operator: Operator::EndsWith, arity: 1, literal: None, rank: 3 },
        Entry { words: &["Not", "Containing"], operator: Operator::NotContains, arity: 1, literal: None, rank: 3 },
        Entry { words: &["Not", "Contains"], operator: Operator::NotContains, arity: 1, literal: None, rank: 3 },
        Entry { words: &["Containing"], operator: Operator::Contains, arity: 1, literal: None, rank: 4 },
        Entry { words: &["Contains"], operator: Operator::Contains, arity: 1, literal: None, rank: 4 },
        Entry { words: &["Is", "Not", "Null"], operator: Operator::IsNotNull, arity: 0, literal: None, rank: 4 },
        Entry { words: &["Not", "Null"], operator: Operator::IsNotNull, arity: 0, literal: None, rank: 4 },
        Entry { words: &["Not", "Like"], operator: Operator::NotLike, arity: 1, literal: None, rank: 4 },
        Entry { words: &["Not", "In"], operator: Operator::NotIn, arity: 1, literal: None, rank: 4 },
        Entry { words: &["Is", "Null"], operator: Operator::IsNull, arity: 0, literal: None, rank: 5 },
        Entry { words: &["Null"], operator: Operator::IsNull, arity: 0, literal: None, rank: 5 },
        Entry { words: &["Like"], operator: Operator::Like, arity: 1, literal: None, rank: 5 },
        Entry { words: &["Is", "True"], operator: Operator::Eq, arity: 0, literal: Some(StorageValue::Bool(true)), rank: 5 },
        Entry { words: &["Is", "False"], operator: Operator::Eq, arity: 0, literal: Some(StorageValue::Bool(false)), rank: 5 },
        Entry { words: &["True"], operator: Operator::Eq, arity: 0, literal: Some(StorageValue::Bool(true)), rank: 5 },
        Entry { words: &["False"], operator: Operator::Eq, arity: 0, literal: Some(StorageValue::Bool(false)), rank: 5 },
        Entry { words: &["After"], operator: Operator::Gt, arity: 1, literal: None, rank: 6 },
        Entry { words: &["Before"], operator: Operator::Lt, arity: 1, literal: None, rank: 6 },
        Entry { words: &["In"], operator: Operator::In, arity: 1, literal: None, rank: 8 },
        Entry { words: &["Not"], operator: Operator::Ne, arity: 1, literal: None, rank: 9 },
    ]
}

/// Matches `words` (whatever remains of a condition segment after the
/// property path has been consumed) against the suffix table, trying the
/// longest candidate first and breaking ties by rank. `None` means plain
/// equality (no suffix at all).
pub fn match_suffix(words: &[String]) -> Option<SuffixMatch> {
    if words.is_empty() {
        return None;
    }
    let mut candidates = table();
    candidates.sort_by(|a, b| b.words.len().cmp(&a.words.len()).then(a.rank.cmp(&b.rank)));
    for entry in candidates {
        if entry.words.len() != words.len() {
            continue;
        }
        if entry.words.iter().zip(words.iter()).all(|(expected, actual)| *expected == actual.as_str()) {
            return Some(SuffixMatch { operator: entry.operator, arity: entry.arity, literal: entry.literal });
        }
    }
    None
}

/// Strips a trailing `IgnoreCase`/`AllIgnoreCase` modifier (spec.md §4.5
/// rank 7), returning whether it was present.
pub fn strip_ignore_case(words: &[String]) -> (&[String], bool) {
    if words.last().is_some_and(|w| w == "Case") && words.len() >= 2 {
        let tail = &words[words.len() - 2..];
        if tail[0] == "Ignore" {
            return (&words[..words.len() - 2], true);
        }
        if words.len() >= 3 && words[words.len() - 3] == "All" && tail[0] == "Ignore" {
            return (&words[..words.len() - 3], true);
        }
    }
    (words, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_compound_wins_over_shorter_candidates() {
        let words: Vec<String> = vec!["Greater".into(), "Than".into(), "Equal".into()];
        let m = match_suffix(&words).unwrap();
        assert_eq!(m.operator, Operator::Ge);
    }

    #[test]
    fn between_consumes_two_arguments() {
        let words: Vec<String> = vec!["Between".into()];
        let m = match_suffix(&words).unwrap();
        assert_eq!(m.arity, 2);
    }

    #[test]
    fn ignore_case_is_stripped_as_a_modifier() {
        let words: Vec<String> = vec!["Starting".into(), "With".into(), "Ignore".into(), "Case".into()];
        let (rest, ignore) = strip_ignore_case(&words);
        assert!(ignore);
        assert_eq!(rest, &["Starting".to_string(), "With".to_string()]);
    }
}
