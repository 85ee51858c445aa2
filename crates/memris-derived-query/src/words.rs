/// Splits a PascalCase method-name fragment into its constituent words
/// (spec.md §4.5 "tokenizes repository method names"). `"AgeBetween"` ->
/// `["Age", "Between"]`, `"GreaterThanEqual"` -> `["Greater", "Than",
/// "Equal"]`.
pub fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let starts_new_word = c.is_uppercase()
            && !current.is_empty()
            && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
        if starts_new_word {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Joins a run of PascalCase words into a lowerCamelCase property name
/// (`["First", "Name"]` -> `"firstName"`).
pub fn camel_join(words: &[String]) -> String {
    let mut out = String::new();
    for (i, w) in words.iter().enumerate() {
        if i == 0 {
            let mut chars = w.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_lowercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(w);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_compound_suffixes() {
        assert_eq!(split_words("GreaterThanEqual"), vec!["Greater", "Than", "Equal"]);
        assert_eq!(split_words("AgeBetween"), vec!["Age", "Between"]);
        assert_eq!(split_words("IsNotNull"), vec!["Is", "Not", "Null"]);
    }

    #[test]
    fn camel_join_lowercases_only_the_first_word() {
        assert_eq!(camel_join(&["First".into(), "Name".into()]), "firstName");
        assert_eq!(camel_join(&["Age".into()]), "age");
    }
}
