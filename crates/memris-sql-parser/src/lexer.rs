use crate::error::LexError;

/// A single lexeme of the embedded query language (spec.md §4.6 "Lexer").
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A dotted identifier (`u`, `u.name`, `department.address.city`) or a
    /// bare alias/keyword-like word that didn't match a keyword.
    Ident(String),
    Keyword(Keyword),
    StringLit(String),
    IntLit(i64),
    DecimalLit(f64),
    NamedParam(String),
    PositionalParam(u32),
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Comma,
    LParen,
    RParen,
    Star,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Join,
    Left,
    Fetch,
    As,
    Update,
    Set,
    Delete,
    Order,
    By,
    Group,
    Having,
    Asc,
    Desc,
    And,
    Or,
    Not,
    Distinct,
    Count,
    Like,
    Ilike,
    In,
    Between,
    Is,
    Null,
    True,
    False,
}

fn keyword_of(word: &str) -> Option<Keyword> {
    Some(match word.to_ascii_uppercase().as_str() {
        "SELECT" => Keyword::Select,
        "FROM" => Keyword::From,
        "WHERE" => Keyword::Where,
        "JOIN" => Keyword::Join,
        "LEFT" => Keyword::Left,
        "FETCH" => Keyword::Fetch,
        "AS" => Keyword::As,
        "UPDATE" => Keyword::Update,
        "SET" => Keyword::Set,
        "DELETE" => Keyword::Delete,
        "ORDER" => Keyword::Order,
        "BY" => Keyword::By,
        "GROUP" => Keyword::Group,
        "HAVING" => Keyword::Having,
        "ASC" => Keyword::Asc,
        "DESC" => Keyword::Desc,
        "AND" => Keyword::And,
        "OR" => Keyword::Or,
        "NOT" => Keyword::Not,
        "DISTINCT" => Keyword::Distinct,
        "COUNT" => Keyword::Count,
        "LIKE" => Keyword::Like,
        "ILIKE" => Keyword::Ilike,
        "IN" => Keyword::In,
        "BETWEEN" => Keyword::Between,
        "IS" => Keyword::Is,
        "NULL" => Keyword::Null,
        "TRUE" => Keyword::True,
        "FALSE" => Keyword::False,
        _ => return None,
    })
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Tokenizes an embedded query string (spec.md §4.6 "Lexer"). Keywords are
/// case-insensitive; identifiers may be dotted paths.
pub fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, LexError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        match c {
            '=' => {
                tokens.push((Token::Eq, start));
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'>') {
                    tokens.push((Token::NotEq, start));
                    i += 2;
                } else if chars.get(i + 1) == Some(&'=') {
                    tokens.push((Token::Le, start));
                    i += 2;
                } else {
                    tokens.push((Token::Lt, start));
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push((Token::Ge, start));
                    i += 2;
                } else {
                    tokens.push((Token::Gt, start));
                    i += 1;
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push((Token::NotEq, start));
                    i += 2;
                } else {
                    return Err(LexError::UnexpectedChar(c, start));
                }
            }
            ',' => {
                tokens.push((Token::Comma, start));
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, start));
                i += 1;
            }
            '*' => {
                tokens.push((Token::Star, start));
                i += 1;
            }
            '\'' => {
                let (lit, next) = lex_string(&chars, i)?;
                tokens.push((Token::StringLit(lit), start));
                i = next;
            }
            ':' => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_continue(chars[j]) {
                    j += 1;
                }
                if j == i + 1 {
                    return Err(LexError::UnexpectedChar(c, start));
                }
                tokens.push((Token::NamedParam(chars[i + 1..j].iter().collect()), start));
                i = j;
            }
            '?' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_ascii_digit() {
                    j += 1;
                }
                if j == i + 1 {
                    return Err(LexError::UnexpectedChar(c, start));
                }
                let n: u32 = chars[i + 1..j].iter().collect::<String>().parse().map_err(|_| LexError::MalformedNumber(start))?;
                tokens.push((Token::PositionalParam(n), start));
                i = j;
            }
            c if c.is_ascii_digit() => {
                let (num, next) = lex_number(&chars, i)?;
                tokens.push((num, start));
                i = next;
            }
            c if is_ident_start(c) => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_continue(chars[j]) {
                    j += 1;
                }
                let word: String = chars[i..j].iter().collect();
                let token = match keyword_of(&word) {
                    Some(kw) => Token::Keyword(kw),
                    None => Token::Ident(word),
                };
                tokens.push((token, start));
                i = j;
            }
            _ => return Err(LexError::UnexpectedChar(c, start)),
        }
    }
    tokens.push((Token::Eof, chars.len()));
    Ok(tokens)
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), LexError> {
    let mut i = start + 1;
    let mut out = String::new();
    loop {
        if i >= chars.len() {
            return Err(LexError::UnterminatedString(start));
        }
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            return Ok((out, i + 1));
        }
        out.push(chars[i]);
        i += 1;
    }
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), LexError> {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let text: String = chars[start..i].iter().collect();
        let value: f64 = text.parse().map_err(|_| LexError::MalformedNumber(start))?;
        return Ok((Token::DecimalLit(value), i));
    }
    let text: String = chars[start..i].iter().collect();
    let value: i64 = text.parse().map_err(|_| LexError::MalformedNumber(start))?;
    Ok((Token::IntLit(value), i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_simple_comparison() {
        let tokens = tokenize("u.age >= 21").unwrap();
        assert_eq!(tokens[0].0, Token::Ident("u.age".into()));
        assert_eq!(tokens[1].0, Token::Ge);
        assert_eq!(tokens[2].0, Token::IntLit(21));
    }

    #[test]
    fn lexes_quoted_string_with_doubled_quote_escape() {
        let tokens = tokenize("'O''Brien'").unwrap();
        assert_eq!(tokens[0].0, Token::StringLit("O'Brien".into()));
    }

    #[test]
    fn lexes_named_and_positional_parameters() {
        let tokens = tokenize(":name ?1").unwrap();
        assert_eq!(tokens[0].0, Token::NamedParam("name".into()));
        assert_eq!(tokens[1].0, Token::PositionalParam(1));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = tokenize("where AND select").unwrap();
        assert_eq!(tokens[0].0, Token::Keyword(Keyword::Where));
        assert_eq!(tokens[1].0, Token::Keyword(Keyword::And));
        assert_eq!(tokens[2].0, Token::Keyword(Keyword::Select));
    }
}
