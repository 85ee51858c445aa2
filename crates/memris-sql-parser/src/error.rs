use ariadne::{Label, Report, ReportKind, Source};
use memris_primitives::Error as CoreError;
use thiserror::Error;

/// A lex-time failure: an unexpected character or an unterminated literal
/// (spec.md §4.6 lexer).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),
    #[error("malformed numeric literal at offset {0}")]
    MalformedNumber(usize),
}

/// A parse or semantic failure (spec.md §4.6 parser invariants).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unexpected end of query")]
    UnexpectedEof,
    #[error("unexpected token '{0}' at offset {1}")]
    UnexpectedToken(String, usize),
    #[error("projection requires aliases")]
    ProjectionRequiresAliases,
    #[error("native queries not supported")]
    NativeQueryNotSupported,
    #[error("modifying query without the @Modifying marker")]
    MissingModifyingMarker,
    #[error("UPDATE/DELETE return type must be void, int, or long")]
    InvalidModifyingReturnType,
    #[error("update cannot assign to the id column '{0}'")]
    UpdateAssignsId(String),
    #[error("count queries require a numeric return type")]
    CountRequiresNumericReturn,
    #[error("select queries require a non-numeric return type")]
    SelectRequiresNonNumericReturn,
    #[error("named parameter ':{0}' does not resolve to a declared method parameter")]
    UnresolvedNamedParameter(String),
    #[error("positional parameter index {0} is out of range")]
    PositionalParameterOutOfRange(u32),
    #[error("unknown property path '{0}'")]
    UnknownProperty(String),
    #[error("operator cannot be negated by NOT")]
    UnsupportedNegation,
    #[error("GROUP BY/HAVING is not supported; no aggregation path exists past the compiler")]
    GroupByHavingNotSupported,
}

impl ParseError {
    /// Renders the error as a span-annotated `ariadne` report over the
    /// original query text (spec.md §10 "parse errors are rendered with
    /// ariadne").
    pub fn report(&self, source: &str) -> String {
        let offset = self.offset().unwrap_or(0).min(source.len());
        let mut buf = Vec::new();
        let result = Report::build(ReportKind::Error, "query", offset)
            .with_message(self.to_string())
            .with_label(Label::new(("query", offset..offset.max(offset + 1).min(source.len().max(offset + 1)))).with_message(self.to_string()))
            .finish()
            .write(("query", Source::from(source)), &mut buf);
        if result.is_err() {
            return self.to_string();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn offset(&self) -> Option<usize> {
        match self {
            ParseError::Lex(LexError::UnexpectedChar(_, o)) => Some(*o),
            ParseError::Lex(LexError::UnterminatedString(o)) => Some(*o),
            ParseError::Lex(LexError::MalformedNumber(o)) => Some(*o),
            ParseError::UnexpectedToken(_, o) => Some(*o),
            _ => None,
        }
    }
}

impl From<ParseError> for CoreError {
    fn from(e: ParseError) -> Self {
        CoreError::invalid_query(e.to_string())
    }
}
