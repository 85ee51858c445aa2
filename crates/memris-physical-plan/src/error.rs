use memris_primitives::Error as CoreError;
use thiserror::Error;

/// A failure resolving a `LogicalQuery` against entity metadata (spec.md
/// §4.7, §4.8 "Unknown property paths, unsupported operator-on-type
/// combinations ... fail at plan/compile time").
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("unknown property path '{0}'")]
    UnknownProperty(String),
    #[error("property path '{0}' does not cross a relationship but is used in a join")]
    NotARelationship(String),
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
    #[error("literal of type {found:?} cannot be compared against column of type {expected:?}")]
    LiteralTypeMismatch { expected: memris_primitives::TypeCode, found: memris_primitives::TypeCode },
    #[error("a relationship-holder field has no stored column")]
    FieldNotStored(String),
}

impl From<CompileError> for CoreError {
    fn from(e: CompileError) -> Self {
        CoreError::invalid_query(e.to_string())
    }
}
