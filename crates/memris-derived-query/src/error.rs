use memris_primitives::Error as CoreError;
use thiserror::Error;

/// Parse-time failures specific to the derived-method front-end (spec.md
/// §4.5, §7 "invalid-query"). Converts into [`memris_primitives::Error`] at
/// the crate boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerivedQueryError {
    #[error("method name does not start with a recognized prefix (find/query/get/read/stream/count/exists/delete/remove)")]
    UnrecognizedPrefix,
    #[error("method name is missing the 'By' keyword")]
    MissingBy,
    #[error("unknown property path segment '{0}'")]
    UnknownProperty(String),
    #[error("unrecognized operator suffix '{0}'")]
    UnknownSuffix(String),
    #[error("ambiguous built-in method resolution for '{0}'")]
    AmbiguousBuiltin(String),
    #[error("no built-in overload of '{0}' matches the declared parameter shape")]
    NoMatchingBuiltinOverload(String),
}

impl DerivedQueryError {
    pub fn unknown_property(segment: impl Into<String>) -> Self {
        DerivedQueryError::UnknownProperty(segment.into())
    }

    pub fn unknown_suffix(segment: impl Into<String>) -> Self {
        DerivedQueryError::UnknownSuffix(segment.into())
    }
}

impl From<DerivedQueryError> for CoreError {
    fn from(e: DerivedQueryError) -> Self {
        CoreError::invalid_query(e.to_string())
    }
}
