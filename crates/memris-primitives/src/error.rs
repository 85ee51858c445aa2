use std::fmt;

use thiserror::Error;

/// The error taxonomy of spec.md §7 ("kinds, not names"). `concurrent-read-starvation`
/// is deliberately absent: it is recovered locally by `memris-table` and
/// never surfaces to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown property path, operator-on-type mismatch, missing parameter,
    /// ambiguous built-in, projection without aliases, modifying query
    /// without the marker, update assigning to id, native-query flag.
    InvalidQuery,
    /// Wrong argument count, out-of-range argument index, wrong type in a
    /// homogeneous `IN` collection.
    Argument,
    /// A required-single-row result encountered 0 or >1 rows.
    Cardinality,
    /// A column or table reached an implementation-defined maximum (e.g.
    /// the `RowId` range).
    Capacity,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidQuery => "invalid-query",
            ErrorKind::Argument => "argument",
            ErrorKind::Cardinality => "cardinality",
            ErrorKind::Capacity => "capacity",
        };
        f.write_str(s)
    }
}

/// A structured, caller-facing failure: the error kind, the offending
/// method identity (when known), and a short human-readable reason
/// (spec.md §7 "User-visible failure behavior").
#[derive(Debug, Error)]
#[error("{kind}: {reason}{}", method.as_deref().map(|m| format!(" (in {m})")).unwrap_or_default())]
pub struct Error {
    pub kind: ErrorKind,
    pub method: Option<String>,
    pub reason: String,
}

impl Error {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            method: None,
            reason: reason.into(),
        }
    }

    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQuery, reason)
    }

    pub fn argument(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Argument, reason)
    }

    pub fn cardinality(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cardinality, reason)
    }

    pub fn capacity(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Capacity, reason)
    }

    /// Stamps the offending method identity onto an existing error,
    /// building the `(method identity, reason)` pair spec.md §7 requires.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

pub type Result<T> = std::result::Result<T, Error>;
