use memris_primitives::Error as CoreError;

/// Wraps whichever front-end (or the compiler) rejected a method, converting
/// all of them into the shared [`memris_primitives::Error`] at this crate's
/// boundary (spec.md §7, SPEC_FULL.md §11).
pub type Result<T> = std::result::Result<T, CoreError>;
