//! Small, dependency-light types shared by every layer of Memris: wire-stable
//! type codes, operator and combinator tags used by both query front-ends,
//! and the structured error type returned at the repository boundary.

mod error;
mod ids;
mod op;
mod type_code;

pub use error::{Error, ErrorKind, Result};
pub use ids::{ArgSlot, ColumnPosition, IndexId, TableId};
pub use op::{Combinator, JoinKind, OpCode, Operator, ReturnKind};
pub use type_code::TypeCode;

#[cfg(test)]
mod tests;
