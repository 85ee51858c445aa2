//! Lowers a `LogicalQuery` (spec.md §3) into a `CompiledQuery` (spec.md
//! §4.7): every property path resolved to a column position and type code,
//! every literal coerced to its column's storage representation, composite
//! indexes pre-matched against each condition group, and relationship
//! crossings resolved into joins.

mod compile;
mod compiled;
mod error;

pub use compile::compile;
pub use compiled::{
    CompiledArgRef, CompiledArgs, CompiledCondition, CompiledJoin, CompiledOrderItem, CompiledProjection, CompiledProjectionItem, CompiledQuery, CompiledUpdateAssignment, CompositeShape,
    ConditionGroup,
};
pub use error::CompileError;
