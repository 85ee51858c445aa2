//! Wires the two query front-ends (`memris-derived-query`,
//! `memris-sql-parser`) through `memris-physical-plan`'s compiler into
//! `memris-execution`'s executor, so a caller holding only a method
//! descriptor and a live table can run it end to end (spec.md §9 "treat
//! them as two front-ends producing the same LogicalQuery").

mod dispatch;
mod error;
mod source;

pub use dispatch::{compile_method, plan_logical, run};
pub use error::Result;
pub use source::MethodSource;

pub use memris_derived_query::{ParamShape, ReturnHint};
pub use memris_sql_parser::ReturnArity;

#[cfg(test)]
mod tests;
