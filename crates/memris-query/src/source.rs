use memris_derived_query::{ParamShape, ReturnHint};
use memris_sql_parser::ReturnArity;

/// Everything a repository method supplies that either front-end needs to
/// produce a `LogicalQuery` (spec.md §9 "treat them as two front-ends
/// producing the same LogicalQuery").
pub enum MethodSource<'a> {
    /// A derived method name, resolved by `memris-derived-query` (spec.md
    /// §4.5).
    Derived { method_name: &'a str, param_shape: ParamShape, return_hint: ReturnHint },
    /// An embedded query string, parsed by `memris-sql-parser` (spec.md
    /// §4.6).
    Embedded {
        src: &'a str,
        param_names: &'a [String],
        modifying: bool,
        native_query: bool,
        return_arity: ReturnArity,
    },
}
