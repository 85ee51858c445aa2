use memris_primitives::{ArgSlot, ColumnPosition, JoinKind, OpCode, Operator, ReturnKind, TypeCode};
use memris_sats::StorageValue;

/// Either a parameter slot or a literal already coerced to match its
/// column's storage representation (spec.md §4.7 "Each bound literal is
/// converted to the storage representation").
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledArgRef {
    Param(ArgSlot),
    Literal(StorageValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledArgs {
    None,
    One(CompiledArgRef),
    Two(CompiledArgRef, CompiledArgRef),
    Many(Vec<CompiledArgRef>),
}

/// One condition resolved against a table's schema: a column position, its
/// type code, and the operator/argument program the executor runs against
/// it (spec.md §4.8 "Condition program"). `join` names which compiled join
/// this column lives behind; `None` means the root table.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    pub join: Option<usize>,
    pub column: ColumnPosition,
    pub type_code: TypeCode,
    pub operator: Operator,
    pub args: CompiledArgs,
    pub case_ignore: bool,
}

/// A composite index shape matched against a group's leading EQ conditions,
/// plus an optional trailing range condition (spec.md §4.7 "the compiler
/// records per-index shapes").
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeShape {
    pub index_name: String,
    pub columns: Vec<ColumnPosition>,
    /// Indices into the owning group's `conditions`, in key order, that this
    /// shape consumes.
    pub consumed: Vec<usize>,
    pub trailing_range: bool,
}

/// One AND-group of conditions (spec.md §4.8 "condition `i` with
/// `next-combinator = AND` stays in the current group"). Groups combine
/// with OR.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    pub conditions: Vec<CompiledCondition>,
    pub composite: Option<CompositeShape>,
}

/// A join resolved to concrete column positions (spec.md §4.7 "Join
/// descriptors carry source column index, target column index (or
/// target-is-id flag) ... runtime wiring ... attached later").
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledJoin {
    pub source_column: ColumnPosition,
    pub source_type_code: TypeCode,
    pub target_entity: String,
    /// `None` means the join targets the related table's id column.
    pub target_column: Option<ColumnPosition>,
    pub kind: JoinKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledOrderItem {
    pub join: Option<usize>,
    pub column: ColumnPosition,
    pub direction: memris_expr::Direction,
    /// From metadata: whether the column's values are guaranteed non-null
    /// primitives (spec.md §4.8 "primitive-non-null flag from metadata").
    pub primitive_non_null: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProjectionItem {
    pub alias: String,
    pub join: Option<usize>,
    pub column: ColumnPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProjection {
    pub target_type: Option<String>,
    pub items: Vec<CompiledProjectionItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUpdateAssignment {
    pub column: ColumnPosition,
    pub value: CompiledArgRef,
}

/// The executable form of a `LogicalQuery` (spec.md §4.7). Every path has
/// been resolved to a concrete column position and type code; every
/// literal has been coerced to match its column. Runtime-only state (which
/// table backs `target_entity`, which materializer to call) is attached by
/// the repository wiring step, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub op: OpCode,
    pub return_kind: ReturnKind,
    pub groups: Vec<ConditionGroup>,
    pub joins: Vec<CompiledJoin>,
    pub order_by: Vec<CompiledOrderItem>,
    pub limit: Option<usize>,
    pub distinct: bool,
    pub projection: Option<CompiledProjection>,
    pub update_assignments: Vec<CompiledUpdateAssignment>,
}
