//! `LogicalQuery` (spec.md §3, §4.7): the shape both query front-ends
//! (derived-method and embedded JPQL-like) produce, and the input to the
//! compiler that lowers it into a `CompiledQuery`.

use memris_primitives::{ArgSlot, Combinator, JoinKind, OpCode, Operator, ReturnKind};
use memris_sats::StorageValue;

/// Either a bound parameter slot (resolved against the method's argument
/// array at dispatch time) or a literal baked in at parse time (spec.md
/// §4.5 "the Boolean True/False suffixes bind a literal boolean instead of
/// consuming a parameter").
#[derive(Debug, Clone, PartialEq)]
pub enum ArgRef {
    Param(ArgSlot),
    Literal(StorageValue),
}

/// The argument shape a condition's operator needs (spec.md §4.1's scan
/// primitives: zero args for null checks, one for equality/comparison, two
/// for `BETWEEN`, a variable list for `IN`).
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionArgs {
    None,
    One(ArgRef),
    Two(ArgRef, ArgRef),
    Many(Vec<ArgRef>),
}

/// One DNF condition: a property path (dotted through relationships),
/// operator, its arguments, case-sensitivity, and the combinator joining it
/// to the next condition (spec.md §3 "LogicalQuery").
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: Vec<String>,
    pub operator: Operator,
    pub args: ConditionArgs,
    pub case_ignore: bool,
    pub next: Combinator,
}

impl Condition {
    pub fn new(path: Vec<String>, operator: Operator, args: ConditionArgs) -> Self {
        Self { path, operator, args, case_ignore: false, next: Combinator::None }
    }
}

/// A join triggered by a property path crossing a relationship (spec.md
/// §4.7 "Join descriptors").
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDescriptor {
    pub path: Vec<String>,
    pub target_entity: String,
    pub join_column: String,
    /// `None` means the join targets the related table's id column.
    pub referenced_column: Option<String>,
    pub kind: JoinKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub path: Vec<String>,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub path: Vec<String>,
    pub alias: String,
}

/// Requires an alias per item and (per spec.md §4.6) a target type whose
/// component names equal the aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub target_type: Option<String>,
    pub items: Vec<ProjectionItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    pub path: Vec<String>,
    pub value: ArgRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Part of the model's shape (spec.md §3); no current front-end populates
/// it. `memris-sql-parser` rejects `GROUP BY`/`HAVING` at parse time rather
/// than building one, since neither the compiler nor the executor has an
/// aggregation path to consume it yet.
#[derive(Debug, Clone, PartialEq)]
pub struct HavingPredicate {
    pub aggregate: AggregateKind,
    pub path: Option<Vec<String>>,
    pub operator: Operator,
    pub arg: ArgRef,
}

/// The op-independent query shape both front-ends target (spec.md §3
/// "LogicalQuery").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogicalQuery {
    pub op: Option<OpCode>,
    pub return_kind: Option<ReturnKind>,
    pub conditions: Vec<Condition>,
    pub joins: Vec<JoinDescriptor>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<usize>,
    pub distinct: bool,
    pub projection: Option<Projection>,
    pub update_assignments: Vec<UpdateAssignment>,
    pub having: Vec<HavingPredicate>,
}

impl LogicalQuery {
    pub fn new(op: OpCode, return_kind: ReturnKind) -> Self {
        Self { op: Some(op), return_kind: Some(return_kind), ..Default::default() }
    }
}
