/// The top-level operation a `LogicalQuery` performs (spec.md §3
/// "LogicalQuery").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Find,
    Count,
    CountAll,
    Exists,
    Update,
    Delete,
}

/// What shape of result the caller expects back (spec.md §3, §4.8 "Return
/// kind conversion").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    List,
    Optional,
    Count,
    Boolean,
    /// `UPDATE`/`DELETE`: the affected-row count (spec.md §4.6).
    Modifying,
}

/// Per-condition comparison or string-match operator (spec.md §3
/// "LogicalQuery", §4.5 derived-suffix table, §4.6 embedded-query keywords).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Between,
    Like,
    NotLike,
    /// Case-insensitive `LIKE` (embedded-query `ILIKE`); derived methods
    /// express this as the base operator plus the `IgnoreCase` flag instead.
    ILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
}

impl Operator {
    /// Operators an index probe can serve directly (spec.md §4.3 "Probe
    /// contract"). `NotEq`/`NotLike`/`NotContains`/`NotIn` are never
    /// index-supported: every index family returns the *matching* set, and
    /// negation would require a full complement pass, so the executor
    /// always folds these into the condition program (spec.md §4.8 step 4).
    pub fn is_index_supported(self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Gt
                | Operator::Ge
                | Operator::Lt
                | Operator::Le
                | Operator::Between
                | Operator::In
                | Operator::StartsWith
                | Operator::EndsWith
        )
    }

    pub fn is_range_like(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le | Operator::Between
        )
    }
}

/// How a condition combines with the next one in a flat DNF list (spec.md
/// §3 "combinator-to-next").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    Or,
    /// The last condition in the list has no successor.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
}
