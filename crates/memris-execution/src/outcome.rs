use memris_table::Selection;

/// The result of running a `CompiledQuery`, already shaped to match its
/// `ReturnKind` (spec.md §4.8 "Return kind conversion"). A repository
/// materializes `Rows` into host objects; the other variants are already
/// in their final form.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Rows(Selection),
    Count(usize),
    Exists(bool),
    /// `UPDATE`/`DELETE` row count (spec.md §4.6).
    Affected(usize),
}
