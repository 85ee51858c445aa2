use std::fmt;

/// Stable position of a column within a table's ordered schema (spec.md §3
/// "Table"). Never reused for a different field for the lifetime of the
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnPosition(pub u16);

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col#{}", self.0)
    }
}

/// Index into a method's argument array (spec.md §4.7 "Each parameter slot
/// receives the parameter index into the method's argument array").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgSlot(pub u16);

/// Identity of a declared index within an entity (spec.md §6 "declared
/// indexes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexId(pub u32);

/// Identity of a table within an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);
