use memris_primitives::Result;
use memris_sats::StorageValue;
use memris_table::{RowRef, Table};

/// External collaborator that turns a row into a host object (spec.md §6
/// "Materializer contract"). Reads the row via the table's sequence-lock
/// path, so observations are never torn (spec.md §8).
pub trait Materializer {
    type Output;

    fn materialize(&self, table: &Table, row: RowRef) -> Result<Self::Output>;
}

/// External collaborator that writes a host object's fields into a row
/// (spec.md §6 "Saver contract").
pub trait Saver {
    type Input;

    /// Writes column cells and updates the id map, inserting or updating
    /// depending on whether `extract_id` yields a value.
    fn save(&self, table: &Table, object: &Self::Input) -> Result<StorageValue>;

    fn extract_id(&self, object: &Self::Input) -> Option<StorageValue>;

    fn set_id(&self, object: &mut Self::Input, id: StorageValue);

    fn resolve_relationship_id(&self, field_name: &str, related: &Self::Input) -> Option<StorageValue>;
}
