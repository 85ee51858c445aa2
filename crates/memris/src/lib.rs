//! The repository facade (spec.md §2 "Repository facade, arena, converter
//! registry"): binds entity metadata, a live table, and a compiled-dispatch
//! cache into the interpreter a generated repository implementation drives
//! per call.

mod cache;
mod registry;
mod repository;

pub use cache::PlanCache;
pub use registry::register_converter;
pub use repository::Repository;

pub use memris_execution::{ExecutionOutcome, IndexCatalog};
pub use memris_primitives::{ColumnPosition, Error, ErrorKind, IndexId, Result, TableId, TypeCode};
pub use memris_query::{MethodSource, ParamShape, ReturnArity, ReturnHint};
pub use memris_sats::{
    enum_converter, instant_converter, local_date_converter, local_date_time_converter, uuid_converter, Converter,
    ConverterRegistry, FnConverter, IdentityConverter, OptionConverter, StorageValue,
};
pub use memris_schema::{Cardinality, EntityDef, FieldDef, IndexDef, IndexKind, JoinTableDescriptor, Materializer, RelationshipDescriptor, Saver};
pub use memris_table::{Arena, ArenaOptions, PageOptions, RowIdSetOptions, SeqlockOptions, Table};

#[cfg(test)]
mod tests;
