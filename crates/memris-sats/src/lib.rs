//! The storage-side value representation ("Storage Algebraic Type System"):
//! a tagged union covering every [`TypeCode`](memris_primitives::TypeCode),
//! the sortable integer encodings used by ordered columns and range
//! indexes, and the converter registry that translates host values to and
//! from this representation (spec.md §6 "Converter registry").

mod convert;
mod sortable;
mod value;

pub use convert::{
    enum_converter, instant_converter, local_date_converter, local_date_time_converter, uuid_converter, Converter,
    ConverterRegistry, FnConverter, IdentityConverter, OptionConverter, RegistryError,
};
pub use sortable::{f32_to_sortable, f64_to_sortable, sortable_to_f32, sortable_to_f64};
pub use value::StorageValue;

#[cfg(test)]
mod tests;
