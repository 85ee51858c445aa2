use memris_primitives::TypeCode;

use crate::sortable::{f32_to_sortable, f64_to_sortable};

/// A single cell's worth of data in the storage representation (spec.md §3
/// "Column", §6 "Type codes"). `Null` is a first-class variant rather than
/// an `Option<StorageValue>` wrapper because presence is tracked separately
/// by each column's presence bit (spec.md §4.1) — a `StorageValue::Null`
/// only ever appears as a literal bound into a compiled plan (e.g. `IS
/// NULL`'s absent argument), never as a stored cell.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    /// Epoch-milli UTC (spec.md §3 "Date/time types are stored as
    /// epoch-based integers").
    Instant(i64),
    /// Epoch-day.
    LocalDate(i32),
    /// Epoch-milli UTC.
    LocalDateTime(i64),
    /// Epoch-day (a SQL `DATE`, distinct type code from `LocalDate` at the
    /// wire level even though both are epoch-day under the hood, per
    /// spec.md §6's distinct `date` type code).
    Date(i32),
    Null,
}

impl StorageValue {
    pub fn type_code(&self) -> Option<TypeCode> {
        Some(match self {
            StorageValue::Bool(_) => TypeCode::Bool,
            StorageValue::I8(_) => TypeCode::I8,
            StorageValue::I16(_) => TypeCode::I16,
            StorageValue::I32(_) => TypeCode::I32,
            StorageValue::I64(_) => TypeCode::I64,
            StorageValue::F32(_) => TypeCode::F32,
            StorageValue::F64(_) => TypeCode::F64,
            StorageValue::Char(_) => TypeCode::Char,
            StorageValue::String(_) => TypeCode::String,
            StorageValue::Instant(_) => TypeCode::Instant,
            StorageValue::LocalDate(_) => TypeCode::LocalDate,
            StorageValue::LocalDateTime(_) => TypeCode::LocalDateTime,
            StorageValue::Date(_) => TypeCode::Date,
            StorageValue::Null => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StorageValue::Null)
    }

    /// Projects any numeric/date-time variant onto a single `i64` lane
    /// using the sortable encodings (spec.md §4.1), so that a generic
    /// ordered-index or `scan_between` implementation can compare
    /// heterogeneous-looking but same-`TypeCode` cells with plain integer
    /// comparison. Returns `None` for `String`/`Null`.
    pub fn as_sortable_i64(&self) -> Option<i64> {
        Some(match *self {
            StorageValue::Bool(b) => b as i64,
            StorageValue::I8(v) => v as i64,
            StorageValue::I16(v) => v as i64,
            StorageValue::I32(v) => v as i64,
            StorageValue::I64(v) => v,
            StorageValue::F32(v) => f32_to_sortable(v) as i64,
            StorageValue::F64(v) => f64_to_sortable(v),
            StorageValue::Char(c) => c as i64,
            StorageValue::Instant(v) => v,
            StorageValue::LocalDate(v) => v as i64,
            StorageValue::LocalDateTime(v) => v,
            StorageValue::Date(v) => v as i64,
            StorageValue::String(_) | StorageValue::Null => return None,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StorageValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl PartialOrd for StorageValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (StorageValue::String(a), StorageValue::String(b)) => a.partial_cmp(b),
            _ => match (self.as_sortable_i64(), other.as_sortable_i64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}
