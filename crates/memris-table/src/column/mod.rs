mod int32;
mod int64;
mod store;
mod string_col;

pub use int32::Int32Column;
pub use int64::Int64Column;
pub use string_col::StringColumn;

use memris_primitives::{Operator, TypeCode};
use memris_sats::StorageValue;

use crate::rowid::RowId;

/// A table column, dispatching to whichever of the three families (spec.md
/// §3) its `TypeCode` maps onto.
pub enum ColumnHandle {
    Int32(Int32Column),
    Int64(Int64Column),
    String(StringColumn),
}

impl ColumnHandle {
    pub fn new(type_code: TypeCode, page_capacity: usize) -> Self {
        match type_code {
            TypeCode::String => ColumnHandle::String(StringColumn::new(page_capacity)),
            tc if matches!(tc, TypeCode::I64 | TypeCode::F64 | TypeCode::Instant | TypeCode::LocalDateTime) => {
                ColumnHandle::Int64(Int64Column::new(tc, page_capacity))
            }
            tc => ColumnHandle::Int32(Int32Column::new(tc, page_capacity)),
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            ColumnHandle::Int32(c) => c.type_code(),
            ColumnHandle::Int64(c) => c.type_code(),
            ColumnHandle::String(_) => TypeCode::String,
        }
    }

    pub fn published(&self) -> u64 {
        match self {
            ColumnHandle::Int32(c) => c.published(),
            ColumnHandle::Int64(c) => c.published(),
            ColumnHandle::String(c) => c.published(),
        }
    }

    pub fn put(&self, global_offset: u64, value: &StorageValue) {
        match (self, value) {
            (ColumnHandle::Int32(c), _) if value.is_null() => c.put_null(global_offset),
            (ColumnHandle::Int64(c), _) if value.is_null() => c.put_null(global_offset),
            (ColumnHandle::String(c), _) if value.is_null() => c.put_null(global_offset),
            (ColumnHandle::Int32(c), v) => c.put(global_offset, v.as_sortable_i64().expect("non-null") as i32),
            (ColumnHandle::Int64(c), v) => c.put(global_offset, v.as_sortable_i64().expect("non-null")),
            (ColumnHandle::String(c), StorageValue::String(s)) => c.put(global_offset, s.clone()),
            (ColumnHandle::String(_), _) => panic!("type mismatch writing a non-string value into a string column"),
        }
    }

    pub fn get(&self, global_offset: u64, type_code: TypeCode) -> Option<StorageValue> {
        match self {
            ColumnHandle::Int32(c) => c.get(global_offset).map(|v| wrap_int32(type_code, v)),
            ColumnHandle::Int64(c) => c.get(global_offset).map(|v| wrap_int64(type_code, v)),
            ColumnHandle::String(c) => c.get(global_offset).map(StorageValue::String),
        }
    }

    pub fn scan_all(&self) -> Vec<RowId> {
        match self {
            ColumnHandle::Int32(c) => c.scan_all(),
            ColumnHandle::Int64(c) => c.scan_all(),
            ColumnHandle::String(c) => c.scan_all(),
        }
    }

    pub fn scan_null(&self, limit: Option<usize>) -> Vec<RowId> {
        match self {
            ColumnHandle::Int32(c) => c.scan_null(limit),
            ColumnHandle::Int64(c) => c.scan_null(limit),
            ColumnHandle::String(c) => c.scan_null(limit),
        }
    }

    pub fn scan_not_null(&self, limit: Option<usize>) -> Vec<RowId> {
        match self {
            ColumnHandle::Int32(c) => c.scan_not_null(limit),
            ColumnHandle::Int64(c) => c.scan_not_null(limit),
            ColumnHandle::String(c) => c.scan_not_null(limit),
        }
    }

    /// Dispatches `op` against a single bound literal, used by the
    /// executor's condition-program fallback (spec.md §4.8) when no index
    /// served the condition. `case_ignore` only affects `Eq` on a string
    /// column (spec.md §4.1 "scan_equals_ignore_case").
    pub fn scan_op(&self, op: Operator, args: &[StorageValue], case_ignore: bool, limit: Option<usize>) -> Vec<RowId> {
        match op {
            Operator::IsNull => return self.scan_null(limit),
            Operator::IsNotNull => return self.scan_not_null(limit),
            _ => {}
        }
        match self {
            ColumnHandle::String(c) => scan_string_op(c, op, args, case_ignore, limit),
            ColumnHandle::Int32(c) => scan_int32_op(c, op, args, limit),
            ColumnHandle::Int64(c) => scan_int64_op(c, op, args, limit),
        }
    }
}

fn wrap_int32(tc: TypeCode, v: i32) -> StorageValue {
    match tc {
        TypeCode::I8 => StorageValue::I8(v as i8),
        TypeCode::I16 => StorageValue::I16(v as i16),
        TypeCode::I32 => StorageValue::I32(v),
        TypeCode::Bool => StorageValue::Bool(v != 0),
        TypeCode::Char => StorageValue::Char(char::from_u32(v as u32).unwrap_or('\u{FFFD}')),
        TypeCode::F32 => StorageValue::F32(memris_sats::sortable_to_f32(v)),
        TypeCode::LocalDate => StorageValue::LocalDate(v),
        TypeCode::Date => StorageValue::Date(v),
        _ => unreachable!("{tc:?} is not an int32-lane type"),
    }
}

fn wrap_int64(tc: TypeCode, v: i64) -> StorageValue {
    match tc {
        TypeCode::I64 => StorageValue::I64(v),
        TypeCode::F64 => StorageValue::F64(memris_sats::sortable_to_f64(v)),
        TypeCode::Instant => StorageValue::Instant(v),
        TypeCode::LocalDateTime => StorageValue::LocalDateTime(v),
        _ => unreachable!("{tc:?} is not an int64-lane type"),
    }
}

fn scan_int32_op(c: &Int32Column, op: Operator, args: &[StorageValue], limit: Option<usize>) -> Vec<RowId> {
    let arg = |i: usize| args[i].as_sortable_i64().expect("argument type matches column") as i32;
    match op {
        Operator::Eq => c.scan_equals(arg(0), limit),
        Operator::Ne => c.scan_not_equals(arg(0), limit),
        Operator::Gt => c.scan_gt(arg(0), limit),
        Operator::Ge => c.scan_ge(arg(0), limit),
        Operator::Lt => c.scan_lt(arg(0), limit),
        Operator::Le => c.scan_le(arg(0), limit),
        Operator::Between => c.scan_between(arg(0), arg(1), limit),
        Operator::In => {
            let vals: Vec<i32> = args.iter().map(|v| v.as_sortable_i64().expect("IN argument type matches column") as i32).collect();
            c.scan_in(&vals, limit)
        }
        other => panic!("{other:?} is not supported on an int32 column"),
    }
}

fn scan_int64_op(c: &Int64Column, op: Operator, args: &[StorageValue], limit: Option<usize>) -> Vec<RowId> {
    let arg = |i: usize| args[i].as_sortable_i64().expect("argument type matches column");
    match op {
        Operator::Eq => c.scan_equals(arg(0), limit),
        Operator::Ne => c.scan_not_equals(arg(0), limit),
        Operator::Gt => c.scan_gt(arg(0), limit),
        Operator::Ge => c.scan_ge(arg(0), limit),
        Operator::Lt => c.scan_lt(arg(0), limit),
        Operator::Le => c.scan_le(arg(0), limit),
        Operator::Between => c.scan_between(arg(0), arg(1), limit),
        Operator::In => {
            let vals: Vec<i64> = args.iter().map(|v| v.as_sortable_i64().expect("IN argument type matches column")).collect();
            c.scan_in(&vals, limit)
        }
        other => panic!("{other:?} is not supported on an int64 column"),
    }
}

fn scan_string_op(c: &StringColumn, op: Operator, args: &[StorageValue], case_ignore: bool, limit: Option<usize>) -> Vec<RowId> {
    let arg = |i: usize| args[i].as_str().expect("argument type matches column");
    match op {
        Operator::Eq if case_ignore => c.scan_equals_ignore_case(arg(0), limit),
        Operator::Eq => c.scan_equals(arg(0), limit),
        Operator::Ne => c.scan_not_equals(arg(0), limit),
        Operator::Gt => c.scan_gt(arg(0), limit),
        Operator::Ge => c.scan_ge(arg(0), limit),
        Operator::Lt => c.scan_lt(arg(0), limit),
        Operator::Le => c.scan_le(arg(0), limit),
        Operator::Between => c.scan_between(arg(0), arg(1), limit),
        Operator::StartsWith => c.scan_starts_with(arg(0), limit),
        Operator::EndsWith => c.scan_ends_with(arg(0), limit),
        Operator::Contains => c.scan_contains(arg(0), limit),
        Operator::NotContains => c.scan_not_contains(arg(0), limit),
        Operator::Like => c.scan_contains(arg(0).trim_matches('%'), limit),
        Operator::NotLike => c.scan_not_contains(arg(0).trim_matches('%'), limit),
        Operator::In => {
            let vals: Vec<String> = args.iter().map(|v| v.as_str().expect("IN argument type matches column").to_string()).collect();
            c.scan_in(&vals, limit)
        }
        other => panic!("{other:?} is not supported on a string column"),
    }
}
