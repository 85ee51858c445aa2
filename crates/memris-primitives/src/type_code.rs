/// Wire-stable integer identifying the storage representation of a column
/// value (spec.md §6 "Type codes"). Used in compiled plans and column
/// metadata; the mapping between a host type and a `TypeCode` is defined by
/// the entity metadata descriptor, an external collaborator (spec.md §1).
///
/// The discriminants are part of the wire contract: never renumber an
/// existing variant, only append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeCode {
    Bool = 0,
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    F32 = 5,
    F64 = 6,
    Char = 7,
    String = 8,
    Instant = 9,
    LocalDate = 10,
    LocalDateTime = 11,
    Date = 12,
}

impl TypeCode {
    pub const ALL: [TypeCode; 13] = [
        TypeCode::Bool,
        TypeCode::I8,
        TypeCode::I16,
        TypeCode::I32,
        TypeCode::I64,
        TypeCode::F32,
        TypeCode::F64,
        TypeCode::Char,
        TypeCode::String,
        TypeCode::Instant,
        TypeCode::LocalDate,
        TypeCode::LocalDateTime,
        TypeCode::Date,
    ];

    /// Numeric, totally-ordered column types support `<`, `<=`, `>`, `>=`,
    /// `BETWEEN`, and ordered range indexes. Date/time types are numeric
    /// under the hood (epoch-encoded, spec.md §3) and so count as numeric.
    pub fn is_numeric(self) -> bool {
        !matches!(self, TypeCode::String | TypeCode::Char | TypeCode::Bool)
    }

    pub fn is_string_like(self) -> bool {
        matches!(self, TypeCode::String)
    }

    /// Whether this type's storage representation is a plain `i64` lane
    /// (after sortable encoding for floats, epoch encoding for date/time).
    pub fn is_int64_lane(self) -> bool {
        matches!(
            self,
            TypeCode::I8
                | TypeCode::I16
                | TypeCode::I32
                | TypeCode::I64
                | TypeCode::F32
                | TypeCode::F64
                | TypeCode::Char
                | TypeCode::Bool
                | TypeCode::Instant
                | TypeCode::LocalDate
                | TypeCode::LocalDateTime
                | TypeCode::Date
        )
    }
}
