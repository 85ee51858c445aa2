use super::*;

#[test]
fn index_supported_operators_exclude_negations() {
    for op in [Operator::Ne, Operator::NotLike, Operator::NotContains, Operator::NotIn] {
        assert!(!op.is_index_supported(), "{op:?} must never be index-supported");
    }
}

#[test]
fn error_display_includes_method_when_present() {
    let err = Error::invalid_query("unknown property path 'bogus'").with_method("findByBogus");
    let rendered = err.to_string();
    assert!(rendered.contains("invalid-query"));
    assert!(rendered.contains("findByBogus"));
}

#[test]
fn type_code_numeric_classification() {
    assert!(TypeCode::I32.is_numeric());
    assert!(TypeCode::LocalDate.is_numeric());
    assert!(!TypeCode::String.is_numeric());
    assert!(!TypeCode::Bool.is_numeric());
}
