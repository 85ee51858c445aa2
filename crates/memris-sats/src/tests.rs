use std::sync::Arc;

use super::*;

#[test]
fn sortable_f64_preserves_order() {
    let values = [-1.5f64, -0.0, 0.0, 0.1, 1.0, 1e300, f64::MIN, f64::MAX];
    let mut sorted = values;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut by_sortable = values;
    by_sortable.sort_by_key(|v| f64_to_sortable(*v));
    assert_eq!(sorted, by_sortable);
}

#[test]
fn sortable_f64_round_trips() {
    for v in [-1.5f64, 0.0, 42.25, f64::MIN, f64::MAX] {
        assert_eq!(sortable_to_f64(f64_to_sortable(v)), v);
    }
}

#[test]
fn sortable_f32_round_trips() {
    for v in [-1.5f32, 0.0, 42.25, f32::MIN, f32::MAX] {
        assert_eq!(sortable_to_f32(f32_to_sortable(v)), v);
    }
}

#[test]
fn identity_converter_round_trips() {
    let conv = IdentityConverter::<i32>::default();
    let stored = conv.to_storage(&7);
    assert_eq!(conv.from_storage(&stored), Some(7));
}

#[test]
fn option_converter_maps_null_to_none() {
    let conv = OptionConverter::new(Arc::new(IdentityConverter::<i32>::default()) as Arc<dyn Converter<i32>>);
    assert_eq!(conv.from_storage(&StorageValue::Null), Some(None));
    assert_eq!(conv.to_storage(&None), StorageValue::Null);
    assert_eq!(conv.to_storage(&Some(3)), StorageValue::I32(3));
}

#[test]
fn uuid_converter_round_trips() {
    let conv = uuid_converter();
    let id = uuid::Uuid::new_v4();
    let stored = conv.to_storage(&id);
    assert_eq!(conv.from_storage(&stored), Some(id));
}

#[test]
fn local_date_converter_round_trips() {
    let conv = local_date_converter();
    let d = chrono::NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
    let stored = conv.to_storage(&d);
    assert_eq!(stored, StorageValue::LocalDate((d - chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32));
    assert_eq!(conv.from_storage(&stored), Some(d));
}

#[test]
fn registry_rejects_duplicate_registration() {
    let reg = ConverterRegistry::new();
    reg.register(IdentityConverter::<i32>::default()).unwrap();
    assert!(reg.register(IdentityConverter::<i32>::default()).is_err());
}

#[test]
fn registry_with_builtins_resolves_primitives() {
    let reg = ConverterRegistry::with_builtins();
    let conv = reg.get::<i64>().expect("i64 converter registered");
    assert_eq!(conv.from_storage(&StorageValue::I64(9)), Some(9));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // spec.md §8's converter round-trip law: from_storage(to_storage(v)) == v.
        #[test]
        fn identity_i32_round_trips_for_any_value(v: i32) {
            let conv = IdentityConverter::<i32>::default();
            prop_assert_eq!(conv.from_storage(&conv.to_storage(&v)), Some(v));
        }

        #[test]
        fn identity_string_round_trips_for_any_value(v: String) {
            let conv = IdentityConverter::<String>::default();
            prop_assert_eq!(conv.from_storage(&conv.to_storage(&v)), Some(v));
        }

        #[test]
        fn sortable_f64_round_trips_for_any_finite_value(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            prop_assert_eq!(sortable_to_f64(f64_to_sortable(v)), v);
        }

        #[test]
        fn local_date_converter_round_trips_for_any_epoch_day(days in -700_000i32..700_000i32) {
            let conv = local_date_converter();
            let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let d = epoch.checked_add_signed(chrono::Duration::days(days as i64)).unwrap();
            let stored = conv.to_storage(&d);
            prop_assert_eq!(conv.from_storage(&stored), Some(d));
        }

        #[test]
        fn option_converter_round_trips_some_and_none(v: Option<i32>) {
            let conv = OptionConverter::new(Arc::new(IdentityConverter::<i32>::default()) as Arc<dyn Converter<i32>>);
            prop_assert_eq!(conv.from_storage(&conv.to_storage(&v)), Some(v));
        }
    }
}
