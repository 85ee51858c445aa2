use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use thiserror::Error;

use crate::value::StorageValue;

/// Translates a single host-language value to and from its storage
/// representation (spec.md §6 "Converter registry"). `T` stands in for
/// whatever host type the field's declared Rust type is — Memris has no
/// runtime reflection over host types (entity-class annotation scanning is
/// an out-of-scope external collaborator per spec.md §1), so the registry
/// keys converters by [`TypeId`] instead of by a scanned class descriptor.
pub trait Converter<T>: Send + Sync {
    fn to_storage(&self, value: &T) -> StorageValue;
    /// `None` signals the stored value doesn't fit `T` (e.g. a `NULL` cell
    /// converted by a converter whose host type has no null representation
    /// other than `Option<T>`, which wraps this converter rather than
    /// implementing it).
    fn from_storage(&self, value: &StorageValue) -> Option<T>;
}

/// Converter for a host type that already *is* a storage scalar: the
/// primitive/string identity pass-through of spec.md §6.
pub struct IdentityConverter<T>(PhantomData<fn() -> T>);

impl<T> Default for IdentityConverter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

macro_rules! identity_converter {
    ($ty:ty, $variant:ident) => {
        impl Converter<$ty> for IdentityConverter<$ty> {
            fn to_storage(&self, value: &$ty) -> StorageValue {
                StorageValue::$variant(value.clone())
            }
            fn from_storage(&self, value: &StorageValue) -> Option<$ty> {
                match value {
                    StorageValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

identity_converter!(bool, Bool);
identity_converter!(i8, I8);
identity_converter!(i16, I16);
identity_converter!(i32, I32);
identity_converter!(i64, I64);
identity_converter!(f32, F32);
identity_converter!(f64, F64);
identity_converter!(char, Char);
identity_converter!(String, String);

/// `Option<T>`, the "boxed ↔ primitive" direction of spec.md §6: wraps an
/// inner converter and maps `StorageValue::Null`/absence to `None`.
pub struct OptionConverter<T> {
    inner: Arc<dyn Converter<T>>,
}

impl<T> OptionConverter<T> {
    pub fn new(inner: Arc<dyn Converter<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Converter<Option<T>> for OptionConverter<T> {
    fn to_storage(&self, value: &Option<T>) -> StorageValue {
        match value {
            Some(v) => self.inner.to_storage(v),
            None => StorageValue::Null,
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Option<Option<T>> {
        if value.is_null() {
            Some(None)
        } else {
            self.inner.from_storage(value).map(Some)
        }
    }
}

/// A converter driven by a pair of closures, used for the string-backed and
/// epoch-backed host types spec.md §6 names (UUID, big numeric,
/// `LocalDate`/`LocalDateTime`/`Instant`/`Date`, `LocalTime`, SQL
/// `Date`/`Timestamp`) without pulling in every possible host date/time
/// crate as a hard dependency of this crate.
pub struct FnConverter<T> {
    to: Box<dyn Fn(&T) -> StorageValue + Send + Sync>,
    from: Box<dyn Fn(&StorageValue) -> Option<T> + Send + Sync>,
}

impl<T> FnConverter<T> {
    pub fn new(
        to: impl Fn(&T) -> StorageValue + Send + Sync + 'static,
        from: impl Fn(&StorageValue) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            to: Box::new(to),
            from: Box::new(from),
        }
    }

    /// A string-backed converter: `to_string`/`FromStr`, the shape used for
    /// UUIDs, big-numeric types, and enum ↔ string (spec.md §6).
    pub fn string_backed<E>(
        to_string: impl Fn(&T) -> String + Send + Sync + 'static,
        from_str: impl Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
    {
        Self::new(
            move |v| StorageValue::String(to_string(v)),
            move |sv| sv.as_str().and_then(|s| from_str(s).ok()),
        )
    }

    /// A long-epoch-backed converter (`LocalDate`/`LocalDateTime`/`Instant`/
    /// `Date`, spec.md §3 and §6): the host value maps to a single `i64`,
    /// and the caller picks which `StorageValue` epoch variant wraps it.
    pub fn epoch_backed(
        to_epoch: impl Fn(&T) -> i64 + Send + Sync + 'static,
        wrap: impl Fn(i64) -> StorageValue + Send + Sync + 'static,
        from_epoch: impl Fn(i64) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            move |v| wrap(to_epoch(v)),
            move |sv| {
                let epoch = match sv {
                    StorageValue::LocalDate(e) | StorageValue::Date(e) => *e as i64,
                    StorageValue::Instant(e) | StorageValue::LocalDateTime(e) => *e,
                    _ => return None,
                };
                from_epoch(epoch)
            },
        )
    }
}

impl<T> Converter<T> for FnConverter<T> {
    fn to_storage(&self, value: &T) -> StorageValue {
        (self.to)(value)
    }
    fn from_storage(&self, value: &StorageValue) -> Option<T> {
        (self.from)(value)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a converter for this host type is already registered")]
    AlreadyRegistered,
}

/// Process-wide mapping of host type → converter (spec.md §6). Initialized
/// once by the host during wiring; after that it is read-only on the hot
/// query/materialization path (spec.md §5 "Shared-resource discipline").
/// Field-scoped overrides live in the per-entity metadata (spec.md §9
/// "Global state"), not here — `memris_schema::FieldDef::converter` holds
/// the per-field override, with this registry as the fallback.
#[derive(Default)]
pub struct ConverterRegistry {
    by_type: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in converters spec.md §6 lists as "recognized by
    /// the engine": identity pass-through for every primitive/`String`.
    /// Non-primitive string-backed/epoch-backed converters are host-type
    /// specific and so are left for the wiring step to register explicitly.
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        reg.register(IdentityConverter::<bool>::default()).unwrap();
        reg.register(IdentityConverter::<i8>::default()).unwrap();
        reg.register(IdentityConverter::<i16>::default()).unwrap();
        reg.register(IdentityConverter::<i32>::default()).unwrap();
        reg.register(IdentityConverter::<i64>::default()).unwrap();
        reg.register(IdentityConverter::<f32>::default()).unwrap();
        reg.register(IdentityConverter::<f64>::default()).unwrap();
        reg.register(IdentityConverter::<char>::default()).unwrap();
        reg.register(IdentityConverter::<String>::default()).unwrap();
        reg
    }

    pub fn register<T: 'static>(&self, converter: impl Converter<T> + 'static) -> Result<(), RegistryError> {
        let mut map = self.by_type.write();
        if map.contains_key(&TypeId::of::<T>()) {
            return Err(RegistryError::AlreadyRegistered);
        }
        map.insert(TypeId::of::<T>(), Arc::new(Box::new(converter) as Box<dyn Converter<T>>));
        Ok(())
    }

    /// Overwrites any existing converter for `T`. Used by hosts that want to
    /// replace a built-in with a custom one during wiring.
    pub fn replace<T: 'static>(&self, converter: impl Converter<T> + 'static) {
        let mut map = self.by_type.write();
        map.insert(TypeId::of::<T>(), Arc::new(Box::new(converter) as Box<dyn Converter<T>>));
    }

    pub fn get<T: 'static>(&self) -> Option<Arc<Box<dyn Converter<T>>>> {
        let map = self.by_type.read();
        map.get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.clone().downcast::<Box<dyn Converter<T>>>().ok())
    }
}

/// String-backed converter for `uuid::Uuid` (spec.md §6 "string-backed
/// (UUID, big numeric)").
pub fn uuid_converter() -> FnConverter<uuid::Uuid> {
    FnConverter::string_backed(uuid::Uuid::to_string, |s| uuid::Uuid::parse_str(s))
}

/// Long-epoch-backed converter for `chrono::NaiveDate` (spec.md §6
/// "long-epoch-backed (local-date, ...)"): epoch-day, matching the storage
/// representation of `StorageValue::LocalDate`.
pub fn local_date_converter() -> FnConverter<chrono::NaiveDate> {
    let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    FnConverter::epoch_backed(
        move |d: &chrono::NaiveDate| (*d - epoch).num_days(),
        |e| StorageValue::LocalDate(e as i32),
        move |e| epoch.checked_add_signed(chrono::Duration::days(e)),
    )
}

/// Long-epoch-backed converter for `chrono::NaiveDateTime`, stored as
/// epoch-milli UTC (spec.md §3).
pub fn local_date_time_converter() -> FnConverter<chrono::NaiveDateTime> {
    FnConverter::epoch_backed(
        |dt: &chrono::NaiveDateTime| dt.and_utc().timestamp_millis(),
        StorageValue::LocalDateTime,
        |e| chrono::DateTime::<chrono::Utc>::from_timestamp_millis(e).map(|dt| dt.naive_utc()),
    )
}

/// Long-epoch-backed converter for `chrono::DateTime<chrono::Utc>`, stored
/// as epoch-milli UTC (an `Instant`, spec.md §3).
pub fn instant_converter() -> FnConverter<chrono::DateTime<chrono::Utc>> {
    FnConverter::epoch_backed(
        |dt: &chrono::DateTime<chrono::Utc>| dt.timestamp_millis(),
        StorageValue::Instant,
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis,
    )
}

/// Enum ↔ string converter (spec.md §6). `to_str`/`from_str` should be the
/// enum's own naming, not a derived `Debug` impl, so renames don't silently
/// change stored data.
pub fn enum_converter<T: 'static>(
    to_str: impl Fn(&T) -> String + Send + Sync + 'static,
    from_str: impl Fn(&str) -> Option<T> + Send + Sync + 'static,
) -> FnConverter<T> {
    FnConverter::string_backed(to_str, move |s| from_str(s).ok_or(()))
}
