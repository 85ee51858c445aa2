use memris_sats::{Converter, ConverterRegistry};

/// Registers a custom host-type converter, the one place in the facade
/// that returns `anyhow::Result` instead of `memris_primitives::Result`
/// (spec.md §9/§11): this runs once at repository-build time, alongside
/// the rest of a host's fallible setup, not on the hot query path.
pub fn register_converter<T: 'static>(registry: &ConverterRegistry, converter: impl Converter<T> + 'static) -> anyhow::Result<()> {
    registry.register(converter).map_err(anyhow::Error::from)
}
