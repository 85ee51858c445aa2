use memris_physical_plan::{CompiledArgRef, CompiledArgs};
use memris_primitives::{Error, Result};
use memris_sats::StorageValue;

/// Resolves one bound argument against the method's argument array (spec.md
/// §4.7 "Each parameter slot receives the parameter index into the method's
/// argument array"). An out-of-range slot is a runtime argument failure
/// (spec.md §4.8 "Failure semantics").
pub fn resolve_arg(arg: &CompiledArgRef, params: &[StorageValue]) -> Result<StorageValue> {
    match arg {
        CompiledArgRef::Literal(v) => Ok(v.clone()),
        CompiledArgRef::Param(slot) => params
            .get(slot.0 as usize)
            .cloned()
            .ok_or_else(|| Error::argument(format!("argument slot {} is out of range ({} argument(s) given)", slot.0, params.len()))),
    }
}

/// Flattens a condition's argument shape into the positional `Vec` the
/// column-level `scan_op`/index probes expect (`Eq`/`Gt`/... take one,
/// `Between` two, `In` a variable list, null checks none).
pub fn resolve_args(args: &CompiledArgs, params: &[StorageValue]) -> Result<Vec<StorageValue>> {
    match args {
        CompiledArgs::None => Ok(Vec::new()),
        CompiledArgs::One(a) => Ok(vec![resolve_arg(a, params)?]),
        CompiledArgs::Two(a, b) => Ok(vec![resolve_arg(a, params)?, resolve_arg(b, params)?]),
        CompiledArgs::Many(items) => items.iter().map(|a| resolve_arg(a, params)).collect(),
    }
}
