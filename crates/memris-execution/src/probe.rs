use memris_physical_plan::{CompiledCondition, CompositeShape};
use memris_primitives::{Error, Operator, Result};
use memris_sats::StorageValue;
use memris_table::{IndexHandle, IndexKey, RowIdSet};

fn index_key(value: &StorageValue) -> Result<IndexKey> {
    IndexKey::from_storage(value).ok_or_else(|| Error::invalid_query(format!("{value:?} has no index key representation")))
}

fn str_arg(value: &StorageValue) -> Result<&str> {
    value.as_str().ok_or_else(|| Error::invalid_query(format!("{value:?} is not a string")))
}

fn union_of(sets: impl IntoIterator<Item = RowIdSet>) -> RowIdSet {
    sets.into_iter().flat_map(|s| s.to_vec()).collect()
}

fn keys(values: &[StorageValue]) -> Result<Vec<IndexKey>> {
    values.iter().map(index_key).collect()
}

/// Probes a single-column index for one condition. `Ok(None)` means the
/// operator/index combination isn't servable here, and the caller should
/// fall back to the condition program (spec.md §4.8 step 2/4).
pub fn probe_single(handle: &IndexHandle, cond: &CompiledCondition, values: &[StorageValue]) -> Result<Option<RowIdSet>> {
    if !cond.operator.is_index_supported() {
        return Ok(None);
    }
    Ok(match handle {
        IndexHandle::Hash { index, .. } => match cond.operator {
            Operator::Eq => Some(index.eq(&index_key(&values[0])?)),
            Operator::In => Some(union_of(keys(values)?.iter().map(|k| index.eq(k)))),
            _ => None,
        },
        IndexHandle::Range { index, .. } => match cond.operator {
            Operator::Eq => Some(index.eq(&index_key(&values[0])?)),
            Operator::Gt => Some(index.gt(index_key(&values[0])?)),
            Operator::Ge => Some(index.ge(index_key(&values[0])?)),
            Operator::Lt => Some(index.lt(index_key(&values[0])?)),
            Operator::Le => Some(index.le(index_key(&values[0])?)),
            Operator::Between => Some(index.between(index_key(&values[0])?, index_key(&values[1])?)),
            Operator::In => Some(union_of(keys(values)?.iter().map(|k| index.eq(k)))),
            _ => None,
        },
        // `Eq` is deliberately not served here: a prefix bucket is a
        // start-of-string match, not an exact-length one, so a longer
        // string sharing the same prefix would leak into the result.
        IndexHandle::Prefix { index, .. } => match cond.operator {
            Operator::StartsWith => Some(index.starts_with(str_arg(&values[0])?)),
            _ => None,
        },
        IndexHandle::Suffix { index, .. } => match cond.operator {
            Operator::EndsWith => Some(index.ends_with(str_arg(&values[0])?)),
            _ => None,
        },
        IndexHandle::CompositeHash { .. } | IndexHandle::CompositeRange { .. } => None,
    })
}

/// Probes a composite index for the leading EQ prefix (and, for a range
/// index, a trailing `Ge`/`Le`/`Between` component) a [`CompositeShape`]
/// matched against a group (spec.md §4.7 "composite shapes").
pub fn probe_composite(
    handle: &IndexHandle,
    shape: &CompositeShape,
    conditions: &[CompiledCondition],
    resolved: &[Vec<StorageValue>],
) -> Result<RowIdSet> {
    match handle {
        IndexHandle::CompositeHash { index, .. } => {
            let key: Vec<IndexKey> = shape.consumed.iter().map(|&i| index_key(&resolved[i][0])).collect::<Result<_>>()?;
            Ok(index.eq(&key))
        }
        IndexHandle::CompositeRange { index, .. } => {
            let eq_len = if shape.trailing_range { shape.consumed.len() - 1 } else { shape.consumed.len() };
            let mut lo = Vec::with_capacity(shape.columns.len());
            let mut hi = Vec::with_capacity(shape.columns.len());
            for &i in &shape.consumed[..eq_len] {
                let k = index_key(&resolved[i][0])?;
                lo.push(k.clone());
                hi.push(k);
            }
            if shape.trailing_range {
                let trailing_idx = *shape.consumed.last().expect("trailing_range implies a non-empty consumed list");
                let trailing_values = &resolved[trailing_idx];
                match conditions[trailing_idx].operator {
                    Operator::Ge => {
                        lo.push(index_key(&trailing_values[0])?);
                        hi.push(IndexKey::MaxSentinel);
                    }
                    Operator::Le => {
                        lo.push(IndexKey::MinSentinel);
                        hi.push(index_key(&trailing_values[0])?);
                    }
                    Operator::Between => {
                        lo.push(index_key(&trailing_values[0])?);
                        hi.push(index_key(&trailing_values[1])?);
                    }
                    other => return Err(Error::invalid_query(format!("{other:?} cannot serve a composite trailing range"))),
                }
            }
            while lo.len() < shape.columns.len() {
                lo.push(IndexKey::MinSentinel);
                hi.push(IndexKey::MaxSentinel);
            }
            Ok(index.between(lo, hi))
        }
        IndexHandle::Hash { .. } | IndexHandle::Range { .. } | IndexHandle::Prefix { .. } | IndexHandle::Suffix { .. } => {
            Err(Error::invalid_query("composite shape matched against a non-composite index handle"))
        }
    }
}
