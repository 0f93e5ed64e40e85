//! Result Shape Normalizer: per-statistic reshaping of raw backend output
//! into canonical values.

use serde_json::{json, Value};

use crate::engine::{RawEntry, RawShape, RawValue};
use crate::error::AggError;
use crate::stats::{ResultShape, StatKind};

/// Stringify a percentile fraction for use as a canonical map key.
///
/// Floats are unsuitable as map keys across serialization boundaries, so
/// `0.5` becomes `"0.5"` exactly.
pub fn fraction_key(fraction: f64) -> String {
    format!("{fraction}")
}

/// Normalize one raw entry into ordered `(column, value)` pairs.
pub fn normalize_entry(entry: RawEntry) -> Result<(StatKind, Vec<(String, Value)>), AggError> {
    let kind = entry.kind;
    let per_column = match entry.shape {
        RawShape::PerColumn(values) => values,
        RawShape::Single(column, value) => vec![(column, value)],
    };
    let mut normalized = Vec::with_capacity(per_column.len());
    for (column, raw) in per_column {
        normalized.push((column, normalize_value(kind, raw)?));
    }
    Ok((kind, normalized))
}

fn normalize_value(kind: StatKind, raw: RawValue) -> Result<Value, AggError> {
    match (kind.shape(), raw) {
        (ResultShape::Scalar, RawValue::Scalar(value)) => Ok(value),
        (ResultShape::PercentileMap, RawValue::Percentiles(pairs)) => {
            let mut map = serde_json::Map::new();
            for (fraction, value) in pairs {
                map.insert(fraction_key(fraction), value);
            }
            Ok(Value::Object(map))
        }
        (ResultShape::HistogramBuckets, RawValue::Histogram { counts, bins }) => {
            parse_hist(kind, &counts, &bins)
        }
        (ResultShape::CountScalar, RawValue::Count(value)) => coerce_count(kind, value),
        // Also accept pre-coerced counts from backends that cast eagerly.
        (ResultShape::CountScalar, RawValue::Scalar(value)) => coerce_count(kind, value),
        (shape, raw) => Err(AggError::Internal(format!(
            "backend returned {raw:?} for statistic {kind} (expected {shape:?})"
        ))),
    }
}

/// Pair consecutive bin edges into `{lower, upper, count}` buckets.
///
/// The last edge is only ever an upper bound: `bins.len()` must equal
/// `counts.len() + 1`, giving exactly `counts.len()` buckets.
fn parse_hist(kind: StatKind, counts: &[u64], bins: &[f64]) -> Result<Value, AggError> {
    if bins.len() != counts.len() + 1 {
        return Err(AggError::Internal(format!(
            "statistic {kind}: {} bin edges for {} counts",
            bins.len(),
            counts.len()
        )));
    }
    let buckets: Vec<Value> = counts
        .iter()
        .zip(bins.windows(2))
        .map(|(count, edge)| json!({ "lower": edge[0], "upper": edge[1], "count": count }))
        .collect();
    Ok(Value::Array(buckets))
}

/// Coerce a backend-native count wrapper to a plain integer.
///
/// Some engines return count results as floats or string-wrapped scalars that
/// only become numeric after materialization.
fn coerce_count(kind: StatKind, value: Value) -> Result<Value, AggError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::from(f as i64))
            } else {
                Err(AggError::Internal(format!(
                    "statistic {kind}: count value {n} is not numeric"
                )))
            }
        }
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| AggError::Internal(format!("statistic {kind}: count value {s:?} is not numeric"))),
        other => Err(AggError::Internal(format!(
            "statistic {kind}: count value {other:?} is not numeric"
        ))),
    }
}
