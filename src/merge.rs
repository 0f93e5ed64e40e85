//! Result Merger: fold normalized statistic results into the canonical
//! column -> statistic -> value mapping.

use std::collections::HashMap;

use serde_json::Value;

use crate::stats::StatKind;

/// Canonical aggregation result: `column -> statistic key -> value`.
///
/// Column ordering is not guaranteed; callers rely only on per-column
/// statistic presence and values. A column excluded from every requested
/// statistic is simply absent.
pub type ColumnStats = HashMap<String, HashMap<String, Value>>;

/// Fold `(kind, per-column values)` pairs, in submission order, into the
/// canonical nested map. Later pairs for the same `(column, key)` overwrite
/// earlier ones, matching the builder's last-write-wins rule.
pub fn merge(pairs: Vec<(StatKind, Vec<(String, Value)>)>) -> ColumnStats {
    let mut result: ColumnStats = HashMap::new();
    for (kind, values) in pairs {
        for (column, value) in values {
            result
                .entry(column)
                .or_default()
                .insert(kind.key().to_string(), value);
        }
    }
    result
}

/// Collapse a single-column, single-statistic result to its bare value.
///
/// Mirrors the tidy output convenience statistics callers expect: asking for
/// one number gets one number back; anything larger is returned as the nested
/// map, serialized.
pub fn tidy(result: ColumnStats) -> Value {
    if result.len() == 1 {
        let stats = result.values().next().unwrap();
        if stats.len() == 1 {
            return stats.values().next().unwrap().clone();
        }
    }
    serde_json::to_value(result).unwrap_or(Value::Null)
}
