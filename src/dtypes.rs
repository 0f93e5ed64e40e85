//! Dtype categories and the engine-supplied statistic exclusion table.

use std::collections::{HashMap, HashSet};

use crate::stats::StatKind;

/// Coarse dtype category used by the exclusion filter.
///
/// Backends map their native dtypes onto these categories; the builder never
/// inspects engine dtypes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtypeCategory {
    Numeric,
    /// Strings and other object-like columns.
    Object,
    Date,
    Timestamp,
    Boolean,
    Array,
    Binary,
    Null,
    Other,
}

/// Per-dtype set of statistics that must be skipped.
///
/// Engines disagree on which statistics are safe for which dtypes (stddev on
/// strings, percentiles on timestamps, ...), so the table is configuration
/// supplied by the backend, not a global constant. A (column, statistic) pair
/// whose dtype category appears here with that statistic is silently dropped
/// by the builder.
#[derive(Debug, Clone, Default)]
pub struct ExclusionTable {
    entries: HashMap<DtypeCategory, HashSet<StatKind>>,
}

impl ExclusionTable {
    /// Empty table: nothing excluded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kinds` as excluded for `dtype`, merging with prior entries.
    pub fn exclude(mut self, dtype: DtypeCategory, kinds: impl IntoIterator<Item = StatKind>) -> Self {
        self.entries.entry(dtype).or_default().extend(kinds);
        self
    }

    /// Whether `kind` must be skipped for a column of category `dtype`.
    pub fn is_excluded(&self, kind: StatKind, dtype: DtypeCategory) -> bool {
        self.entries
            .get(&dtype)
            .is_some_and(|kinds| kinds.contains(&kind))
    }
}
