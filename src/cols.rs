//! Column statistics facade: per-statistic convenience methods over any
//! backend, each composing build-then-run.

use crate::columns::ColumnsSpec;
use crate::engine::AggBackend;
use crate::error::AggError;
use crate::executor;
use crate::merge::ColumnStats;
use crate::stats::{StatArgs, StatKind};

/// Column-wise statistics over a borrowed backend.
pub struct Cols<'a, B: AggBackend> {
    backend: &'a B,
}

impl<'a, B: AggBackend> Cols<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Cols { backend }
    }

    /// Compute several statistics at once over a column selection.
    pub fn agg(
        &self,
        columns: impl Into<ColumnsSpec>,
        kinds: &[StatKind],
        args: &StatArgs,
    ) -> Result<ColumnStats, AggError> {
        executor::agg_exprs(self.backend, &columns.into(), kinds, args)
    }

    fn one(&self, columns: impl Into<ColumnsSpec>, kind: StatKind) -> Result<ColumnStats, AggError> {
        self.agg(columns, &[kind], &StatArgs::None)
    }

    pub fn min(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Min)
    }

    pub fn max(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Max)
    }

    /// Min-to-max range per column.
    pub fn range(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Range)
    }

    pub fn mean(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Mean)
    }

    /// Sample standard deviation.
    pub fn std(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Stddev)
    }

    /// Sample variance.
    pub fn var(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Variance)
    }

    pub fn sum(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Sum)
    }

    pub fn skewness(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Skewness)
    }

    pub fn kurtosis(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Kurtosis)
    }

    pub fn mode(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::Mode)
    }

    /// Null count per column.
    pub fn count_na(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::CountNa)
    }

    /// Zero-value count per column.
    pub fn count_zeros(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::CountZeros)
    }

    /// Distinct-value count per column.
    pub fn count_uniques(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.one(columns, StatKind::CountUniques)
    }

    /// Percentile values per column, keyed by stringified fraction.
    pub fn percentile(
        &self,
        columns: impl Into<ColumnsSpec>,
        fractions: &[f64],
    ) -> Result<ColumnStats, AggError> {
        self.agg(
            columns,
            &[StatKind::Percentile],
            &StatArgs::Percentile {
                fractions: fractions.to_vec(),
            },
        )
    }

    /// Median per column (percentile 0.5).
    pub fn median(&self, columns: impl Into<ColumnsSpec>) -> Result<ColumnStats, AggError> {
        self.percentile(columns, &[0.5])
    }

    /// Equal-width histogram per column.
    pub fn hist(
        &self,
        columns: impl Into<ColumnsSpec>,
        buckets: usize,
    ) -> Result<ColumnStats, AggError> {
        self.agg(
            columns,
            &[StatKind::Histogram],
            &StatArgs::Histogram { buckets },
        )
    }
}
