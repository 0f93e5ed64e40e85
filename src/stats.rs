//! Statistic kinds, their canonical output keys, and per-call arguments.

use std::fmt;

/// Default percentile fractions used when a percentile request carries no
/// explicit targets.
pub const DEFAULT_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Default bucket count for histogram requests.
pub const DEFAULT_BUCKETS: usize = 20;

/// One kind of column aggregate.
///
/// Each kind has a canonical string key under which its value appears in the
/// merged result, and a [`ResultShape`] describing what its raw backend output
/// looks like before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Min,
    Max,
    Range,
    Stddev,
    Mean,
    Variance,
    Skewness,
    Kurtosis,
    Sum,
    Percentile,
    Histogram,
    CountUniques,
    CountNa,
    CountZeros,
    Mode,
}

/// How a statistic's raw backend output must be reshaped before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Raw per-column value is already canonical.
    Scalar,
    /// Percentile-fraction -> value map; keys are stringified on output.
    PercentileMap,
    /// Parallel `count`/`bins` arrays paired into bucket objects.
    HistogramBuckets,
    /// Backend-native count wrapper coerced to a machine integer.
    CountScalar,
}

impl StatKind {
    /// All kinds, in declaration order.
    pub const ALL: [StatKind; 15] = [
        StatKind::Min,
        StatKind::Max,
        StatKind::Range,
        StatKind::Stddev,
        StatKind::Mean,
        StatKind::Variance,
        StatKind::Skewness,
        StatKind::Kurtosis,
        StatKind::Sum,
        StatKind::Percentile,
        StatKind::Histogram,
        StatKind::CountUniques,
        StatKind::CountNa,
        StatKind::CountZeros,
        StatKind::Mode,
    ];

    /// Canonical key under which this statistic appears in results.
    pub fn key(self) -> &'static str {
        match self {
            StatKind::Min => "min",
            StatKind::Max => "max",
            StatKind::Range => "range",
            StatKind::Stddev => "stddev",
            StatKind::Mean => "mean",
            StatKind::Variance => "variance",
            StatKind::Skewness => "skewness",
            StatKind::Kurtosis => "kurtosis",
            StatKind::Sum => "sum",
            StatKind::Percentile => "percentile",
            StatKind::Histogram => "hist",
            StatKind::CountUniques => "count_uniques",
            StatKind::CountNa => "count_na",
            StatKind::CountZeros => "zeros",
            StatKind::Mode => "mode",
        }
    }

    /// Raw result shape produced by backends for this kind.
    pub fn shape(self) -> ResultShape {
        match self {
            StatKind::Percentile => ResultShape::PercentileMap,
            StatKind::Histogram => ResultShape::HistogramBuckets,
            StatKind::CountUniques => ResultShape::CountScalar,
            _ => ResultShape::Scalar,
        }
    }

    /// Whether the backend can batch this statistic over several columns in
    /// one expression. Engines evaluate these in a single pass, so the
    /// builder emits one expression covering every allowed column.
    pub fn is_multi_column(self) -> bool {
        matches!(
            self,
            StatKind::Min
                | StatKind::Max
                | StatKind::Stddev
                | StatKind::Mean
                | StatKind::Variance
                | StatKind::Percentile
        )
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Extra arguments shared by every statistic in one aggregation call.
///
/// Kinds that take no arguments ignore this. Percentile and histogram
/// requests read their targets from the matching variant and fall back to
/// [`DEFAULT_FRACTIONS`] / [`DEFAULT_BUCKETS`] otherwise.
#[derive(Debug, Clone, Default)]
pub enum StatArgs {
    #[default]
    None,
    Percentile {
        fractions: Vec<f64>,
    },
    Histogram {
        buckets: usize,
    },
}

impl StatArgs {
    /// Percentile targets for this call.
    pub fn fractions(&self) -> Vec<f64> {
        match self {
            StatArgs::Percentile { fractions } if !fractions.is_empty() => fractions.clone(),
            _ => DEFAULT_FRACTIONS.to_vec(),
        }
    }

    /// Histogram bucket count for this call.
    pub fn buckets(&self) -> usize {
        match self {
            StatArgs::Histogram { buckets } if *buckets > 0 => *buckets,
            _ => DEFAULT_BUCKETS,
        }
    }
}
