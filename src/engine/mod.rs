//! Engine adapter: the narrow interface each dataframe backend implements.
//!
//! The pipeline never inspects a backend's expression type; it only asks the
//! backend to build expressions, submit them as one batch, and gather the
//! materialized results. Local engines materialize inside [`AggBackend::gather`];
//! distributed engines hand out pending handles from [`AggBackend::submit`] and
//! await them in `gather`.

pub mod polars;

use serde_json::Value;

use crate::dtypes::{DtypeCategory, ExclusionTable};
use crate::error::AggError;
use crate::stats::{StatArgs, StatKind};

/// One expression scheduled for execution, with the context needed to key its
/// result: the statistic kind and, for single-column expressions, the column
/// it was built for.
#[derive(Debug)]
pub struct Planned<E> {
    pub kind: StatKind,
    /// `Some` for per-column expressions; `None` when the expression covers
    /// several columns and its raw result is itself a column -> value mapping.
    pub column: Option<String>,
    pub expr: E,
}

/// Raw value of one statistic for one column, before shape normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Already-canonical value.
    Scalar(Value),
    /// Percentile fraction -> value pairs, in request order.
    Percentiles(Vec<(f64, Value)>),
    /// Parallel bucket counts and bin edges; `bins.len() == counts.len() + 1`.
    Histogram { counts: Vec<u64>, bins: Vec<f64> },
    /// Backend-native count wrapper, not yet coerced to an integer.
    Count(Value),
}

/// Materialized output of one planned expression.
#[derive(Debug)]
pub enum RawShape {
    /// Column -> value entries produced by a multi-column expression.
    PerColumn(Vec<(String, RawValue)>),
    /// A bare value plus the column it was computed for.
    Single(String, RawValue),
}

/// `(statistic, result)` pair reported back by a backend, in submission order.
#[derive(Debug)]
pub struct RawEntry {
    pub kind: StatKind,
    pub shape: RawShape,
}

/// Backend adapter implemented once per engine.
pub trait AggBackend {
    /// Backend-specific lazy expression handle.
    type Expr;
    /// Handle for one submitted batch (pending futures, a compiled query, ...).
    type Batch;

    /// Column names of the underlying dataset, in dataset order.
    fn column_names(&self) -> Vec<String>;

    /// Dtype category of one column; used by the exclusion filter.
    fn dtype(&self, column: &str) -> Result<DtypeCategory, AggError>;

    /// Statistics this engine must skip per dtype category.
    fn exclusions(&self) -> &ExclusionTable;

    /// Build one lazy expression computing `kind` over `columns`.
    ///
    /// Errors with [`AggError::UnsupportedStatistic`] when the engine has no
    /// constructor for `kind`; the builder surfaces this before execution.
    fn build_expression(
        &self,
        kind: StatKind,
        columns: &[String],
        args: &StatArgs,
    ) -> Result<Self::Expr, AggError>;

    /// Submit a whole batch for deferred execution.
    fn submit(&self, planned: Vec<Planned<Self::Expr>>) -> Result<Self::Batch, AggError>;

    /// Block until every expression in the batch materializes.
    ///
    /// Entries must be reported in submission order. Any failing expression
    /// fails the whole call with [`AggError::ExecutionFailed`].
    fn gather(&self, batch: Self::Batch) -> Result<Vec<RawEntry>, AggError>;
}
