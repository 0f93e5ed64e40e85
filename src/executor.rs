//! Deferred Executor: submit a built batch, gather materialized results, and
//! hand them through normalization into the merged canonical result.

use tracing::debug;

use crate::builder::{self, ExpressionBatch};
use crate::columns::ColumnsSpec;
use crate::engine::AggBackend;
use crate::error::AggError;
use crate::merge::{self, ColumnStats};
use crate::normalize;
use crate::stats::{StatArgs, StatKind};

/// Execute a built expression batch and return the canonical result.
///
/// This is the single blocking boundary: the calling thread suspends until
/// every submitted expression materializes or one fails. An empty batch (every
/// requested pair excluded by dtype) yields an empty result, not an error.
pub fn run<B: AggBackend>(backend: &B, batch: ExpressionBatch<B>) -> Result<ColumnStats, AggError> {
    if batch.is_empty() {
        return Ok(ColumnStats::new());
    }
    let size = batch.len();
    debug!(expressions = size, "submitting aggregation batch");
    let handle = backend.submit(batch.planned)?;
    let entries = backend.gather(handle)?;
    debug!(entries = entries.len(), "aggregation batch materialized");

    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        pairs.push(normalize::normalize_entry(entry)?);
    }
    Ok(merge::merge(pairs))
}

/// Build and run in one step: the public-facing aggregation call.
pub fn agg_exprs<B: AggBackend>(
    backend: &B,
    columns: &ColumnsSpec,
    kinds: &[StatKind],
    args: &StatArgs,
) -> Result<ColumnStats, AggError> {
    let batch = builder::build_and_queue(backend, columns, kinds, args)?;
    run(backend, batch)
}
