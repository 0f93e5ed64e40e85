//! Per-statistic lazy expression builders for the Polars backend.

use polars::prelude::{col, lit, DataType, Expr, QuantileMethod, SortOptions};

use crate::error::AggError;
use crate::stats::{StatArgs, StatKind};

/// Which piece of a statistic one aliased expression computes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotPart {
    /// The statistic's whole value.
    Whole,
    /// Lower bound of a range result.
    RangeMin,
    /// Upper bound of a range result.
    RangeMax,
    /// One percentile target.
    Fraction(f64),
}

/// One aliased select expression plus the metadata to read its result back.
#[derive(Debug, Clone)]
pub struct Slot {
    pub column: String,
    pub part: SlotPart,
    pub expr: Expr,
}

/// Lazy expression handle for the Polars backend.
///
/// Select-style statistics batch into a single `LazyFrame::select`; histograms
/// need the materialized column and run per column at gather time.
#[derive(Debug, Clone)]
pub enum PolarsAggExpr {
    Select(Vec<Slot>),
    Hist { column: String, buckets: usize },
}

/// Alias under which a slot's value lands in the collected row.
pub(crate) fn slot_alias(kind: StatKind, column: &str, part: SlotPart) -> String {
    match part {
        SlotPart::Whole => format!("{}:{}", kind.key(), column),
        SlotPart::RangeMin => format!("{}:{}:min", kind.key(), column),
        SlotPart::RangeMax => format!("{}:{}:max", kind.key(), column),
        SlotPart::Fraction(f) => format!("{}:{}:{}", kind.key(), column, f),
    }
}

/// Build the lazy expression for `kind` over `columns`.
pub(crate) fn build(
    kind: StatKind,
    columns: &[String],
    args: &StatArgs,
) -> Result<PolarsAggExpr, AggError> {
    if kind == StatKind::Histogram {
        // Histograms are per-column by construction.
        return Ok(PolarsAggExpr::Hist {
            column: columns[0].clone(),
            buckets: args.buckets(),
        });
    }

    let mut slots = Vec::new();
    for column in columns {
        match kind {
            StatKind::Range => {
                slots.push(slot(kind, column, SlotPart::RangeMin, col(column.as_str()).min()));
                slots.push(slot(kind, column, SlotPart::RangeMax, col(column.as_str()).max()));
            }
            StatKind::Percentile => {
                for f in args.fractions() {
                    slots.push(slot(
                        kind,
                        column,
                        SlotPart::Fraction(f),
                        col(column.as_str()).quantile(lit(f), QuantileMethod::Linear),
                    ));
                }
            }
            _ => slots.push(slot(kind, column, SlotPart::Whole, scalar_expr(kind, column))),
        }
    }
    Ok(PolarsAggExpr::Select(slots))
}

fn slot(kind: StatKind, column: &str, part: SlotPart, expr: Expr) -> Slot {
    Slot {
        column: column.to_string(),
        part,
        expr: expr.alias(slot_alias(kind, column, part)),
    }
}

fn scalar_expr(kind: StatKind, column: &str) -> Expr {
    let c = col(column);
    match kind {
        StatKind::Min => c.min(),
        StatKind::Max => c.max(),
        StatKind::Stddev => c.std(1),
        StatKind::Mean => c.mean(),
        StatKind::Variance => c.var(1),
        StatKind::Skewness => c.cast(DataType::Float64).skew(true),
        StatKind::Kurtosis => c.cast(DataType::Float64).kurtosis(true, true),
        StatKind::Sum => c.sum(),
        StatKind::CountUniques => c.n_unique().cast(DataType::Int64),
        StatKind::CountNa => c.null_count(),
        StatKind::CountZeros => c
            .cast(DataType::Float64)
            .eq(lit(0.0))
            .cast(DataType::Int64)
            .sum(),
        // Smallest mode, for a deterministic value on multimodal columns.
        StatKind::Mode => c.mode().sort(SortOptions::default()).first(),
        StatKind::Range | StatKind::Percentile | StatKind::Histogram => {
            unreachable!("handled by dedicated slot builders")
        }
    }
}
