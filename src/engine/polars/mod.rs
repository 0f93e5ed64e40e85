//! Reference backend over an in-memory Polars DataFrame.
//!
//! Select-style statistics across the whole batch fuse into one lazy
//! `select`/`collect`, so independent aggregations share a single pass over
//! the data. Histograms bin the materialized column at gather time.

mod exprs;
mod json;

pub use exprs::PolarsAggExpr;

use polars::prelude::{DataFrame, DataType, IntoLazy, PolarsError};
use serde_json::{json, Value};

use self::exprs::{slot_alias, Slot, SlotPart};
use self::json::any_value_to_json;
use crate::cols::Cols;
use crate::dtypes::{DtypeCategory, ExclusionTable};
use crate::engine::{AggBackend, Planned, RawEntry, RawShape, RawValue};
use crate::error::AggError;
use crate::stats::{StatArgs, StatKind};

/// Aggregation backend for a local Polars DataFrame.
#[derive(Debug)]
pub struct PolarsBackend {
    df: DataFrame,
    exclusions: ExclusionTable,
}

impl PolarsBackend {
    /// Wrap a DataFrame with the default exclusion table.
    pub fn new(df: DataFrame) -> Self {
        Self::with_exclusions(df, Self::default_exclusions())
    }

    /// Wrap a DataFrame with an engine-specific exclusion table.
    pub fn with_exclusions(df: DataFrame, exclusions: ExclusionTable) -> Self {
        PolarsBackend { df, exclusions }
    }

    /// Statistics that are undefined or unsafe on non-numeric Polars columns.
    pub fn default_exclusions() -> ExclusionTable {
        let numeric_only = [
            StatKind::Stddev,
            StatKind::Mean,
            StatKind::Variance,
            StatKind::Skewness,
            StatKind::Kurtosis,
            StatKind::Sum,
            StatKind::Percentile,
            StatKind::Histogram,
            StatKind::CountZeros,
        ];
        ExclusionTable::new()
            .exclude(DtypeCategory::Object, numeric_only)
            .exclude(DtypeCategory::Date, numeric_only)
            .exclude(DtypeCategory::Timestamp, numeric_only)
            .exclude(DtypeCategory::Boolean, numeric_only)
    }

    /// Column statistics facade over this backend.
    pub fn cols(&self) -> Cols<'_, Self> {
        Cols::new(self)
    }

    /// The wrapped DataFrame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Rename columns, returning a new backend over the renamed frame.
    ///
    /// All old names are validated before the frame is touched.
    pub fn rename(&self, spec: &RenameSpec) -> Result<PolarsBackend, AggError> {
        let pairs: Vec<(String, String)> = match spec {
            RenameSpec::Pairs(pairs) => pairs.clone(),
            RenameSpec::Single { old, new } => vec![(old.clone(), new.clone())],
            RenameSpec::Transform(f) => self
                .column_names()
                .into_iter()
                .map(|c| {
                    let new = f(&c);
                    (c, new)
                })
                .filter(|(old, new)| old != new)
                .collect(),
        };

        let names = self.column_names();
        for (old, _) in &pairs {
            if !names.iter().any(|c| c == old) {
                return Err(AggError::UnknownColumn(old.clone()));
            }
        }

        // Rebuild the frame through the lazy engine so its schema stays
        // consistent with the new names.
        let (olds, news): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        let df = self
            .df
            .clone()
            .lazy()
            .rename(olds, news, true)
            .collect()
            .map_err(|e| AggError::Internal(e.to_string()))?;
        Ok(PolarsBackend {
            df,
            exclusions: self.exclusions.clone(),
        })
    }

    /// Equal-width histogram of one column from its materialized values.
    fn histogram(&self, column: &str, buckets: usize) -> Result<(Vec<u64>, Vec<f64>), AggError> {
        let err = |e: PolarsError| AggError::execution(StatKind::Histogram, Some(column), e);
        let s = self
            .df
            .column(column)
            .and_then(|c| c.cast(&DataType::Float64))
            .map_err(err)?;
        let ca = s.f64().map_err(err)?;

        let mut values: Vec<f64> = Vec::with_capacity(ca.len());
        for v in ca.into_iter().flatten() {
            if v.is_finite() {
                values.push(v);
            }
        }
        if values.is_empty() {
            return Ok((vec![0; buckets], vec![0.0; buckets + 1]));
        }

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in &values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo == hi {
            // Single distinct value: widen so every value lands in a bucket.
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / buckets as f64;
        let bins: Vec<f64> = (0..=buckets)
            .map(|i| if i == buckets { hi } else { lo + width * i as f64 })
            .collect();
        let mut counts = vec![0u64; buckets];
        for v in values {
            let idx = (((v - lo) / width) as usize).min(buckets - 1);
            counts[idx] += 1;
        }
        Ok((counts, bins))
    }

    /// Re-run each failed batch's expressions one by one to attribute the
    /// failure to a statistic and column.
    fn locate_failure(&self, planned: &[Planned<PolarsAggExpr>]) -> AggError {
        for p in planned {
            if let PolarsAggExpr::Select(slots) = &p.expr {
                let exprs: Vec<_> = slots.iter().map(|s| s.expr.clone()).collect();
                if let Err(e) = self.df.clone().lazy().select(exprs).collect() {
                    return AggError::execution(p.kind, p.column.as_deref(), e);
                }
            }
        }
        AggError::Internal("aggregation batch failed but no expression reproduces it".into())
    }

    /// Read one slot's value from the collected single-row frame.
    fn read_slot(&self, row: &DataFrame, kind: StatKind, slot: &Slot) -> Result<Value, AggError> {
        let alias = slot_alias(kind, &slot.column, slot.part);
        let err = |e: PolarsError| AggError::execution(kind, Some(slot.column.as_str()), e);
        let av = row.column(&alias).map_err(err)?.get(0).map_err(err)?;
        Ok(any_value_to_json(av))
    }

    /// Assemble the raw value of one statistic for one column from its slots.
    fn column_value(
        &self,
        row: &DataFrame,
        kind: StatKind,
        slots: &[&Slot],
    ) -> Result<RawValue, AggError> {
        match kind {
            StatKind::Percentile => {
                let mut pairs = Vec::with_capacity(slots.len());
                for slot in slots {
                    let SlotPart::Fraction(f) = slot.part else {
                        return Err(AggError::Internal(format!(
                            "percentile slot without fraction for column {}",
                            slot.column
                        )));
                    };
                    pairs.push((f, self.read_slot(row, kind, slot)?));
                }
                Ok(RawValue::Percentiles(pairs))
            }
            StatKind::Range => {
                let mut min = Value::Null;
                let mut max = Value::Null;
                for slot in slots {
                    match slot.part {
                        SlotPart::RangeMin => min = self.read_slot(row, kind, slot)?,
                        SlotPart::RangeMax => max = self.read_slot(row, kind, slot)?,
                        _ => {}
                    }
                }
                Ok(RawValue::Scalar(json!({ "min": min, "max": max })))
            }
            StatKind::CountUniques => Ok(RawValue::Count(self.read_slot(row, kind, slots[0])?)),
            _ => Ok(RawValue::Scalar(self.read_slot(row, kind, slots[0])?)),
        }
    }
}

impl AggBackend for PolarsBackend {
    type Expr = PolarsAggExpr;
    type Batch = Vec<Planned<PolarsAggExpr>>;

    fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn dtype(&self, column: &str) -> Result<DtypeCategory, AggError> {
        let col = self
            .df
            .column(column)
            .map_err(|_| AggError::UnknownColumn(column.to_string()))?;
        Ok(match col.dtype() {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => DtypeCategory::Numeric,
            DataType::String => DtypeCategory::Object,
            DataType::Boolean => DtypeCategory::Boolean,
            DataType::Date => DtypeCategory::Date,
            DataType::Datetime(_, _) => DtypeCategory::Timestamp,
            DataType::List(_) => DtypeCategory::Array,
            DataType::Binary => DtypeCategory::Binary,
            DataType::Null => DtypeCategory::Null,
            _ => DtypeCategory::Other,
        })
    }

    fn exclusions(&self) -> &ExclusionTable {
        &self.exclusions
    }

    fn build_expression(
        &self,
        kind: StatKind,
        columns: &[String],
        args: &StatArgs,
    ) -> Result<PolarsAggExpr, AggError> {
        exprs::build(kind, columns, args)
    }

    fn submit(&self, planned: Vec<Planned<PolarsAggExpr>>) -> Result<Self::Batch, AggError> {
        Ok(planned)
    }

    fn gather(&self, batch: Self::Batch) -> Result<Vec<RawEntry>, AggError> {
        // One fused pass for every select-style expression in the batch.
        let mut select_exprs = Vec::new();
        for p in &batch {
            if let PolarsAggExpr::Select(slots) = &p.expr {
                select_exprs.extend(slots.iter().map(|s| s.expr.clone()));
            }
        }
        let row = if select_exprs.is_empty() {
            None
        } else {
            match self.df.clone().lazy().select(select_exprs).collect() {
                Ok(df) => Some(df),
                Err(_) => return Err(self.locate_failure(&batch)),
            }
        };

        let mut entries = Vec::with_capacity(batch.len());
        for p in batch {
            let shape = match &p.expr {
                PolarsAggExpr::Select(slots) => {
                    let row = row
                        .as_ref()
                        .ok_or_else(|| AggError::Internal("select slots without a collected row".into()))?;
                    let mut per_column: Vec<(String, RawValue)> = Vec::new();
                    for group in group_by_column(slots) {
                        let value = self.column_value(row, p.kind, &group)?;
                        per_column.push((group[0].column.clone(), value));
                    }
                    match &p.column {
                        Some(column) => {
                            let (_, value) = per_column
                                .into_iter()
                                .find(|(c, _)| c == column)
                                .ok_or_else(|| {
                                    AggError::Internal(format!(
                                        "no slot for column {column} in {} expression",
                                        p.kind
                                    ))
                                })?;
                            RawShape::Single(column.clone(), value)
                        }
                        None => RawShape::PerColumn(per_column),
                    }
                }
                PolarsAggExpr::Hist { column, buckets } => {
                    let (counts, bins) = self.histogram(column, *buckets)?;
                    RawShape::Single(column.clone(), RawValue::Histogram { counts, bins })
                }
            };
            entries.push(RawEntry { kind: p.kind, shape });
        }
        Ok(entries)
    }
}

/// Group slots by column, preserving first-seen column order.
fn group_by_column(slots: &[Slot]) -> Vec<Vec<&Slot>> {
    let mut groups: Vec<(String, Vec<&Slot>)> = Vec::new();
    for slot in slots {
        match groups.iter_mut().find(|(c, _)| *c == slot.column) {
            Some((_, group)) => group.push(slot),
            None => groups.push((slot.column.clone(), vec![slot])),
        }
    }
    groups.into_iter().map(|(_, g)| g).collect()
}

/// How to rename columns: explicit pairs, a single rename, or a transform
/// applied to every column name.
pub enum RenameSpec {
    Pairs(Vec<(String, String)>),
    Single { old: String, new: String },
    Transform(Box<dyn Fn(&str) -> String>),
}
