//! Expression Builder: turns a column selection and statistic list into a
//! deduplicated batch of backend expressions.

use std::fmt;

use tracing::debug;

use crate::columns::{self, ColumnsSpec};
use crate::engine::{AggBackend, Planned};
use crate::error::AggError;
use crate::stats::{StatArgs, StatKind};

/// Ordered set of expressions ready for execution.
///
/// Owned exclusively by the caller between build and run; no state is retained
/// across calls.
pub struct ExpressionBatch<B: AggBackend> {
    pub(crate) planned: Vec<Planned<B::Expr>>,
}

impl<B: AggBackend> ExpressionBatch<B> {
    pub fn len(&self) -> usize {
        self.planned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
    }

    /// `(kind, column)` pairs in submission order, for inspection.
    pub fn requests(&self) -> impl Iterator<Item = (StatKind, Option<&str>)> {
        self.planned
            .iter()
            .map(|p| (p.kind, p.column.as_deref()))
    }
}

// Manual impl: backend expression types need not be `Debug`.
impl<B: AggBackend> fmt::Debug for ExpressionBatch<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.requests()).finish()
    }
}

/// Build the full expression batch for `kinds` over `columns`.
///
/// Columns are resolved (wildcard, dedup, existence check) first, so
/// [`AggError::UnknownColumn`] and [`AggError::UnsupportedStatistic`] surface
/// before any execution. For each kind the resolved columns are partitioned by
/// the engine's exclusion table; kinds left with zero allowed columns
/// contribute nothing. Multi-column kinds produce one expression over all
/// allowed columns, others one expression per column.
///
/// Expressions are keyed by `(statistic key, column)`: a later expression for
/// an already-seen key replaces the earlier one in place (last-write-wins).
pub fn build_and_queue<B: AggBackend>(
    backend: &B,
    columns: &ColumnsSpec,
    kinds: &[StatKind],
    args: &StatArgs,
) -> Result<ExpressionBatch<B>, AggError> {
    let resolved = columns::resolve(columns, &backend.column_names())?;
    let mut planned: Vec<Planned<B::Expr>> = Vec::new();

    for &kind in kinds {
        let mut allowed = Vec::new();
        for name in &resolved {
            let dtype = backend.dtype(name)?;
            if backend.exclusions().is_excluded(kind, dtype) {
                debug!(stat = kind.key(), column = %name, ?dtype, "skipping excluded pair");
            } else {
                allowed.push(name.clone());
            }
        }
        if allowed.is_empty() {
            debug!(stat = kind.key(), "no allowed columns, dropping statistic");
            continue;
        }

        if kind.is_multi_column() {
            let expr = backend.build_expression(kind, &allowed, args)?;
            upsert(&mut planned, kind, None, expr);
        } else {
            for name in allowed {
                let expr = backend.build_expression(kind, std::slice::from_ref(&name), args)?;
                upsert(&mut planned, kind, Some(name), expr);
            }
        }
    }

    debug!(expressions = planned.len(), "expression batch built");
    Ok(ExpressionBatch { planned })
}

/// Insert keeping last-write-wins semantics on `(statistic key, column)`.
/// Replacement happens in place, so the original submission position is kept.
fn upsert<E>(planned: &mut Vec<Planned<E>>, kind: StatKind, column: Option<String>, expr: E) {
    if let Some(existing) = planned
        .iter_mut()
        .find(|p| p.kind.key() == kind.key() && p.column == column)
    {
        existing.expr = expr;
    } else {
        planned.push(Planned { kind, column, expr });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtypes::{DtypeCategory, ExclusionTable};
    use crate::engine::RawEntry;

    /// Builder-only backend: expressions are plain descriptions, execution is
    /// unreachable.
    struct PlanOnly {
        columns: Vec<(String, DtypeCategory)>,
        exclusions: ExclusionTable,
    }

    impl AggBackend for PlanOnly {
        type Expr = (StatKind, Vec<String>);
        type Batch = ();

        fn column_names(&self) -> Vec<String> {
            self.columns.iter().map(|(n, _)| n.clone()).collect()
        }

        fn dtype(&self, column: &str) -> Result<DtypeCategory, AggError> {
            self.columns
                .iter()
                .find(|(n, _)| n == column)
                .map(|(_, d)| *d)
                .ok_or_else(|| AggError::UnknownColumn(column.to_string()))
        }

        fn exclusions(&self) -> &ExclusionTable {
            &self.exclusions
        }

        fn build_expression(
            &self,
            kind: StatKind,
            columns: &[String],
            _args: &StatArgs,
        ) -> Result<Self::Expr, AggError> {
            Ok((kind, columns.to_vec()))
        }

        fn submit(&self, _planned: Vec<Planned<Self::Expr>>) -> Result<(), AggError> {
            unreachable!("builder tests never execute")
        }

        fn gather(&self, _batch: ()) -> Result<Vec<RawEntry>, AggError> {
            unreachable!("builder tests never execute")
        }
    }

    fn backend() -> PlanOnly {
        PlanOnly {
            columns: vec![
                ("age".into(), DtypeCategory::Numeric),
                ("name".into(), DtypeCategory::Object),
            ],
            exclusions: ExclusionTable::new()
                .exclude(DtypeCategory::Object, [StatKind::Stddev, StatKind::Mean]),
        }
    }

    #[test]
    fn multi_kind_builds_one_expression_over_allowed_columns() {
        let b = backend();
        let batch =
            build_and_queue(&b, &ColumnsSpec::All, &[StatKind::Min], &StatArgs::None).unwrap();
        assert_eq!(batch.len(), 1);
        let (kind, column) = batch.requests().next().unwrap();
        assert_eq!(kind, StatKind::Min);
        assert_eq!(column, None);
        assert_eq!(batch.planned[0].expr.1, vec!["age", "name"]);
    }

    #[test]
    fn single_column_kind_builds_one_expression_per_column() {
        let b = backend();
        let batch =
            build_and_queue(&b, &ColumnsSpec::All, &[StatKind::CountNa], &StatArgs::None).unwrap();
        assert_eq!(batch.len(), 2);
        let cols: Vec<_> = batch.requests().map(|(_, c)| c.unwrap().to_string()).collect();
        assert_eq!(cols, vec!["age", "name"]);
    }

    #[test]
    fn excluded_pairs_are_dropped_silently() {
        let b = backend();
        let batch =
            build_and_queue(&b, &ColumnsSpec::All, &[StatKind::Stddev], &StatArgs::None).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.planned[0].expr.1, vec!["age"]);
    }

    #[test]
    fn kind_with_zero_allowed_columns_contributes_nothing() {
        let b = backend();
        let batch =
            build_and_queue(&b, &"name".into(), &[StatKind::Mean], &StatArgs::None).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn duplicate_requests_are_last_write_wins() {
        let b = backend();
        let batch = build_and_queue(
            &b,
            &"age".into(),
            &[StatKind::Min, StatKind::Min],
            &StatArgs::None,
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn batch_debug_lists_requests() {
        let b = backend();
        let batch = build_and_queue(
            &b,
            &"age".into(),
            &[StatKind::Min, StatKind::CountNa],
            &StatArgs::None,
        )
        .unwrap();
        assert_eq!(format!("{batch:?}"), r#"[(Min, None), (CountNa, Some("age"))]"#);
    }

    #[test]
    fn unknown_column_fails_before_building() {
        let b = backend();
        let err =
            build_and_queue(&b, &"salary".into(), &[StatKind::Min], &StatArgs::None).unwrap_err();
        assert!(matches!(err, AggError::UnknownColumn(_)));
    }
}
