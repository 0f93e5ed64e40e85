//! Shared helpers for integration tests: Polars fixtures and a deferred mock
//! backend whose submissions materialize on worker threads.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use serde_json::{json, Value};

use colwise::dtypes::{DtypeCategory, ExclusionTable};
use colwise::engine::{AggBackend, Planned, RawEntry, RawShape, RawValue};
use colwise::error::AggError;
use colwise::stats::{StatArgs, StatKind};

/// Install a fmt subscriber so `RUST_LOG=debug` shows pipeline events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Small (age, score, name) frame with one null age.
pub fn people_frame() -> polars::prelude::DataFrame {
    use polars::prelude::df;
    df![
        "age" => &[Some(10i64), Some(20), Some(30), None],
        "score" => &[1.0f64, 2.0, 3.0, 4.0],
        "name" => &["a", "b", "c", "d"],
    ]
    .unwrap()
}

/// One column of the mock backend's dataset.
#[derive(Clone)]
pub struct MockColumn {
    pub name: String,
    pub dtype: DtypeCategory,
    pub values: Vec<Value>,
}

/// Deferred backend: `submit` hands out join handles, `gather` awaits them.
///
/// Counts builder/executor invocations so tests can assert that build-time
/// failures never reach the backend.
pub struct DeferredBackend {
    columns: Vec<MockColumn>,
    exclusions: ExclusionTable,
    pub builds: AtomicUsize,
    pub submits: AtomicUsize,
    /// Statistic whose expressions fail at materialization time.
    pub fail_on: Option<StatKind>,
    /// Statistics this backend has no constructor for.
    pub unsupported: Vec<StatKind>,
}

/// Expression handle: enough context to compute the statistic on a thread.
pub struct MockExpr {
    kind: StatKind,
    columns: Vec<MockColumn>,
    fail: bool,
}

impl DeferredBackend {
    pub fn new(columns: Vec<MockColumn>, exclusions: ExclusionTable) -> Self {
        DeferredBackend {
            columns,
            exclusions,
            builds: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
            fail_on: None,
            unsupported: Vec::new(),
        }
    }

    /// Numeric backend with `age` and `score` columns plus an object `name`
    /// column excluded from every numeric statistic.
    pub fn numeric() -> Self {
        let columns = vec![
            MockColumn {
                name: "age".into(),
                dtype: DtypeCategory::Numeric,
                values: vec![json!(10.0), json!(20.0), json!(30.0), Value::Null],
            },
            MockColumn {
                name: "score".into(),
                dtype: DtypeCategory::Numeric,
                values: vec![json!(1.0), json!(2.0), json!(3.0), json!(4.0)],
            },
            MockColumn {
                name: "name".into(),
                dtype: DtypeCategory::Object,
                values: vec![json!("a"), json!("b"), json!("c"), json!("d")],
            },
        ];
        let exclusions = ExclusionTable::new().exclude(
            DtypeCategory::Object,
            [
                StatKind::Min,
                StatKind::Max,
                StatKind::Stddev,
                StatKind::Mean,
            ],
        );
        DeferredBackend::new(columns, exclusions)
    }
}

fn numbers(column: &MockColumn) -> Vec<f64> {
    column.values.iter().filter_map(Value::as_f64).collect()
}

fn compute(kind: StatKind, column: &MockColumn) -> RawValue {
    let nums = numbers(column);
    match kind {
        StatKind::Min => RawValue::Scalar(json!(nums.iter().cloned().fold(f64::INFINITY, f64::min))),
        StatKind::Max => {
            RawValue::Scalar(json!(nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max)))
        }
        StatKind::Mean => RawValue::Scalar(json!(nums.iter().sum::<f64>() / nums.len() as f64)),
        StatKind::Stddev => {
            let mean = nums.iter().sum::<f64>() / nums.len() as f64;
            let var = nums.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (nums.len() - 1) as f64;
            RawValue::Scalar(json!(var.sqrt()))
        }
        StatKind::CountNa => RawValue::Scalar(json!(
            column.values.iter().filter(|v| v.is_null()).count()
        )),
        // Float-typed on purpose: exercises the count coercion path.
        StatKind::CountUniques => {
            let mut seen: Vec<&Value> = Vec::new();
            for v in column.values.iter().filter(|v| !v.is_null()) {
                if !seen.contains(&v) {
                    seen.push(v);
                }
            }
            RawValue::Count(json!(seen.len() as f64))
        }
        other => RawValue::Scalar(json!(format!("unsupported mock statistic {other}"))),
    }
}

impl AggBackend for DeferredBackend {
    type Expr = MockExpr;
    type Batch = Vec<(StatKind, Option<String>, JoinHandle<Result<RawEntry, AggError>>)>;

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn dtype(&self, column: &str) -> Result<DtypeCategory, AggError> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.dtype)
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
    ) -> Result<MockExpr, AggError> {
        if self.unsupported.contains(&kind) {
            return Err(AggError::UnsupportedStatistic {
                kind,
                backend: "deferred-mock".to_string(),
            });
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        let columns = self
            .columns
            .iter()
            .filter(|c| columns.contains(&c.name))
            .cloned()
            .collect();
        Ok(MockExpr {
            kind,
            columns,
            fail: self.fail_on == Some(kind),
        })
    }

    fn submit(&self, planned: Vec<Planned<MockExpr>>) -> Result<Self::Batch, AggError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let mut handles = Vec::with_capacity(planned.len());
        for p in planned {
            let expr = p.expr;
            let kind = p.kind;
            let context = p.column.clone();
            let handle = std::thread::spawn(move || {
                if expr.fail {
                    return Err(AggError::execution(
                        kind,
                        expr.columns.first().map(|c| c.name.as_str()),
                        "simulated backend failure",
                    ));
                }
                let shape = match &context {
                    Some(column) => {
                        let col = expr
                            .columns
                            .iter()
                            .find(|c| &c.name == column)
                            .expect("planned column present in expression");
                        RawShape::Single(column.clone(), compute(kind, col))
                    }
                    None => RawShape::PerColumn(
                        expr.columns
                            .iter()
                            .map(|c| (c.name.clone(), compute(kind, c)))
                            .collect(),
                    ),
                };
                Ok(RawEntry { kind, shape })
            });
            handles.push((p.kind, p.column, handle));
        }
        Ok(handles)
    }

    fn gather(&self, batch: Self::Batch) -> Result<Vec<RawEntry>, AggError> {
        let mut entries = Vec::with_capacity(batch.len());
        for (kind, column, handle) in batch {
            let joined = handle.join().map_err(|_| {
                AggError::execution(kind, column.as_deref(), "worker thread panicked")
            })?;
            entries.push(joined?);
        }
        Ok(entries)
    }
}
