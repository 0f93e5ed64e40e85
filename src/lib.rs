//! colwise - backend-agnostic column statistics aggregation.
//!
//! One pipeline computes many statistics over many columns of a dataframe in
//! a single deferred batch, regardless of which engine executes it: the
//! builder turns a column selection and statistic list into lazy backend
//! expressions (applying the engine's dtype exclusion table), the executor
//! submits them as one batch and gathers the materialized results, and the
//! normalizer/merger fold everything into one canonical
//! `column -> statistic -> value` map.
//!
//! Engines plug in through the [`engine::AggBackend`] trait; a reference
//! backend over Polars ships in [`engine::polars`].
//!
//! ```no_run
//! use colwise::engine::polars::PolarsBackend;
//! use polars::prelude::df;
//!
//! let frame = df!["age" => &[10i64, 20, 30]].unwrap();
//! let backend = PolarsBackend::new(frame);
//! let stats = backend.cols().min("age").unwrap();
//! assert_eq!(stats["age"]["min"], serde_json::json!(10));
//! ```

pub mod builder;
pub mod cols;
pub mod columns;
pub mod dtypes;
pub mod engine;
pub mod error;
pub mod executor;
pub mod merge;
pub mod normalize;
pub mod stats;

pub use builder::{build_and_queue, ExpressionBatch};
pub use cols::Cols;
pub use columns::ColumnsSpec;
pub use dtypes::{DtypeCategory, ExclusionTable};
pub use engine::AggBackend;
pub use error::AggError;
pub use executor::{agg_exprs, run};
pub use merge::{tidy, ColumnStats};
pub use stats::{ResultShape, StatArgs, StatKind};
