//! Unified error type for the aggregation pipeline.
//!
//! Backends map their native errors into [`AggError`] so callers never depend
//! on engine error types directly.

use std::fmt;

use crate::stats::StatKind;

/// Errors raised by the aggregation pipeline.
///
/// Build-time errors (`UnknownColumn`, `UnsupportedStatistic`) surface before
/// any backend computation is attempted. `ExecutionFailed` aborts the whole
/// batch; no partial results are returned.
#[derive(Debug)]
pub enum AggError {
    /// A requested column name does not exist in the dataset.
    UnknownColumn(String),
    /// The active backend has no expression constructor for this statistic.
    UnsupportedStatistic { kind: StatKind, backend: String },
    /// An underlying backend computation failed during materialization.
    ExecutionFailed {
        stat: &'static str,
        column: Option<String>,
        message: String,
    },
    /// A backend returned a result whose shape does not match the statistic.
    Internal(String),
}

impl AggError {
    /// Attach statistic/column context to a backend failure message.
    pub fn execution(kind: StatKind, column: Option<&str>, message: impl fmt::Display) -> Self {
        AggError::ExecutionFailed {
            stat: kind.key(),
            column: column.map(str::to_string),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for AggError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggError::UnknownColumn(name) => write!(f, "unknown column: {name}"),
            AggError::UnsupportedStatistic { kind, backend } => {
                write!(f, "statistic {kind} is not supported by backend {backend}")
            }
            AggError::ExecutionFailed {
                stat,
                column: Some(column),
                message,
            } => write!(f, "aggregation {stat} failed on column {column}: {message}"),
            AggError::ExecutionFailed {
                stat,
                column: None,
                message,
            } => write!(f, "aggregation {stat} failed: {message}"),
            AggError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AggError {}
