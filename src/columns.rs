//! Column selection specs and their resolution against a dataset.

use crate::error::AggError;

/// Which columns an aggregation call targets.
///
/// `"*"` anywhere in a selection (or [`ColumnsSpec::All`]) resolves to every
/// dataset column, in dataset order, at call time. Duplicate names are
/// deduplicated preserving first-seen order.
#[derive(Debug, Clone)]
pub enum ColumnsSpec {
    All,
    One(String),
    Many(Vec<String>),
}

impl From<&str> for ColumnsSpec {
    fn from(name: &str) -> Self {
        ColumnsSpec::One(name.to_string())
    }
}

impl From<Vec<String>> for ColumnsSpec {
    fn from(names: Vec<String>) -> Self {
        ColumnsSpec::Many(names)
    }
}

impl From<&[&str]> for ColumnsSpec {
    fn from(names: &[&str]) -> Self {
        ColumnsSpec::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Resolve a spec to concrete column names present in `dataset_columns`.
///
/// Errors with [`AggError::UnknownColumn`] on the first name that does not
/// exist, before any expression is built.
pub fn resolve(spec: &ColumnsSpec, dataset_columns: &[String]) -> Result<Vec<String>, AggError> {
    let requested: Vec<&str> = match spec {
        ColumnsSpec::All => return Ok(dataset_columns.to_vec()),
        ColumnsSpec::One(name) if name == "*" => return Ok(dataset_columns.to_vec()),
        ColumnsSpec::One(name) => vec![name.as_str()],
        ColumnsSpec::Many(names) if names.iter().any(|n| n == "*") => {
            return Ok(dataset_columns.to_vec())
        }
        ColumnsSpec::Many(names) => names.iter().map(String::as_str).collect(),
    };

    let mut resolved = Vec::with_capacity(requested.len());
    for name in requested {
        if !dataset_columns.iter().any(|c| c == name) {
            return Err(AggError::UnknownColumn(name.to_string()));
        }
        if !resolved.iter().any(|c| c == name) {
            resolved.push(name.to_string());
        }
    }
    Ok(resolved)
}
