// file: src/models/result_set.rs
// description: terminal tabular payload of a completed run
// reference: result endpoint contract

use crate::error::{PipelineError, Result};
use crate::models::responses::ResultResponse;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

pub type Row = Map<String, Value>;

/// Cleaned rows, their ordered columns and the backend's row count.
/// Immutable once built.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultSet {
    file_id: String,
    rows: Vec<Row>,
    columns: Vec<String>,
    total_rows: u64,
}

impl ResultSet {
    pub fn new(file_id: String, rows: Vec<Row>, columns: Vec<String>, total_rows: u64) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(PipelineError::MalformedResponse(format!(
                    "duplicate column '{}' in result",
                    column
                )));
            }
        }

        for (idx, row) in rows.iter().enumerate() {
            if let Some(key) = row.keys().find(|key| !seen.contains(key.as_str())) {
                return Err(PipelineError::MalformedResponse(format!(
                    "row {} has column '{}' missing from the column list",
                    idx, key
                )));
            }
        }

        Ok(Self {
            file_id,
            rows,
            columns,
            total_rows,
        })
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TryFrom<ResultResponse> for ResultSet {
    type Error = PipelineError;

    fn try_from(response: ResultResponse) -> Result<Self> {
        ResultSet::new(
            response.file_id,
            response.data,
            response.columns,
            response.rows_count,
        )
    }
}

/// Text used when matching a search term, close to how the page stringified cells.
pub fn search_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

/// Floats print through `f64`'s `Display`, so integral values lose the
/// trailing `.0` (`1.0` becomes `1`).
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

/// Text used when rendering a cell. Missing, null, empty, zero and false
/// values render blank.
pub fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_text(n),
        Some(other) => other.to_string(),
    }
}
