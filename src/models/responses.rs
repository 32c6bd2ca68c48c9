// file: src/models/responses.rs
// description: typed request/response contracts for the processing backend
// reference: backend HTTP surface (/, /api/v1/*)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub file_id: String,
}

/// Profile of the uploaded data computed by the backend before script generation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct DataSummary {
    pub filename: String,
    pub rows_count: u64,
    pub columns_count: u64,
    pub columns: Vec<String>,
    #[serde(default)]
    pub data_types: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_values: BTreeMap<String, u64>,
    #[serde(default)]
    pub sample_rows: Vec<Map<String, Value>>,
    #[serde(default)]
    pub duplicate_rows: u64,
    #[serde(default)]
    pub memory_usage: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProcessResponse {
    pub file_id: String,
    pub message: String,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub data_summary: Option<DataSummary>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ExecuteResponse {
    pub message: String,
    pub processed_rows: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResultResponse {
    pub file_id: String,
    #[serde(default)]
    pub message: String,
    pub data: Vec<Map<String, Value>>,
    pub columns: Vec<String>,
    pub rows_count: u64,
}

/// Error envelope carried by non-2xx responses.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ErrorEnvelope {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_response_with_summary() {
        let body = r#"{
            "file_id": "abc123",
            "message": "script generated",
            "script": "import pandas as pd",
            "data_summary": {
                "filename": "sales.csv",
                "rows_count": 42,
                "columns_count": 2,
                "columns": ["id", "amount"],
                "data_types": {"id": "int64", "amount": "object"},
                "missing_values": {"id": 0, "amount": 3},
                "sample_rows": [{"id": 1, "amount": "10,5"}],
                "duplicate_rows": 1,
                "memory_usage": "1.2 KB"
            }
        }"#;

        let response: ProcessResponse = serde_json::from_str(body).unwrap();
        let summary = response.data_summary.unwrap();
        assert_eq!(summary.rows_count, 42);
        assert_eq!(summary.missing_values["amount"], 3);
        assert_eq!(response.script.as_deref(), Some("import pandas as pd"));
    }

    #[test]
    fn test_upload_response_requires_file_id() {
        let body = r#"{"filename": "sales.csv", "status": true, "message": "ok"}"#;
        assert!(serde_json::from_str::<UploadResponse>(body).is_err());
    }
}
