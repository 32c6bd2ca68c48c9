// file: src/gateway/mock.rs
// description: in-process gateway double with scripted stage failures
// reference: test double, built for tests or with the `mock` feature

use super::Gateway;
use crate::error::{PipelineError, Result};
use crate::models::{
    DataSummary, ExecuteResponse, FileHandle, HealthResponse, ProcessResponse, ResultSet, Row,
    StageFlags, StatusSnapshot, UploadResponse,
};
use crate::pipeline::state::Stage;
use crate::utils::validation::Validator;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq)]
pub enum MockFailure {
    Server { status: u16, detail: String },
    Transport(String),
    Malformed(String),
}

impl From<MockFailure> for PipelineError {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::Server { status, detail } => PipelineError::Server { status, detail },
            MockFailure::Transport(msg) => PipelineError::Transport(msg),
            MockFailure::Malformed(msg) => PipelineError::MalformedResponse(msg),
        }
    }
}

/// Simulates the backend for one file: assigns a fixed `file_id`, tracks
/// stage progress, and fabricates a result table of a chosen shape.
pub struct MockGateway {
    file_id: String,
    rows: usize,
    columns: usize,
    delay: Duration,
    stale_status: bool,
    failures: Mutex<HashMap<Stage, MockFailure>>,
    status_failure: Mutex<Option<MockFailure>>,
    progress: Mutex<StageFlags>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            rows: 42,
            columns: 5,
            delay: Duration::ZERO,
            stale_status: false,
            failures: Mutex::new(HashMap::new()),
            status_failure: Mutex::new(None),
            progress: Mutex::new(StageFlags::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_result_shape(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns.max(1);
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Status calls report nothing completed, regardless of progress.
    pub fn with_stale_status(mut self) -> Self {
        self.stale_status = true;
        self
    }

    pub fn fail_stage(self, stage: Stage, failure: MockFailure) -> Self {
        self.set_failure(stage, Some(failure));
        self
    }

    pub fn fail_status(self, failure: MockFailure) -> Self {
        *lock(&self.status_failure) = Some(failure);
        self
    }

    pub fn set_failure(&self, stage: Stage, failure: Option<MockFailure>) {
        let mut failures = lock(&self.failures);
        match failure {
            Some(failure) => {
                failures.insert(stage, failure);
            }
            None => {
                failures.remove(&stage);
            }
        }
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == operation).count()
    }

    pub fn progress(&self) -> StageFlags {
        *lock(&self.progress)
    }

    async fn enter(&self, operation: &str, stage: Option<Stage>) -> Result<()> {
        lock(&self.calls).push(operation.to_string());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        let failure = stage.and_then(|stage| lock(&self.failures).get(&stage).cloned());
        match failure {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }

    fn check_known(&self, file_id: &str) -> Result<()> {
        Validator::validate_file_id(file_id)?;
        if file_id != self.file_id || !self.progress().uploaded {
            return Err(PipelineError::Server {
                status: 404,
                detail: format!("File {} not found", file_id),
            });
        }
        Ok(())
    }

    fn column_names(&self) -> Vec<String> {
        (0..self.columns)
            .map(|j| {
                if j == 0 {
                    "id".to_string()
                } else {
                    format!("column_{}", j)
                }
            })
            .collect()
    }

    fn build_rows(&self, columns: &[String]) -> Vec<Row> {
        (1..=self.rows)
            .map(|i| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(j, name)| {
                        let value = if j == 0 {
                            Value::from(i as u64)
                        } else {
                            Value::from(format!("r{}c{}", i, j))
                        };
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Gateway for MockGateway {
    async fn health(&self) -> Result<HealthResponse> {
        self.enter("health", None).await?;
        Ok(HealthResponse {
            message: "mock backend is running".to_string(),
        })
    }

    async fn upload(&self, file: &FileHandle) -> Result<UploadResponse> {
        self.enter("upload", Some(Stage::Upload)).await?;
        lock(&self.progress).uploaded = true;
        Ok(UploadResponse {
            filename: file.name().to_string(),
            status: true,
            message: "FILE WAS UPLOADED SUCCESSFULLY".to_string(),
            file_id: self.file_id.clone(),
        })
    }

    async fn request_processing(&self, file_id: &str) -> Result<ProcessResponse> {
        self.enter("process", Some(Stage::Process)).await?;
        self.check_known(file_id)?;
        lock(&self.progress).processed_by_llm = true;

        let columns = self.column_names();
        Ok(ProcessResponse {
            file_id: file_id.to_string(),
            message: "cleaning script generated".to_string(),
            script: Some("import pandas as pd\ndf = df.drop_duplicates()\n".to_string()),
            data_summary: Some(DataSummary {
                filename: format!("{}.csv", file_id),
                rows_count: self.rows as u64,
                columns_count: columns.len() as u64,
                columns,
                ..DataSummary::default()
            }),
        })
    }

    async fn request_execution(&self, file_id: &str) -> Result<ExecuteResponse> {
        self.enter("execute", Some(Stage::Execute)).await?;
        self.check_known(file_id)?;
        if !self.progress().processed_by_llm {
            return Err(PipelineError::Server {
                status: 400,
                detail: "script not generated yet".to_string(),
            });
        }
        lock(&self.progress).script_executed = true;
        Ok(ExecuteResponse {
            message: "script executed".to_string(),
            processed_rows: self.rows as u64,
        })
    }

    async fn fetch_status(&self, file_id: &str) -> Result<StatusSnapshot> {
        self.enter("status", None).await?;
        if let Some(failure) = lock(&self.status_failure).clone() {
            return Err(failure.into());
        }
        self.check_known(file_id)?;
        let flags = if self.stale_status {
            StageFlags::default()
        } else {
            self.progress()
        };
        Ok(StatusSnapshot {
            file_id: file_id.to_string(),
            flags,
        })
    }

    async fn fetch_result(&self, file_id: &str) -> Result<ResultSet> {
        self.enter("result", Some(Stage::Result)).await?;
        self.check_known(file_id)?;
        if !self.progress().script_executed {
            return Err(PipelineError::Server {
                status: 404,
                detail: "result not ready".to_string(),
            });
        }
        lock(&self.progress).ready = true;

        let columns = self.column_names();
        let rows = self.build_rows(&columns);
        ResultSet::new(file_id.to_string(), rows, columns, self.rows as u64)
    }

    async fn fetch_script(&self, file_id: &str) -> Result<String> {
        self.enter("script", None).await?;
        self.check_known(file_id)?;
        Ok("import pandas as pd\ndf = df.drop_duplicates()\n".to_string())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.enter("download", None).await?;
        self.check_known(file_id)?;
        let columns = self.column_names();
        let mut csv = columns.join(",");
        csv.push('\n');
        for row in self.build_rows(&columns) {
            let line: Vec<String> = columns
                .iter()
                .map(|c| crate::models::result_set::search_text(&row[c]))
                .collect();
            csv.push_str(&line.join(","));
            csv.push('\n');
        }
        Ok(csv.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_mock_follows_stage_order() {
        let gateway = MockGateway::new("abc123").with_result_shape(3, 2);
        let file = FileHandle::in_memory("a.csv", b"x\n".to_vec());

        assert_err!(gateway.request_processing("abc123").await);
        assert_ok!(gateway.upload(&file).await);
        assert_err!(gateway.fetch_result("abc123").await);
        assert_ok!(gateway.request_processing("abc123").await);
        assert_ok!(gateway.request_execution("abc123").await);

        let result = gateway.fetch_result("abc123").await.unwrap();
        assert_eq!(result.rows().len(), 3);
        assert_eq!(result.columns().len(), 2);
        assert!(gateway.progress().ready);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let gateway = MockGateway::new("abc123").fail_stage(
            Stage::Upload,
            MockFailure::Transport("network unreachable".to_string()),
        );
        let file = FileHandle::in_memory("a.csv", vec![]);
        let err = gateway.upload(&file).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport(_)));
        assert_eq!(gateway.calls(), vec!["upload".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_download_is_csv() {
        let gateway = MockGateway::new("abc123").with_result_shape(2, 2);
        gateway
            .upload(&FileHandle::in_memory("a.csv", vec![]))
            .await
            .unwrap();
        let bytes = gateway.download("abc123").await.unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "id,column_1\n1,r1c1\n2,r2c1\n"
        );
    }
}
