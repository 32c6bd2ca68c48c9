// file: src/gateway/mod.rs
// description: typed access to the processing backend
// reference: remote gateway contract, one HTTP round trip per operation

mod client;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use client::{HttpGateway, server_error};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockFailure, MockGateway};

use crate::error::Result;
use crate::models::{
    ExecuteResponse, FileHandle, HealthResponse, ProcessResponse, ResultSet, StatusSnapshot,
    UploadResponse,
};
use async_trait::async_trait;

/// Every operation is fallible on its own and reports failures through the
/// single [`crate::error::PipelineError`] taxonomy. Operations that take a
/// `file_id` reject an empty one with a validation error before any I/O.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn health(&self) -> Result<HealthResponse>;

    async fn upload(&self, file: &FileHandle) -> Result<UploadResponse>;

    async fn request_processing(&self, file_id: &str) -> Result<ProcessResponse>;

    async fn request_execution(&self, file_id: &str) -> Result<ExecuteResponse>;

    /// Idempotent; used only to refresh displayed progress.
    async fn fetch_status(&self, file_id: &str) -> Result<StatusSnapshot>;

    /// Only meaningful once the run is ready.
    async fn fetch_result(&self, file_id: &str) -> Result<ResultSet>;

    async fn fetch_script(&self, file_id: &str) -> Result<String>;

    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}
