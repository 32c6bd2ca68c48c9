// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod file_handle;
pub mod record;
pub mod responses;
pub mod result_set;

pub use file_handle::FileHandle;
pub use record::{PipelineRecord, StageFlags, StatusSnapshot};
pub use responses::{
    DataSummary, ErrorEnvelope, ExecuteResponse, HealthResponse, ProcessResponse, ResultResponse,
    UploadResponse,
};
pub use result_set::{ResultSet, Row};
