// file: src/models/record.rs
// description: per-run stage completion flags and stage outputs
// reference: monotonic, strictly ordered stage flags

use crate::error::{PipelineError, Result};
use crate::models::responses::DataSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flags as reported by `GET /api/v1/status/{file_id}`.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StageFlags {
    pub uploaded: bool,
    pub processed_by_llm: bool,
    pub script_executed: bool,
    pub ready: bool,
}

impl StageFlags {
    pub fn as_array(&self) -> [bool; 4] {
        [
            self.uploaded,
            self.processed_by_llm,
            self.script_executed,
            self.ready,
        ]
    }

    /// True when no flag is set without its predecessor.
    pub fn is_ordered(&self) -> bool {
        self.as_array().windows(2).all(|pair| pair[0] || !pair[1])
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StatusSnapshot {
    pub file_id: String,
    #[serde(flatten)]
    pub flags: StageFlags,
}

/// State of one accepted file across the four stages.
///
/// Created once upload succeeds. Flags only move forward: the `mark_*`
/// methods refuse to skip a stage and [`PipelineRecord::merge_status`]
/// never clears a flag.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineRecord {
    run_id: Uuid,
    file_id: String,
    filename: String,
    flags: StageFlags,
    processed_row_count: Option<u64>,
    last_error: Option<String>,
    script: Option<String>,
    data_summary: Option<DataSummary>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PipelineRecord {
    pub fn uploaded(run_id: Uuid, file_id: String, filename: String) -> Result<Self> {
        if file_id.trim().is_empty() {
            return Err(PipelineError::MalformedResponse(
                "upload returned an empty file_id".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            run_id,
            file_id,
            filename,
            flags: StageFlags {
                uploaded: true,
                ..StageFlags::default()
            },
            processed_row_count: None,
            last_error: None,
            script: None,
            data_summary: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn flags(&self) -> StageFlags {
        self.flags
    }

    pub fn is_uploaded(&self) -> bool {
        self.flags.uploaded
    }

    pub fn is_processed_by_llm(&self) -> bool {
        self.flags.processed_by_llm
    }

    pub fn is_script_executed(&self) -> bool {
        self.flags.script_executed
    }

    pub fn is_ready(&self) -> bool {
        self.flags.ready
    }

    pub fn processed_row_count(&self) -> Option<u64> {
        self.processed_row_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn data_summary(&self) -> Option<&DataSummary> {
        self.data_summary.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn mark_processed(
        &mut self,
        script: Option<String>,
        data_summary: Option<DataSummary>,
    ) -> Result<()> {
        if !self.flags.uploaded {
            return Err(PipelineError::InvalidTransition(
                "cannot mark processed before upload".to_string(),
            ));
        }
        self.flags.processed_by_llm = true;
        if script.is_some() {
            self.script = script;
        }
        if data_summary.is_some() {
            self.data_summary = data_summary;
        }
        self.touch();
        Ok(())
    }

    pub fn mark_executed(&mut self, processed_rows: u64) -> Result<()> {
        if !self.flags.processed_by_llm {
            return Err(PipelineError::InvalidTransition(
                "cannot mark executed before llm processing".to_string(),
            ));
        }
        self.flags.script_executed = true;
        self.processed_row_count = Some(processed_rows);
        self.touch();
        Ok(())
    }

    pub fn mark_ready(&mut self) -> Result<()> {
        if !self.flags.script_executed {
            return Err(PipelineError::InvalidTransition(
                "cannot mark ready before script execution".to_string(),
            ));
        }
        self.flags.ready = true;
        self.touch();
        Ok(())
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.touch();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Folds a status refresh into the record.
    ///
    /// A flag becomes true only if the snapshot reports it and its
    /// predecessor is already true after merging. Snapshots for another
    /// file id are ignored. Returns whether anything changed.
    pub fn merge_status(&mut self, snapshot: &StatusSnapshot) -> bool {
        if snapshot.file_id != self.file_id {
            return false;
        }

        let before = self.flags;
        let incoming = snapshot.flags;

        self.flags.uploaded |= incoming.uploaded;
        self.flags.processed_by_llm |= incoming.processed_by_llm && self.flags.uploaded;
        self.flags.script_executed |= incoming.script_executed && self.flags.processed_by_llm;
        self.flags.ready |= incoming.ready && self.flags.script_executed;

        let changed = self.flags != before;
        if changed {
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
