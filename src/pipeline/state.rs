// file: src/pipeline/state.rs
// description: pipeline stages, orchestrator states and observable snapshots
// reference: upload -> process -> execute -> result state machine

use crate::models::PipelineRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four sequential remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Upload,
    Process,
    Execute,
    Result,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Process => "process",
            Stage::Execute => "execute",
            Stage::Result => "result",
        }
    }

    /// State the run returns to when this stage is retried.
    pub fn resume_state(&self) -> PipelineState {
        match self {
            Stage::Upload => PipelineState::Idle,
            Stage::Process => PipelineState::Uploaded,
            Stage::Execute => PipelineState::Processed,
            Stage::Result => PipelineState::Executed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Uploading,
    Uploaded,
    Processing,
    Processed,
    Executing,
    Executed,
    FetchingResult,
    Ready,
    Failed { stage: Stage, message: String },
}

impl PipelineState {
    /// `Ready` and `Failed` end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Ready | PipelineState::Failed { .. })
    }

    /// A call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Uploading
                | PipelineState::Processing
                | PipelineState::Executing
                | PipelineState::FetchingResult
        )
    }

    /// Whether `start` may begin or resume a run from here.
    pub fn can_start(&self) -> bool {
        matches!(self, PipelineState::Idle | PipelineState::Failed { .. })
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PipelineState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Uploading => write!(f, "uploading"),
            PipelineState::Uploaded => write!(f, "uploaded"),
            PipelineState::Processing => write!(f, "processing"),
            PipelineState::Processed => write!(f, "processed"),
            PipelineState::Executing => write!(f, "executing"),
            PipelineState::Executed => write!(f, "executed"),
            PipelineState::FetchingResult => write!(f, "fetching result"),
            PipelineState::Ready => write!(f, "ready"),
            PipelineState::Failed { stage, message } => {
                write!(f, "failed at {}: {}", stage, message)
            }
        }
    }
}

/// What progress views observe after each transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    pub state: PipelineState,
    pub record: Option<PipelineRecord>,
    pub file_name: Option<String>,
    pub result_rows: Option<usize>,
}

impl PipelineSnapshot {
    pub fn idle() -> Self {
        Self {
            state: PipelineState::Idle,
            record: None,
            file_name: None,
            result_rows: None,
        }
    }
}
