// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod orchestrator;
pub mod progress;
pub mod selection;
pub mod state;

pub use orchestrator::{OrchestratorSettings, PipelineOrchestrator};
pub use progress::{ProgressSummary, ProgressTracker, StepKind, StepView, derive_steps};
pub use selection::{Notification, NotificationLevel, SelectionController, SelectionOutcome};
pub use state::{PipelineSnapshot, PipelineState, Stage};
