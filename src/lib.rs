// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod view;

pub use config::{Config, GatewayConfig, PipelineConfig, ViewConfig};
pub use error::{PipelineError, Result};
pub use gateway::{Gateway, HttpGateway};
#[cfg(any(test, feature = "mock"))]
pub use gateway::MockGateway;
pub use models::{FileHandle, PipelineRecord, ResultSet, StageFlags, StatusSnapshot};
pub use pipeline::{
    Notification, OrchestratorSettings, PipelineOrchestrator, PipelineSnapshot, PipelineState,
    ProgressSummary, ProgressTracker, SelectionController, SelectionOutcome, Stage,
};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
pub use view::ResultView;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _settings = OrchestratorSettings::from(&config);
        let _view = ResultView::new(None);
    }
}
