// file: src/pipeline/orchestrator.rs
// description: drives one file through upload, processing, execution and result fetch
// reference: sequential stage chain with best-effort status refreshes

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::gateway::Gateway;
use crate::models::{FileHandle, PipelineRecord, ResultSet, StatusSnapshot};
use crate::pipeline::state::{PipelineSnapshot, PipelineState, Stage};
use crate::utils::telemetry::OperationTimer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub call_timeout: Duration,
    pub status_refresh: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            status_refresh: true,
        }
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            call_timeout: config.gateway.timeout(),
            status_refresh: config.pipeline.status_refresh,
        }
    }
}

type RefreshOutcome = (Uuid, Result<StatusSnapshot>);

/// Owns the record of the active run. Stages run strictly one after the
/// other; only status refreshes run concurrently, and their results are
/// folded back in here.
pub struct PipelineOrchestrator<G: Gateway + 'static> {
    gateway: Arc<G>,
    settings: OrchestratorSettings,
    run_id: Uuid,
    file: Option<FileHandle>,
    state: PipelineState,
    record: Option<PipelineRecord>,
    result: Option<ResultSet>,
    refreshes: JoinSet<RefreshOutcome>,
    updates: watch::Sender<PipelineSnapshot>,
}

impl<G: Gateway + 'static> PipelineOrchestrator<G> {
    pub fn new(gateway: Arc<G>, settings: OrchestratorSettings) -> Self {
        let (updates, _) = watch::channel(PipelineSnapshot::idle());
        Self {
            gateway,
            settings,
            run_id: Uuid::new_v4(),
            file: None,
            state: PipelineState::Idle,
            record: None,
            result: None,
            refreshes: JoinSet::new(),
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn record(&self) -> Option<&PipelineRecord> {
        self.record.as_ref()
    }

    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    pub fn file(&self) -> Option<&FileHandle> {
        self.file.as_ref()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            state: self.state.clone(),
            record: self.record.clone(),
            file_name: self.file.as_ref().map(|f| f.name().to_string()),
            result_rows: self.result.as_ref().map(|r| r.rows().len()),
        }
    }

    /// Stages an accepted file. Staging over a finished or failed run
    /// discards that run first.
    pub fn stage_file(&mut self, file: FileHandle) -> Result<()> {
        if self.state.is_busy() {
            return Err(PipelineError::InvalidTransition(format!(
                "cannot stage a file while {}",
                self.state
            )));
        }

        if self.state != PipelineState::Idle || self.record.is_some() {
            self.clear();
        }

        info!(run_id = %self.run_id, "Staged file {}", file.name());
        self.file = Some(file);
        self.publish();
        Ok(())
    }

    /// Discards the run. In-flight refreshes are left to finish and their
    /// results are dropped.
    pub fn clear(&mut self) {
        self.refreshes.detach_all();
        if let Some(record) = &self.record {
            debug!(run_id = %self.run_id, file_id = record.file_id(), "Clearing run");
        }
        self.run_id = Uuid::new_v4();
        self.file = None;
        self.state = PipelineState::Idle;
        self.record = None;
        self.result = None;
        self.publish();
    }

    /// Runs the remaining stages to completion or to the first failure.
    ///
    /// From `Idle` this starts at upload; from `Failed(stage)` it resumes at
    /// that stage with the already obtained file id. In any other state it
    /// does nothing.
    pub async fn start(&mut self) -> Result<PipelineState> {
        if !self.state.can_start() {
            warn!(run_id = %self.run_id, "Ignoring start while {}", self.state);
            return Ok(self.state.clone());
        }

        if let Some(stage) = self.state.failed_stage() {
            info!(run_id = %self.run_id, "Resuming run at {} stage", stage);
            self.state = stage.resume_state();
            if let Some(record) = self.record.as_mut() {
                record.clear_error();
            }
        }

        if self.state == PipelineState::Idle && self.file.is_none() {
            return Err(PipelineError::Validation("no file supplied".to_string()));
        }

        while self.step().await? {}

        Ok(self.state.clone())
    }

    /// Performs the single transition implied by the current state.
    /// Returns `false` when there is nothing left to do.
    pub async fn step(&mut self) -> Result<bool> {
        match self.state {
            PipelineState::Idle => self.run_upload().await?,
            PipelineState::Uploaded => self.run_process().await,
            PipelineState::Processed => self.run_execute().await,
            PipelineState::Executed => self.run_fetch_result().await,
            _ => return Ok(false),
        }

        self.schedule_refresh();
        self.drain_refreshes();
        self.publish();
        Ok(true)
    }

    /// Waits for every pending status refresh and merges the results.
    pub async fn settle_refreshes(&mut self) {
        while let Some(joined) = self.refreshes.join_next().await {
            self.apply_refresh(joined);
        }
        self.publish();
    }

    async fn run_upload(&mut self) -> Result<()> {
        let file = self
            .file
            .clone()
            .ok_or_else(|| PipelineError::Validation("no file supplied".to_string()))?;

        self.enter(PipelineState::Uploading);
        let timer = OperationTimer::new(&format!("upload {}", file.name()));

        let outcome = bounded(
            self.settings.call_timeout,
            Stage::Upload.name(),
            self.gateway.upload(&file),
        )
        .await
        .and_then(|response| {
            PipelineRecord::uploaded(self.run_id, response.file_id, file.name().to_string())
        });
        timer.finish();

        match outcome {
            Ok(record) => {
                info!(run_id = %self.run_id, file_id = record.file_id(), "Upload complete");
                self.record = Some(record);
                self.state = PipelineState::Uploaded;
            }
            Err(e) => self.fail(Stage::Upload, e),
        }
        Ok(())
    }

    async fn run_process(&mut self) {
        let file_id = self.current_file_id();
        self.enter(PipelineState::Processing);
        let timer = OperationTimer::new("llm processing");

        let outcome = bounded(
            self.settings.call_timeout,
            Stage::Process.name(),
            self.gateway.request_processing(&file_id),
        )
        .await
        .and_then(|response| {
            if response.file_id != file_id {
                return Err(PipelineError::MalformedResponse(format!(
                    "process response for {} while processing {}",
                    response.file_id, file_id
                )));
            }
            let record = self.record_mut()?;
            record.mark_processed(response.script, response.data_summary)?;
            Ok(response.message)
        });
        timer.finish();

        match outcome {
            Ok(message) => {
                info!(run_id = %self.run_id, file_id = %file_id, "Processing complete: {}", message);
                self.state = PipelineState::Processed;
            }
            Err(e) => self.fail(Stage::Process, e),
        }
    }

    async fn run_execute(&mut self) {
        let file_id = self.current_file_id();
        self.enter(PipelineState::Executing);
        let timer = OperationTimer::new("script execution");

        let outcome = bounded(
            self.settings.call_timeout,
            Stage::Execute.name(),
            self.gateway.request_execution(&file_id),
        )
        .await
        .and_then(|response| {
            let record = self.record_mut()?;
            record.mark_executed(response.processed_rows)?;
            Ok(response.processed_rows)
        });
        timer.finish();

        match outcome {
            Ok(rows) => {
                info!(run_id = %self.run_id, file_id = %file_id, "Script executed over {} rows", rows);
                self.state = PipelineState::Executed;
            }
            Err(e) => self.fail(Stage::Execute, e),
        }
    }

    async fn run_fetch_result(&mut self) {
        let file_id = self.current_file_id();
        self.enter(PipelineState::FetchingResult);
        let timer = OperationTimer::new("result fetch");

        let outcome = bounded(
            self.settings.call_timeout,
            Stage::Result.name(),
            self.gateway.fetch_result(&file_id),
        )
        .await
        .and_then(|result| {
            if result.file_id() != file_id {
                return Err(PipelineError::MalformedResponse(format!(
                    "result for {} while fetching {}",
                    result.file_id(),
                    file_id
                )));
            }
            self.record_mut()?.mark_ready()?;
            Ok(result)
        });
        timer.finish();

        match outcome {
            Ok(result) => {
                info!(
                    run_id = %self.run_id,
                    file_id = %file_id,
                    "Result ready: {} rows, {} columns",
                    result.rows().len(),
                    result.columns().len()
                );
                self.result = Some(result);
                self.state = PipelineState::Ready;
                self.file = None;
            }
            Err(e) => self.fail(Stage::Result, e),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        debug!(run_id = %self.run_id, "Entering {}", state);
        self.state = state;
        self.publish();
    }

    fn fail(&mut self, stage: Stage, err: PipelineError) {
        let message = err.user_message();
        error!(run_id = %self.run_id, stage = %stage, "Stage failed: {}", err);
        if let Some(record) = self.record.as_mut() {
            record.set_error(message.clone());
        }
        self.state = PipelineState::Failed { stage, message };
    }

    fn current_file_id(&self) -> String {
        self.record
            .as_ref()
            .map(|r| r.file_id().to_string())
            .unwrap_or_default()
    }

    fn record_mut(&mut self) -> Result<&mut PipelineRecord> {
        self.record
            .as_mut()
            .ok_or_else(|| PipelineError::InvalidTransition("no active record".to_string()))
    }

    fn schedule_refresh(&mut self) {
        if !self.settings.status_refresh {
            return;
        }
        let Some(file_id) = self.record.as_ref().map(|r| r.file_id().to_string()) else {
            return;
        };

        let gateway = Arc::clone(&self.gateway);
        let run_id = self.run_id;
        let timeout = self.settings.call_timeout;
        self.refreshes.spawn(async move {
            let status = bounded(timeout, "status", gateway.fetch_status(&file_id)).await;
            (run_id, status)
        });
    }

    fn drain_refreshes(&mut self) {
        while let Some(joined) = self.refreshes.try_join_next() {
            self.apply_refresh(joined);
        }
    }

    fn apply_refresh(&mut self, joined: std::result::Result<RefreshOutcome, JoinError>) {
        match joined {
            Ok((run_id, _)) if run_id != self.run_id => {
                debug!("Discarding status refresh from finished run {}", run_id);
            }
            Ok((_, Ok(snapshot))) => {
                let run_id = self.run_id;
                if let Some(record) = self.record.as_mut() {
                    if record.merge_status(&snapshot) {
                        debug!(run_id = %run_id, "Status refresh advanced {:?}", record.flags());
                    }
                }
            }
            Ok((_, Err(e))) => {
                debug!(run_id = %self.run_id, "Status refresh failed, ignoring: {}", e);
            }
            Err(e) => warn!("Status refresh task failed: {}", e),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

async fn bounded<T>(
    timeout: Duration,
    operation: &str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Transport(format!(
            "{} request timed out after {}s",
            operation,
            timeout.as_secs_f64()
        ))),
    }
}
