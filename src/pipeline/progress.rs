// file: src/pipeline/progress.rs
// description: four-step progress derivation and terminal progress rendering
// reference: uses indicatif for progress bars over pipeline snapshots

use crate::models::PipelineRecord;
use crate::pipeline::state::{PipelineSnapshot, PipelineState};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    Upload,
    LlmProcessing,
    Execution,
    Ready,
}

impl StepKind {
    pub const ORDER: [StepKind; 4] = [
        StepKind::Upload,
        StepKind::LlmProcessing,
        StepKind::Execution,
        StepKind::Ready,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StepKind::Upload => "Upload",
            StepKind::LlmProcessing => "Processed by LLM",
            StepKind::Execution => "Script Executed",
            StepKind::Ready => "Result Returned",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StepKind::Upload => "File sent to the server",
            StepKind::LlmProcessing => "AI analysing data and generating a cleaning script",
            StepKind::Execution => "Transformations applied to the data",
            StepKind::Ready => "Processed data available to the user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub kind: StepKind,
    pub completed: bool,
    pub processing: bool,
}

/// Step `i` is completed when flag `i` is set, and processing when its
/// predecessor is set but it is not (for the first step: a record exists).
pub fn derive_steps(record: Option<&PipelineRecord>) -> [StepView; 4] {
    let flags = record.map(|r| r.flags().as_array());

    std::array::from_fn(|i| {
        let kind = StepKind::ORDER[i];
        match flags {
            None => StepView {
                kind,
                completed: false,
                processing: false,
            },
            Some(flags) => {
                let started = if i == 0 { true } else { flags[i - 1] };
                StepView {
                    kind,
                    completed: flags[i],
                    processing: started && !flags[i],
                }
            }
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub steps: [StepView; 4],
    pub completed_count: usize,
    pub percentage: f64,
    pub footer: String,
    pub short_file_id: Option<String>,
    pub error: Option<String>,
}

impl ProgressSummary {
    pub fn from_snapshot(snapshot: &PipelineSnapshot) -> Self {
        let steps = derive_steps(snapshot.record.as_ref());
        let completed_count = steps.iter().filter(|s| s.completed).count();
        let percentage = completed_count as f64 / steps.len() as f64 * 100.0;
        let error = snapshot.state.error_message().map(str::to_string);
        let ready = snapshot.record.as_ref().is_some_and(|r| r.is_ready());

        let footer = if ready {
            "Processing completed successfully!"
        } else if error.is_some() {
            "Processing error"
        } else if snapshot.state.is_busy() {
            "Checking status..."
        } else {
            "Waiting for processing to start"
        }
        .to_string();

        let short_file_id = snapshot
            .record
            .as_ref()
            .map(|r| format!("{}...", r.file_id().chars().take(8).collect::<String>()));

        Self {
            steps,
            completed_count,
            percentage,
            footer,
            short_file_id,
            error,
        }
    }

    /// Step currently in flight, if any.
    pub fn active_step(&self) -> Option<&StepView> {
        self.steps.iter().find(|s| s.processing)
    }

    pub fn format_steps(&self) -> String {
        let mut output = String::new();
        for (idx, step) in self.steps.iter().enumerate() {
            let marker = if step.completed {
                "✓".green().bold()
            } else if step.processing && self.error.is_some() {
                "✗".red().bold()
            } else if step.processing {
                "…".cyan().bold()
            } else {
                "○".dimmed()
            };
            output.push_str(&format!(
                "{} {}. {} - {}\n",
                marker,
                idx + 1,
                step.kind.title(),
                step.kind.description()
            ));
        }
        output
    }
}

/// Renders snapshots as a four-position bar plus a detail line.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_color(true)
    }

    pub fn with_color(colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, StepKind::ORDER.len() as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
        }
    }

    pub fn update(&self, snapshot: &PipelineSnapshot) {
        let summary = ProgressSummary::from_snapshot(snapshot);
        self.main_bar.set_position(summary.completed_count as u64);

        let title = match (&snapshot.state, summary.active_step()) {
            (PipelineState::Uploading, _) => StepKind::Upload.title().to_string(),
            (_, Some(step)) => step.kind.title().to_string(),
            _ => snapshot.state.to_string(),
        };
        self.main_bar.set_message(title);

        let detail = match &summary.short_file_id {
            Some(id) => format!("{} | File ID: {}", summary.footer, id),
            None => summary.footer.clone(),
        };
        self.detail_bar.set_message(detail);
    }

    pub fn finish(&self) {
        self.main_bar.finish();
        self.detail_bar.finish_and_clear();
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let template = if colored {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
    } else {
        "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"
    };
    let chars = if colored { "█▓▒░" } else { "=>-" };

    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars);
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StageFlags, StatusSnapshot};
    use crate::pipeline::state::Stage;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn record_with(flags: [bool; 4]) -> PipelineRecord {
        let mut record =
            PipelineRecord::uploaded(Uuid::new_v4(), "abc123def456".to_string(), "a.csv".to_string())
                .unwrap();
        record.merge_status(&StatusSnapshot {
            file_id: "abc123def456".to_string(),
            flags: StageFlags {
                uploaded: flags[0],
                processed_by_llm: flags[1],
                script_executed: flags[2],
                ready: flags[3],
            },
        });
        record
    }

    fn snapshot(state: PipelineState, record: Option<PipelineRecord>) -> PipelineSnapshot {
        PipelineSnapshot {
            state,
            record,
            file_name: None,
            result_rows: None,
        }
    }

    #[test]
    fn test_derive_steps_mid_pipeline() {
        let record = record_with([true, true, false, false]);
        let steps = derive_steps(Some(&record));

        assert!(steps[0].completed && steps[1].completed);
        assert!(!steps[0].processing && !steps[1].processing);
        assert_eq!(steps[2].kind, StepKind::Execution);
        assert!(steps[2].processing);
        assert!(!steps[2].completed);
        assert!(!steps[3].processing && !steps[3].completed);
    }

    #[test]
    fn test_derive_steps_without_record() {
        let steps = derive_steps(None);
        assert!(steps.iter().all(|s| !s.completed && !s.processing));
    }

    #[test]
    fn test_derive_steps_is_deterministic() {
        let record = record_with([true, true, true, false]);
        assert_eq!(derive_steps(Some(&record)), derive_steps(Some(&record.clone())));
    }

    #[test]
    fn test_at_most_one_step_processing() {
        for n in 0..=4 {
            let mut flags = [false; 4];
            flags.iter_mut().take(n).for_each(|f| *f = true);
            flags[0] = true;
            let record = record_with(flags);
            let processing = derive_steps(Some(&record))
                .iter()
                .filter(|s| s.processing)
                .count();
            assert!(processing <= 1);
        }
    }

    #[test]
    fn test_summary_ready() {
        let summary = ProgressSummary::from_snapshot(&snapshot(
            PipelineState::Ready,
            Some(record_with([true; 4])),
        ));
        assert_eq!(summary.completed_count, 4);
        assert_eq!(summary.percentage, 100.0);
        assert_eq!(summary.footer, "Processing completed successfully!");
        assert_eq!(summary.short_file_id.as_deref(), Some("abc123de..."));
        assert!(summary.active_step().is_none());
    }

    #[test]
    fn test_summary_failed() {
        let summary = ProgressSummary::from_snapshot(&snapshot(
            PipelineState::Failed {
                stage: Stage::Execute,
                message: "script failed".to_string(),
            },
            Some(record_with([true, true, false, false])),
        ));
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.percentage, 50.0);
        assert_eq!(summary.footer, "Processing error");
        assert_eq!(summary.error.as_deref(), Some("script failed"));
        assert_eq!(summary.active_step().map(|s| s.kind), Some(StepKind::Execution));
    }

    #[test]
    fn test_summary_idle_and_busy() {
        let idle = ProgressSummary::from_snapshot(&PipelineSnapshot::idle());
        assert_eq!(idle.footer, "Waiting for processing to start");
        assert_eq!(idle.completed_count, 0);

        let busy = ProgressSummary::from_snapshot(&snapshot(PipelineState::Uploading, None));
        assert_eq!(busy.footer, "Checking status...");
    }

    #[test]
    fn test_tracker_accepts_updates() {
        let tracker = ProgressTracker::with_color(false);
        tracker.update(&snapshot(
            PipelineState::Processing,
            Some(record_with([true, false, false, false])),
        ));
        tracker.finish();
    }
}
