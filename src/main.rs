// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use csv_pipeline::pipeline::{ProgressSummary, ProgressTracker};
use csv_pipeline::utils::logging::{format_error, format_info, format_notification, format_success};
use csv_pipeline::view::download_report;
use csv_pipeline::{
    Config, FileHandle, Gateway, HealthCheck, HealthReport, HttpGateway, OperationTimer,
    OrchestratorSettings, PipelineOrchestrator, PipelineRecord, PipelineSnapshot, PipelineState,
    ResultSet, ResultView, SelectionController, SelectionOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const SLOW_HEALTH_THRESHOLD: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "csvpipe")]
#[command(author = "cipher")]
#[command(version)]
#[command(about = "Upload a CSV file, let an LLM clean it and inspect the result", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Backend base URL, overrides the configured one
    #[arg(long, value_name = "URL", env = "CSVPIPE_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend answers
    Health,

    /// Run a CSV file through upload, LLM processing, execution and result fetch
    Run {
        file: PathBuf,

        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Save the cleaned file once the run is ready
        #[arg(long)]
        download: bool,

        /// Resume a failed run at the failed stage up to this many times
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// Show the backend's progress flags for a file
    Status { file_id: String },

    /// Show the cleaned rows of a finished file
    Result {
        file_id: String,

        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Save the cleaned CSV for a finished file
    Download {
        file_id: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print or save the generated cleaning script
    Script {
        file_id: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    csv_pipeline::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("CSV cleaning pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let mut config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    if let Some(url) = cli.api_url {
        config = config.with_base_url(url).context("Invalid --api-url")?;
    }

    let gateway = Arc::new(HttpGateway::new(&config.gateway).context("Failed to create HTTP client")?);
    info!("Backend: {}", gateway.base_url());

    match cli.command {
        Commands::Health => {
            cmd_health(gateway.as_ref()).await?;
        }
        Commands::Run {
            file,
            search,
            page,
            download,
            retries,
        } => {
            cmd_run(&config, gateway, cli.color, file, search, page, download, retries).await?;
        }
        Commands::Status { file_id } => {
            cmd_status(gateway.as_ref(), &file_id).await?;
        }
        Commands::Result {
            file_id,
            search,
            page,
        } => {
            let result = gateway
                .fetch_result(&file_id)
                .await
                .context("Failed to fetch result")?;
            show_result(&config, Some(&result), search, page, cli.color);
        }
        Commands::Download { file_id, output } => {
            let dir = output.unwrap_or_else(|| config.view.download_dir.clone());
            let path = download_report(gateway.as_ref(), &file_id, &dir, &config.view.report_suffix)
                .await
                .context("Download failed")?;
            println!("{}", format_success(&format!("Saved {}", path.display())));
        }
        Commands::Script { file_id, output } => {
            cmd_script(gateway.as_ref(), &file_id, output).await?;
        }
    }

    Ok(())
}

async fn cmd_health(gateway: &HttpGateway) -> Result<()> {
    let timer = OperationTimer::new("health check");

    let check = match gateway.health().await {
        Ok(response) => {
            let elapsed = timer.elapsed();
            if elapsed > SLOW_HEALTH_THRESHOLD {
                HealthCheck::degraded(
                    "backend",
                    format!("{} (slow response)", response.message),
                    elapsed,
                )
            } else {
                HealthCheck::healthy("backend", Some(response.message), elapsed)
            }
        }
        Err(e) => HealthCheck::unhealthy("backend", e.user_message(), timer.elapsed()),
    };

    timer.warn_if_slow(SLOW_HEALTH_THRESHOLD, gateway.base_url());
    timer.finish();

    let report = HealthReport::new(vec![check], env!("CARGO_PKG_VERSION").to_string());
    println!("{}", report.format());

    if !report.is_healthy() {
        warn!("Backend is not fully healthy: {:?}", report.overall_status);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    config: &Config,
    gateway: Arc<HttpGateway>,
    colored: bool,
    file: PathBuf,
    search: Option<String>,
    page: usize,
    download: bool,
    retries: u32,
) -> Result<()> {
    let mut selection = SelectionController::new(config.pipeline.max_file_size_bytes());

    let candidate = match FileHandle::from_path(&file) {
        Ok(handle) => Some(handle),
        Err(e) => {
            println!("{}", format_error(&e.user_message()));
            return Err(e).context(format!("Cannot read {}", file.display()));
        }
    };

    let outcome = selection.select_file(candidate);
    println!("{}", format_notification(&outcome.notification()));
    let SelectionOutcome::Accepted(handle) = outcome else {
        return Err(anyhow::anyhow!("{} was not accepted", file.display()));
    };

    let mut orchestrator =
        PipelineOrchestrator::new(Arc::clone(&gateway), OrchestratorSettings::from(config));

    let mut updates = orchestrator.subscribe();
    let watcher = tokio::spawn(async move {
        let tracker = ProgressTracker::with_color(colored);
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            tracker.update(&snapshot);
        }
    });

    orchestrator.stage_file(handle)?;
    println!("{}", format_info("Starting the processing pipeline"));

    let mut state = orchestrator.start().await;
    let mut attempts = 0;
    while let Ok(PipelineState::Failed { stage, message }) = &state {
        if attempts >= retries {
            break;
        }
        attempts += 1;
        warn!("Retrying {} stage ({}/{}): {}", stage, attempts, retries, message);
        state = orchestrator.start().await;
    }

    orchestrator.settle_refreshes().await;
    selection.reset();
    watcher.abort();
    let _ = watcher.await;

    let state = state?;
    let snapshot = orchestrator.snapshot();
    print_progress(&snapshot);

    match state {
        PipelineState::Ready => {
            if let Some(rows) = orchestrator.record().and_then(|r| r.processed_row_count()) {
                println!("{}", format_success(&format!("{} rows processed", rows)));
            }
            show_result(config, orchestrator.result(), search, page, colored);

            if download {
                let view = ResultView::new(orchestrator.result());
                if let Some(path) = view
                    .download(gateway.as_ref(), &config.view.download_dir, &config.view.report_suffix)
                    .await
                    .context("Download failed")?
                {
                    println!("{}", format_success(&format!("Saved {}", path.display())));
                }
            }
            Ok(())
        }
        PipelineState::Failed { stage, message } => {
            println!("{}", format_error(&message));
            error!("Run failed at {} stage", stage);
            Err(anyhow::anyhow!("Pipeline failed at {} stage: {}", stage, message))
        }
        other => Err(anyhow::anyhow!("Pipeline stopped while {}", other)),
    }
}

async fn cmd_status(gateway: &HttpGateway, file_id: &str) -> Result<()> {
    let (status, script) =
        futures::future::join(gateway.fetch_status(file_id), gateway.fetch_script(file_id)).await;
    let status = status.context("Failed to fetch status")?;

    let mut record = PipelineRecord::uploaded(Uuid::new_v4(), status.file_id.clone(), String::new())?;
    record.merge_status(&status);

    let state = if record.is_ready() {
        PipelineState::Ready
    } else {
        PipelineState::Idle
    };
    print_progress(&PipelineSnapshot {
        state,
        record: Some(record),
        file_name: None,
        result_rows: None,
    });

    match script {
        Ok(script) => println!(
            "{}",
            format_info(&format!("Cleaning script available ({} lines)", script.lines().count()))
        ),
        Err(e) => info!("No cleaning script yet: {}", e.user_message()),
    }
    Ok(())
}

async fn cmd_script(gateway: &HttpGateway, file_id: &str, output: Option<PathBuf>) -> Result<()> {
    let script = gateway
        .fetch_script(file_id)
        .await
        .context("Failed to fetch script")?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, script.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", format_success(&format!("Saved {}", path.display())));
        }
        None => println!("{}", script),
    }
    Ok(())
}

fn print_progress(snapshot: &PipelineSnapshot) {
    let summary = ProgressSummary::from_snapshot(snapshot);
    println!();
    print!("{}", summary.format_steps());
    println!(
        "{}/{} steps ({:.0}%) - {}",
        summary.completed_count,
        summary.steps.len(),
        summary.percentage,
        summary.footer
    );
    if let Some(id) = &summary.short_file_id {
        println!("File ID: {}", id);
    }
}

fn show_result(
    config: &Config,
    result: Option<&ResultSet>,
    search: Option<String>,
    page: usize,
    colored: bool,
) {
    let mut view = ResultView::with_page_size(result, config.view.page_size);
    if let Some(term) = search {
        view.set_search(term);
    }
    view.go_to_page(page);

    if let Some(table) = view.render(colored) {
        println!("\n{}", table);
    }
}
