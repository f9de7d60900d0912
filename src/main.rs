//! loadcast - CLI for the load-forecast pipeline.
//!
//! Usage:
//!   loadcast upload <file> --year 2026 [--out forecast.csv]
//!   loadcast watch <job_id>
//!   loadcast download <job_id> <dest>
//!   loadcast set-key <key>

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use loadcast_client::api::PipelineClient;
use loadcast_client::config::Config;
use loadcast_client::models::{JobStage, JobStatus, QualityReport, STAGE_ORDER, expected_hours};
use loadcast_client::services::{
    CredentialStore, JobPoller, JobResults, PollEvent, ResultAggregator, SessionController,
    TrackingView,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return ExitCode::from(2);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args[1].as_str() {
        "upload" => cmd_upload(&config, &args[2..]).await,
        "watch" => cmd_watch(&config, &args[2..]).await,
        "download" => cmd_download(&config, &args[2..]).await,
        "set-key" => cmd_set_key(&args[2..]),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("loadcast - client for the load-forecast pipeline");
    println!();
    println!("Commands:");
    println!("  upload <file> --year <Y> [--out <csv>]   Upload a load profile and track the job");
    println!("  watch <job_id>                           Track an existing job");
    println!("  download <job_id> <dest>                 Download the forecast CSV");
    println!("  set-key <key>                            Store the API key");
    println!();
    println!("Environment:");
    println!("  LOADCAST_API_URL           API base URL (default http://127.0.0.1:8000)");
    println!("  LOADCAST_API_KEY           API key (overrides the stored one)");
    println!("  LOADCAST_POLL_INTERVAL_MS  Poll interval (default 3000)");
}

/// Build the API client from env key or stored credential.
fn build_client(
    config: &Config,
    session: &SessionController,
) -> Result<Arc<PipelineClient>, String> {
    let api_key = config
        .api_key
        .clone()
        .or_else(|| session.api_key().cloned())
        .ok_or_else(|| {
            "No API key configured. Set LOADCAST_API_KEY or run `loadcast set-key <key>`."
                .to_string()
        })?;

    let client = PipelineClient::new(config.api_url.clone(), api_key)
        .map_err(|e| format!("Failed to initialize client: {}", e.user_message()))?;
    Ok(Arc::new(client))
}

fn parse_upload_args(args: &[String]) -> Result<(PathBuf, i32, Option<PathBuf>), String> {
    let mut file: Option<PathBuf> = None;
    let mut year: Option<i32> = None;
    let mut out: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--year" | "-y" => {
                i += 1;
                year = Some(
                    args.get(i)
                        .and_then(|v| v.parse().ok())
                        .ok_or("--year requires a numeric value")?,
                );
            }
            "--out" | "-o" => {
                i += 1;
                out = Some(PathBuf::from(
                    args.get(i).ok_or("--out requires a path")?,
                ));
            }
            // Only a non-flag token can be the positional; a mistyped flag
            // must not be swallowed as the file name.
            other if file.is_none() && !other.starts_with('-') => {
                file = Some(PathBuf::from(other));
            }
            other => return Err(format!("Unexpected argument: {other}")),
        }
        i += 1;
    }

    let file = file.ok_or("Missing <file> argument")?;
    let year = year.ok_or("Missing --year argument")?;
    Ok((file, year, out))
}

async fn cmd_upload(config: &Config, args: &[String]) -> Result<(), String> {
    let (file, year, out) = parse_upload_args(args)?;

    let mut session = SessionController::new(CredentialStore::new());
    let client = build_client(config, &session)?;

    let accepted = client
        .create_job(&file, year)
        .await
        .map_err(|e| format!("Upload failed: {}", e.user_message()))?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    session.job_accepted(accepted.job_id, file_name, year);
    println!("Job {} created, tracking...", accepted.job_id);

    let final_status = track_job(&client, config, accepted.job_id).await?;
    let Some(final_status) = final_status else {
        // Cancelled from the keyboard
        return Ok(());
    };

    match final_status.status {
        JobStage::Complete => {
            session.job_completed(accepted.job_id);
            show_results(&client, accepted.job_id, year).await?;
            if let Some(dest) = out {
                download_forecast(&client, accepted.job_id, &dest).await?;
            }
            Ok(())
        }
        JobStage::Failed => Err(format!(
            "Pipeline failed: {}",
            final_status
                .error_message
                .as_deref()
                .unwrap_or("no error message recorded")
        )),
        other => Err(format!("Tracking ended at non-terminal stage '{other}'")),
    }
}

async fn cmd_watch(config: &Config, args: &[String]) -> Result<(), String> {
    let job_id = parse_job_id(args.first())?;
    let session = SessionController::new(CredentialStore::new());
    let client = build_client(config, &session)?;

    let Some(final_status) = track_job(&client, config, job_id).await? else {
        return Ok(());
    };

    match final_status.status {
        JobStage::Complete => show_results(&client, job_id, final_status.forecast_year).await,
        JobStage::Failed => Err(format!(
            "Pipeline failed: {}",
            final_status
                .error_message
                .as_deref()
                .unwrap_or("no error message recorded")
        )),
        other => Err(format!("Tracking ended at non-terminal stage '{other}'")),
    }
}

async fn cmd_download(config: &Config, args: &[String]) -> Result<(), String> {
    let job_id = parse_job_id(args.first())?;
    let dest = args
        .get(1)
        .map(PathBuf::from)
        .ok_or("Missing <dest> argument")?;

    let session = SessionController::new(CredentialStore::new());
    let client = build_client(config, &session)?;
    download_forecast(&client, job_id, &dest).await
}

fn cmd_set_key(args: &[String]) -> Result<(), String> {
    let key = args.first().ok_or("Missing <key> argument")?;
    if key.is_empty() {
        return Err("API key must not be empty".to_string());
    }

    let mut session = SessionController::new(CredentialStore::new());
    session.set_api_key(SecretString::from(key.clone()));
    println!("API key stored.");
    Ok(())
}

fn parse_job_id(arg: Option<&String>) -> Result<Uuid, String> {
    let raw = arg.ok_or("Missing <job_id> argument")?;
    Uuid::parse_str(raw).map_err(|_| format!("Not a valid job id: {raw}"))
}

/// Poll the job until a terminal stage, printing stage progress and transient
/// errors. Returns `None` when cancelled via Ctrl-C.
async fn track_job(
    client: &Arc<PipelineClient>,
    config: &Config,
    job_id: Uuid,
) -> Result<Option<JobStatus>, String> {
    let poller = JobPoller::new(Arc::clone(client), config.poll_interval);
    let (handle, mut rx) = poller.track(job_id);

    let mut view = TrackingView::default();
    let mut last_printed: Option<JobStage> = None;

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(event) = maybe else { break };
                view.apply(&event);
                match &event {
                    PollEvent::Status(status) => {
                        if last_printed != Some(status.status) {
                            print_stage(status.status);
                            last_printed = Some(status.status);
                        }
                        if status.status.is_terminal() {
                            return Ok(Some(status.clone()));
                        }
                    }
                    PollEvent::TransientError(message) => match view.last_status() {
                        Some(status) => eprintln!(
                            "error: {message} - retrying (last stage: {})...",
                            status.status.label()
                        ),
                        None => eprintln!("error: {message} - retrying..."),
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                println!("Tracking cancelled. Job {job_id} keeps running server-side.");
                return Ok(None);
            }
        }
    }

    // Receiver closed without a terminal status
    Err("Status stream ended unexpectedly".to_string())
}

fn print_stage(stage: JobStage) {
    match stage.progress_index() {
        Some(index) => println!("[{}/{}] {}", index + 1, STAGE_ORDER.len(), stage.label()),
        None => println!("[-/{}] {}", STAGE_ORDER.len(), stage.label()),
    }
}

async fn show_results(
    client: &Arc<PipelineClient>,
    job_id: Uuid,
    forecast_year: i32,
) -> Result<(), String> {
    let aggregator = ResultAggregator::new(Arc::clone(client));
    let results = aggregator.load(job_id).await;
    render_results(&results, forecast_year);
    Ok(())
}

fn render_results(results: &JobResults, forecast_year: i32) {
    if let Some(error) = &results.load_error {
        eprintln!("Some results could not be loaded: {error}");
    }

    match &results.quality {
        Some(report) => render_quality(report),
        None => println!("Quality report: not available"),
    }

    match &results.forecast {
        Some(forecast) => {
            println!("Forecast: {} hours for {}", forecast.hours, forecast.forecast_year);
            println!(
                "  confidence interval: {:.0}%",
                forecast.confidence_interval * 100.0
            );
            if forecast.hours != expected_hours(forecast_year) {
                println!(
                    "  note: expected {} hours for {}",
                    expected_hours(forecast_year),
                    forecast_year
                );
            }
            if let (Some(first), Some(last)) = (forecast.data.first(), forecast.data.last()) {
                println!("  first hour: {} yhat={:.2}", first.hour_ts, first.yhat);
                println!("  last hour:  {} yhat={:.2}", last.hour_ts, last.yhat);
            }
        }
        None => println!("Forecast: not available"),
    }
}

fn render_quality(report: &QualityReport) {
    println!(
        "Quality report: {}",
        if report.passed { "PASSED" } else { "FAILED" }
    );
    if let Some(error) = &report.error {
        println!("  {error}");
        return;
    }
    println!(
        "  coverage: {:.2}% ({} missing hours)",
        report.coverage_percent, report.missing_hours
    );
    if let Some(mean) = report.statistics.mean_kw {
        println!("  mean load: {mean:.1} kW");
    }
    println!(
        "  outliers: {} ({}), flat periods: {} ({} h)",
        report.outliers.count,
        report.outliers.method,
        report.flat_periods.count,
        report.flat_periods.total_hours
    );
}

async fn download_forecast(
    client: &Arc<PipelineClient>,
    job_id: Uuid,
    dest: &Path,
) -> Result<(), String> {
    let aggregator = ResultAggregator::new(Arc::clone(client));
    aggregator
        .download(job_id, dest)
        .await
        .map_err(|e| format!("Download failed: {e}"))?;
    println!("Forecast saved to {}", dest.display());
    Ok(())
}
