//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - checks the run gate
//! - loads settings and the route list
//! - runs the acquisition pipeline
//! - writes the artifact, uploads it, and sends the status message

use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, GateArgs, RunArgs};
use crate::config::{Settings, StorageTarget};
use crate::data::AmadeusClient;
use crate::domain::schedule::is_run_day;
use crate::domain::{AcquireSettings, PROVIDER_MAX_RESULTS};
use crate::error::AppError;
use crate::notify::TelegramNotifier;
use crate::storage::{ObjectStore, S3Store};

pub mod pipeline;
pub mod publish;

/// Entry point for the `fares` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // `fares` and `fares --force` behave like `fares run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Gate(args) => handle_gate(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed (tests, embedding); that one wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    if !args.force && !is_run_day(today, args.weekday) {
        tracing::info!(%today, weekday = %args.weekday, "Not a scheduled run day; nothing to do");
        return Ok(());
    }

    let acquire_settings = acquire_settings_from_args(&args)?;
    let timeout = Duration::from_secs(args.timeout_secs);
    let settings = Settings::from_env()?;

    let route_list = crate::io::load_routes(&args.routes)?;
    for row in &route_list.row_errors {
        tracing::warn!(line = row.line, "Skipping route row: {}", row.message);
    }
    if route_list.routes.is_empty() {
        tracing::warn!(path = %args.routes.display(), "Route list has no usable routes");
    }
    tracing::info!(
        routes = route_list.routes.len(),
        rows_read = route_list.rows_read,
        "Route list loaded"
    );

    let provider = AmadeusClient::new(settings.amadeus, settings.host, timeout)
        .map_err(|e| AppError::config(format!("Failed to build provider client: {e}")))?;

    let acquisition = pipeline::acquire(&provider, &route_list.routes, &acquire_settings, today);

    std::fs::create_dir_all(&args.output_dir).map_err(|e| {
        AppError::output(format!(
            "Failed to create output directory '{}': {e}",
            args.output_dir.display()
        ))
    })?;
    let artifact = args.output_dir.join(crate::io::artifact_file_name(today));
    crate::io::write_fares_csv(&artifact, &acquisition.records)?;

    println!("{}", crate::report::format_run_summary(&acquisition, &artifact));

    let targets = if args.no_upload {
        Vec::new()
    } else {
        upload_targets(settings.storage, timeout)
    };
    let report = publish::publish(&artifact, &targets, &args.archive_dir);
    if report.uploads.is_empty() {
        tracing::info!(path = %artifact.display(), "No upload targets; artifact kept in place");
    } else if report.all_uploaded() {
        tracing::info!(disposition = ?report.disposition, "Artifact uploaded to every target");
    } else {
        tracing::warn!(disposition = ?report.disposition, "Artifact not uploaded everywhere");
    }

    if args.no_notify {
        return Ok(());
    }
    match &settings.telegram {
        Some(telegram) => {
            match TelegramNotifier::new(telegram.token.clone(), telegram.chat_id, timeout) {
                Ok(notifier) => {
                    publish::send_status(&notifier, acquisition.records.len(), &report.uploads);
                }
                Err(e) => tracing::warn!(error = %e, "Could not build notifier"),
            }
        }
        None => tracing::debug!("No notification channel configured"),
    }

    Ok(())
}

fn handle_gate(args: GateArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let verdict = if is_run_day(date, args.weekday) {
        "run day"
    } else {
        "not a run day"
    };
    println!("{date}: {verdict}");
    Ok(())
}

pub fn acquire_settings_from_args(args: &RunArgs) -> Result<AcquireSettings, AppError> {
    if args.max_results == 0 || args.max_results > PROVIDER_MAX_RESULTS {
        return Err(AppError::config(format!(
            "--max-results must be within 1..={PROVIDER_MAX_RESULTS}."
        )));
    }
    if args.batch_size == 0 {
        return Err(AppError::config("--batch-size must be > 0."));
    }
    Ok(AcquireSettings {
        max_results: args.max_results,
        batch_size: args.batch_size,
        batch_delay: Duration::from_millis(args.batch_delay_ms),
        currency: args.currency.trim().to_ascii_uppercase(),
    })
}

fn upload_targets(storage: Vec<StorageTarget>, timeout: Duration) -> Vec<publish::UploadTarget> {
    storage
        .into_iter()
        .map(|target| publish::UploadTarget {
            store: target.profile.and_then(|profile| {
                S3Store::new(profile, timeout).map(|s| Box::new(s) as Box<dyn ObjectStore>)
            }),
            name: target.name,
        })
        .collect()
}

/// Rewrite argv so `fares` defaults to `fares run`.
///
/// Rules:
/// - `fares`                      -> `fares run`
/// - `fares --force ...`          -> `fares run --force ...`
/// - `fares --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "gate");
    if is_subcommand {
        return argv;
    }

    // A leading flag is treated as a `run` flag.
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    argv
}
