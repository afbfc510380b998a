//! Command-line parsing for the fare acquisition tool.
//!
//! Argument parsing and command dispatch are kept apart from the pipeline
//! itself; secrets never go on the command line (see `config`).

use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use clap::{Parser, Subcommand};

use crate::domain::schedule::parse_weekday;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fares", version, about = "Round-trip fare acquisition (Amadeus-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Acquire fares for every route, write the CSV artifact, upload and notify.
    Run(RunArgs),
    /// Report whether a date is a scheduled run day.
    Gate(GateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Route list CSV (origin,destination,advance1,advance2,stay_days).
    #[arg(long, default_value = "flight_list.csv")]
    pub routes: PathBuf,

    /// Directory the output CSV is written to.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Where the artifact is moved when an upload fails.
    #[arg(long, default_value = "archive")]
    pub archive_dir: PathBuf,

    /// Maximum offers requested per search.
    #[arg(long, default_value_t = crate::domain::DEFAULT_MAX_RESULTS)]
    pub max_results: u32,

    /// Offers per pricing request.
    #[arg(long, default_value_t = crate::domain::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Pause before each pricing request (milliseconds).
    #[arg(long, default_value_t = 1000)]
    pub batch_delay_ms: u64,

    /// Quote currency.
    #[arg(long, default_value = crate::domain::DEFAULT_CURRENCY)]
    pub currency: String,

    /// HTTP timeout for provider, storage and notification calls (seconds).
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Weekday whose first and third occurrences are run days.
    #[arg(long, value_parser = parse_weekday, default_value = "wed")]
    pub weekday: Weekday,

    /// Run even when today is not a scheduled run day.
    #[arg(long)]
    pub force: bool,

    /// Skip object-storage uploads (the artifact stays where it was written).
    #[arg(long)]
    pub no_upload: bool,

    /// Skip the status notification.
    #[arg(long)]
    pub no_notify: bool,
}

#[derive(Debug, Parser)]
pub struct GateArgs {
    /// Date to check (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Weekday whose first and third occurrences are run days.
    #[arg(long, value_parser = parse_weekday, default_value = "wed")]
    pub weekday: Weekday,
}
