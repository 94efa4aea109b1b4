//! Command-line parsing for the salary grid fetcher and chart renderer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fetch/plot code. Defaults here are the tool's configuration constants;
//! `app` turns the parsed arguments into validated `FetchConfig`/`PlotConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "supernet", version, about = "Gross-to-supernet salary grid fetcher and charts")]
pub struct Cli {
    /// Debug-level logging for this crate (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate every gross salary in the range and append rows to the CSV table.
    ///
    /// Resumes after the last row already in the table.
    Fetch(FetchArgs),
    /// Render the chart battery from the CSV table.
    Plot(PlotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Evaluate endpoint URL.
    #[arg(long, env = "SUPERNET_API_URL", default_value = "https://mon-entreprise.urssaf.fr/api/v1/evaluate")]
    pub api_url: String,

    /// CSV table to create or resume.
    #[arg(short, long, default_value = "mon_entreprise_grille_salaires.csv")]
    pub output: PathBuf,

    /// First gross annual salary.
    #[arg(long, default_value_t = 1_000)]
    pub start: i64,

    /// Last gross annual salary (inclusive).
    #[arg(long, default_value_t = 500_000)]
    pub stop: i64,

    /// Gross salary increment between rows.
    #[arg(long, default_value_t = 1_000)]
    pub step: i64,

    /// Ask the evaluator for a flat personalised tax rate (percent) instead of
    /// the standard schedule.
    #[arg(long, value_name = "PERCENT")]
    pub custom_tax_rate: Option<f64>,

    /// Fiscal shares used by the local tax fallback (1 = single, 2 = couple, ...).
    #[arg(long, default_value_t = 1.0)]
    pub fiscal_shares: f64,

    /// Full-time gross annual salary; lower salaries are sent as part-time.
    #[arg(long, default_value_t = 21_621.60)]
    pub reference_salary: f64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Maximum sends per salary before giving up on rate limiting.
    #[arg(long, default_value_t = 8)]
    pub max_attempts: u32,

    /// Pause between requests, in milliseconds.
    #[arg(long, default_value_t = 250)]
    pub throttle_ms: u64,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// CSV table produced by `supernet fetch`.
    #[arg(short, long, default_value = "mon_entreprise_grille_salaires.csv")]
    pub input: PathBuf,

    /// Directory receiving the PNG charts.
    #[arg(short, long, default_value = "graphs")]
    pub output_dir: PathBuf,

    /// Chart width in pixels.
    #[arg(long, default_value_t = 2000)]
    pub width: u32,

    /// Chart height in pixels.
    #[arg(long, default_value_t = 1200)]
    pub height: u32,
}
