//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs the fetch loop or the chart battery
//! - prints run summaries

use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::{Command, FetchArgs, PlotArgs};
use crate::data::{HttpTransport, ThreadSleeper};
use crate::domain::{FetchConfig, PlotConfig, SampleRange, TaxMode};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `supernet` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Fetch(args) => handle_fetch(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = fetch_config_from_args(&args);
    config.validate()?;

    let transport = HttpTransport::new(config.api_url.clone(), config.request_timeout)?;
    let mut sleeper = ThreadSleeper;
    let mut rng = StdRng::from_entropy();

    let summary = pipeline::run_fetch(&config, &transport, &mut sleeper, &mut rng)?;
    println!("{}", crate::report::format_fetch_summary(&summary, &config));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let config = plot_config_from_args(&args);
    let summary = crate::plot::run_plot(&config)?;
    println!(
        "{}",
        crate::report::format_plot_summary(&summary, &config.output_dir)
    );
    Ok(())
}

pub fn fetch_config_from_args(args: &FetchArgs) -> FetchConfig {
    FetchConfig {
        api_url: args.api_url.clone(),
        output_csv: args.output.clone(),
        range: SampleRange {
            start: args.start,
            stop: args.stop,
            step: args.step,
        },
        tax_mode: match args.custom_tax_rate {
            Some(pct) => TaxMode::CustomRate(pct),
            None => TaxMode::Auto,
        },
        fiscal_shares: args.fiscal_shares,
        reference_salary: args.reference_salary,
        request_timeout: Duration::from_secs(args.timeout_secs),
        max_attempts: args.max_attempts,
        throttle: Duration::from_millis(args.throttle_ms),
    }
}

pub fn plot_config_from_args(args: &PlotArgs) -> PlotConfig {
    PlotConfig {
        input_csv: args.input.clone(),
        output_dir: args.output_dir.clone(),
        width: args.width,
        height: args.height,
    }
}
