//! Chart battery over the persisted salary table.
//!
//! - derived ratio/tax columns (`derive`)
//! - chart descriptions and PNG rendering (`charts`)

use std::fs::create_dir_all;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::domain::PlotConfig;
use crate::error::AppError;
use crate::io::read_rows;

pub mod charts;
pub mod derive;

pub use charts::{ChartSpec, chart_specs, render_chart};
pub use derive::{Dataset, DerivedRow, build_dataset};

/// What a `plot` run produced.
#[derive(Debug, Clone)]
pub struct PlotSummary {
    pub points: usize,
    pub tax_computed: bool,
    pub tax_max: f64,
    pub tax_looks_uncomputed: bool,
    pub written: Vec<PathBuf>,
}

/// Read the table and write every chart into the output directory.
pub fn run_plot(config: &PlotConfig) -> Result<PlotSummary, AppError> {
    config.validate()?;

    let rows = read_rows(&config.input_csv)?;
    let ds = build_dataset(&rows)?;

    if ds.tax_looks_uncomputed {
        warn!("net before and after tax are nearly identical on every row; income tax was probably not computed");
    }

    create_dir_all(&config.output_dir).map_err(|e| {
        AppError::config(format!(
            "Failed to create output directory '{}': {e}",
            config.output_dir.display()
        ))
    })?;

    let mut written = Vec::new();
    for spec in chart_specs(&ds) {
        let path = render_chart(&spec, &config.output_dir, (config.width, config.height))?;
        info!(path = %path.display(), "chart saved");
        written.push(path);
    }

    Ok(PlotSummary {
        points: ds.rows.len(),
        tax_computed: ds.has_tax(),
        tax_max: ds.tax_max,
        tax_looks_uncomputed: ds.tax_looks_uncomputed,
        written,
    })
}
