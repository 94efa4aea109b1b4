//! Formatted terminal output for fetch and plot runs.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized

use std::path::Path;

use crate::app::pipeline::FetchSummary;
use crate::domain::{FetchConfig, TaxMode};
use crate::plot::PlotSummary;

/// Format the end-of-run summary for `supernet fetch`.
pub fn format_fetch_summary(summary: &FetchSummary, config: &FetchConfig) -> String {
    let mut out = String::new();

    out.push_str("=== supernet - salary grid fetch ===\n");
    out.push_str(&format!(
        "Range: {}..={} step {}\n",
        config.range.start, config.range.stop, config.range.step
    ));
    let mode = match config.tax_mode {
        TaxMode::Auto => "auto (remote schedule)".to_string(),
        TaxMode::CustomRate(pct) => format!("custom rate {pct}%"),
    };
    out.push_str(&format!(
        "Tax: {mode} | fiscal shares={}\n",
        config.fiscal_shares
    ));

    if summary.resumed_rows > 0 {
        out.push_str(&format!(
            "Resumed: {} existing rows, continued at {}\n",
            summary.resumed_rows, summary.resumed_from
        ));
    }
    out.push_str(&format!(
        "Fetched: {} rows ({} with locally computed tax, {} rate-limit retries)\n",
        summary.fetched, summary.local_tax_rows, summary.retries
    ));
    out.push_str(&format!(
        "OK -> {} ({} rows)\n",
        config.output_csv.display(),
        summary.total_rows
    ));

    out
}

/// Format the end-of-run summary for `supernet plot`.
pub fn format_plot_summary(summary: &PlotSummary, output_dir: &Path) -> String {
    let mut out = String::new();

    for path in &summary.written {
        out.push_str(&format!("saved -> {}\n", path.display()));
    }
    out.push_str(&format!("Charts written to {}/\n", output_dir.display()));
    out.push_str(&format!("   - {} data points\n", summary.points));
    if summary.tax_computed {
        out.push_str(&format!(
            "   - Income tax computed: YES (max: {:.2}€)\n",
            summary.tax_max
        ));
    } else {
        out.push_str("   - Income tax computed: NO - check the fetch configuration\n");
    }
    if summary.tax_looks_uncomputed {
        out.push_str("WARNING: net before and after tax are nearly identical (tax probably not computed)\n");
    }

    out
}
