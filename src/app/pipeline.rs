//! Fetch pipeline shared by the CLI and tests.
//!
//! open table -> resume point -> (evaluate -> append/rewrite -> throttle)*
//!
//! The transport, sleeper and RNG are injected so the whole loop runs against
//! scripted fakes in tests.

use rand::Rng;
use tracing::info;

use crate::data::{Sleeper, TaxSource, Transport, evaluate_salary};
use crate::domain::FetchConfig;
use crate::error::AppError;
use crate::io::SalaryTable;

/// What a `fetch` run did.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSummary {
    /// Rows already on disk when the run started.
    pub resumed_rows: usize,
    /// First gross salary requested by this run.
    pub resumed_from: i64,
    pub fetched: usize,
    pub total_rows: usize,
    /// Rows whose tax was computed locally.
    pub local_tax_rows: usize,
    /// 429 responses absorbed across the run.
    pub retries: u32,
}

/// Execute the fetch loop until the configured range is exhausted.
pub fn run_fetch<T, S, R>(
    config: &FetchConfig,
    transport: &T,
    sleeper: &mut S,
    rng: &mut R,
) -> Result<FetchSummary, AppError>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
    R: Rng,
{
    config.validate()?;

    let mut table = SalaryTable::open(&config.output_csv)?;
    let resumed_rows = table.len();
    let start = table.next_gross(&config.range);

    if resumed_rows > 0 {
        info!(
            rows = resumed_rows,
            next = start,
            path = %table.path().display(),
            "resuming from existing table"
        );
    }

    let mut summary = FetchSummary {
        resumed_rows,
        resumed_from: start,
        fetched: 0,
        total_rows: resumed_rows,
        local_tax_rows: 0,
        retries: 0,
    };

    if start > config.range.stop {
        info!(stop = config.range.stop, "table already covers the requested range");
        return Ok(summary);
    }

    for gross in config.range.values_from(start) {
        let evaluated = evaluate_salary(gross, config, transport, sleeper, rng)?;

        info!(
            gross,
            employer_cost = evaluated.row.cout_total_employeur,
            net = evaluated.row.salaire_net,
            net_after_tax = evaluated.row.salaire_net_apres_impot,
            tax = evaluated.row.montant_impot.unwrap_or(0.0),
            local_tax = evaluated.tax_source == TaxSource::Local,
            "row fetched"
        );

        table.append(evaluated.row)?;

        summary.fetched += 1;
        summary.retries += evaluated.retries;
        if evaluated.tax_source == TaxSource::Local {
            summary.local_tax_rows += 1;
        }

        sleeper.sleep(config.throttle);
    }

    summary.total_rows = table.len();
    Ok(summary)
}
