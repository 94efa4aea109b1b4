//! Turn one gross salary into one `SalaryRow`.
//!
//! The evaluator's own income tax always wins when it is usable (present and
//! non-zero). Otherwise the tax is computed locally from the net-before-tax
//! figure and the supernet is recomputed as `net - tax`.

use rand::Rng;

use crate::data::retry::{RetryPolicy, Sleeper, post_with_retry};
use crate::data::transport::Transport;
use crate::data::wire::{EXPRESSIONS, EvaluateRequest, EvaluateResponse, build_situation};
use crate::domain::{FetchConfig, SalaryRow};
use crate::error::AppError;
use crate::tax::compute_income_tax;

const IDX_EMPLOYER_COST: usize = 0;
const IDX_GROSS: usize = 1;
const IDX_NET: usize = 2;
const IDX_NET_AFTER_TAX: usize = 3;
const IDX_TAX: usize = 4;

/// Where a row's income tax came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxSource {
    Remote,
    Local,
}

#[derive(Debug, Clone)]
pub struct EvaluatedRow {
    pub row: SalaryRow,
    pub tax_source: TaxSource,
    pub retries: u32,
}

/// Evaluate one gross annual salary against the remote endpoint.
pub fn evaluate_salary<T, S, R>(
    gross: i64,
    config: &FetchConfig,
    transport: &T,
    sleeper: &mut S,
    rng: &mut R,
) -> Result<EvaluatedRow, AppError>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
    R: Rng,
{
    let request = EvaluateRequest::new(build_situation(gross, config.reference_salary, config.tax_mode));
    let policy = RetryPolicy {
        max_attempts: config.max_attempts,
    };
    let evaluated = post_with_retry(transport, &request, policy, sleeper, rng)?;
    let (row, tax_source) = assemble_row(&evaluated.response, config.fiscal_shares)?;

    Ok(EvaluatedRow {
        row,
        tax_source,
        retries: evaluated.retries,
    })
}

/// Build a row from an evaluate response, applying the local tax fallback.
pub fn assemble_row(response: &EvaluateResponse, fiscal_shares: f64) -> Result<(SalaryRow, TaxSource), AppError> {
    let value = |idx: usize| response.evaluate.get(idx).and_then(|node| node.annual_value());
    let required = |idx: usize| {
        value(idx).ok_or_else(|| {
            AppError::remote(format!(
                "Evaluate response has no value for '{}'.",
                EXPRESSIONS[idx]
            ))
        })
    };

    let cout_total_employeur = required(IDX_EMPLOYER_COST)?;
    let salaire_brut = required(IDX_GROSS)?;
    let salaire_net = required(IDX_NET)?;

    match value(IDX_TAX) {
        Some(tax) if tax != 0.0 => {
            let salaire_net_apres_impot = required(IDX_NET_AFTER_TAX)?;
            Ok((
                SalaryRow {
                    cout_total_employeur,
                    salaire_brut,
                    salaire_net,
                    salaire_net_apres_impot,
                    montant_impot: Some(tax),
                },
                TaxSource::Remote,
            ))
        }
        _ => {
            let tax = compute_income_tax(salaire_net, fiscal_shares);
            Ok((
                SalaryRow {
                    cout_total_employeur,
                    salaire_brut,
                    salaire_net,
                    salaire_net_apres_impot: salaire_net - tax,
                    montant_impot: Some(tax),
                },
                TaxSource::Local,
            ))
        }
    }
}
