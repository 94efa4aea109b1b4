//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced one at a time by the fetcher
//! - persisted to / reloaded from the CSV table
//! - read back in bulk by the plotter

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One evaluated gross-salary sample. All amounts are annual.
///
/// Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRow {
    /// Employer cost (superbrut).
    pub cout_total_employeur: f64,
    pub salaire_brut: f64,
    /// Net before income tax.
    pub salaire_net: f64,
    /// Net after income tax (supernet).
    pub salaire_net_apres_impot: f64,
    /// Income tax. Tables written by older tools may lack the column.
    #[serde(default)]
    pub montant_impot: Option<f64>,
}

/// Inclusive, ascending range of gross salaries to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl Default for SampleRange {
    fn default() -> Self {
        Self {
            start: 1_000,
            stop: 500_000,
            step: 1_000,
        }
    }
}

impl SampleRange {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.step <= 0 {
            return Err(AppError::config(format!(
                "Sampling step must be positive (got {}).",
                self.step
            )));
        }
        if self.start > self.stop {
            return Err(AppError::config(format!(
                "Sampling start {} is above stop {}.",
                self.start, self.stop
            )));
        }
        Ok(())
    }

    /// Gross values from `from` (inclusive) up to `stop` (inclusive).
    pub fn values_from(&self, from: i64) -> impl Iterator<Item = i64> + '_ {
        let step = self.step.max(1) as usize;
        (from..=self.stop).step_by(step)
    }

    /// Where sampling resumes given the last persisted gross salary.
    pub fn resume_point(&self, last_gross: Option<f64>) -> i64 {
        match last_gross {
            Some(g) => g.round() as i64 + self.step,
            None => self.start,
        }
    }
}

/// How the remote evaluator is asked to compute income tax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaxMode {
    /// Standard progressive schedule, computed remotely.
    Auto,
    /// Flat personalised rate, in percent (0..=100).
    CustomRate(f64),
}

/// Fully validated fetcher configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_url: String,
    pub output_csv: PathBuf,
    pub range: SampleRange,
    pub tax_mode: TaxMode,
    pub fiscal_shares: f64,
    /// Full-time gross annual salary used to derive the part-time quotient.
    pub reference_salary: f64,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub throttle: Duration,
}

impl FetchConfig {
    pub const DEFAULT_API_URL: &'static str = "https://mon-entreprise.urssaf.fr/api/v1/evaluate";
    pub const DEFAULT_REFERENCE_SALARY: f64 = 21_621.60;

    pub fn validate(&self) -> Result<(), AppError> {
        self.range.validate()?;
        if !(self.fiscal_shares.is_finite() && self.fiscal_shares >= 1.0) {
            return Err(AppError::config(format!(
                "Fiscal share count must be >= 1 (got {}).",
                self.fiscal_shares
            )));
        }
        if !(self.reference_salary.is_finite() && self.reference_salary > 0.0) {
            return Err(AppError::config(format!(
                "Reference full-time salary must be positive (got {}).",
                self.reference_salary
            )));
        }
        if self.max_attempts == 0 {
            return Err(AppError::config("Retry ceiling must allow at least one attempt."));
        }
        if let TaxMode::CustomRate(pct) = self.tax_mode {
            if !(0.0..=100.0).contains(&pct) {
                return Err(AppError::config(format!(
                    "Custom tax rate must be within 0..=100 percent (got {pct})."
                )));
            }
        }
        Ok(())
    }
}

/// Fully validated plotter configuration.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub input_csv: PathBuf,
    pub output_dir: PathBuf,
    /// Chart size in pixels.
    pub width: u32,
    pub height: u32,
}

impl PlotConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.width < 200 || self.height < 150 {
            return Err(AppError::config(format!(
                "Chart size {}x{} is too small (minimum 200x150).",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
