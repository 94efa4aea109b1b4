//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the persisted row (`SalaryRow`)
//! - sampling and tax-mode settings (`SampleRange`, `TaxMode`)
//! - validated run configuration (`FetchConfig`, `PlotConfig`)

pub mod types;

pub use types::*;
