//! Derived columns for the chart battery.
//!
//! Pure functions over `SalaryRow`s so the numbers behind every chart can be
//! tested without rendering anything.

use crate::domain::SalaryRow;
use crate::error::AppError;

/// Below this before/after-tax gap (in €) on every row, tax is assumed not to
/// have been computed at all.
pub const UNCOMPUTED_TAX_TOLERANCE: f64 = 1.0;

/// One plotted point with all derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub gross: f64,
    pub employer_cost: f64,
    pub net: f64,
    pub net_after_tax: f64,
    /// `net / gross`
    pub net_ratio: f64,
    /// `net_after_tax / employer_cost`
    pub supernet_ratio: f64,
    /// `supernet_ratio * employer_cost`, cross-check against `net_after_tax`.
    pub supernet_rebuilt: f64,
    pub tax: f64,
    /// `tax / net * 100`
    pub tax_rate_pct: f64,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<DerivedRow>,
    pub tax_total: f64,
    pub tax_max: f64,
    /// Every row has `|net - net_after_tax| < UNCOMPUTED_TAX_TOLERANCE`.
    pub tax_looks_uncomputed: bool,
}

impl Dataset {
    pub fn has_tax(&self) -> bool {
        self.tax_total > 0.0
    }

    pub fn max_gross(&self) -> f64 {
        self.rows.iter().map(|r| r.gross).fold(f64::NEG_INFINITY, f64::max)
    }
}

pub fn derive_row(row: &SalaryRow) -> DerivedRow {
    let net_ratio = row.salaire_net / row.salaire_brut;
    let supernet_ratio = row.salaire_net_apres_impot / row.cout_total_employeur;
    let tax = row
        .montant_impot
        .unwrap_or(row.salaire_net - row.salaire_net_apres_impot);
    let tax_rate_pct = if row.salaire_net != 0.0 {
        tax / row.salaire_net * 100.0
    } else {
        0.0
    };

    DerivedRow {
        gross: row.salaire_brut,
        employer_cost: row.cout_total_employeur,
        net: row.salaire_net,
        net_after_tax: row.salaire_net_apres_impot,
        net_ratio,
        supernet_ratio,
        supernet_rebuilt: supernet_ratio * row.cout_total_employeur,
        tax,
        tax_rate_pct,
    }
}

/// Filter out non-positive gross/cost rows, sort by gross and derive.
pub fn build_dataset(rows: &[SalaryRow]) -> Result<Dataset, AppError> {
    let mut kept: Vec<&SalaryRow> = rows
        .iter()
        .filter(|r| r.salaire_brut > 0.0 && r.cout_total_employeur > 0.0)
        .collect();
    if kept.is_empty() {
        return Err(AppError::data(
            "No rows with positive gross salary and employer cost to plot.",
        ));
    }
    kept.sort_by(|a, b| a.salaire_brut.total_cmp(&b.salaire_brut));

    let derived: Vec<DerivedRow> = kept.into_iter().map(derive_row).collect();
    let tax_total: f64 = derived.iter().map(|r| r.tax).sum();
    let tax_max = derived.iter().map(|r| r.tax).fold(f64::NEG_INFINITY, f64::max);
    let tax_looks_uncomputed = derived
        .iter()
        .all(|r| (r.net - r.net_after_tax).abs() < UNCOMPUTED_TAX_TOLERANCE);

    Ok(Dataset {
        rows: derived,
        tax_total,
        tax_max,
        tax_looks_uncomputed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(gross: f64, cost: f64, net: f64, net_after: f64, tax: Option<f64>) -> SalaryRow {
        SalaryRow {
            cout_total_employeur: cost,
            salaire_brut: gross,
            salaire_net: net,
            salaire_net_apres_impot: net_after,
            montant_impot: tax,
        }
    }

    #[test]
    fn ratios_and_rebuilt_supernet() {
        let d = derive_row(&row(40_000.0, 56_000.0, 31_200.0, 28_000.0, Some(3_200.0)));
        assert!((d.net_ratio - 0.78).abs() < 1e-12);
        assert!((d.supernet_ratio - 0.5).abs() < 1e-12);
        assert!((d.supernet_rebuilt - 28_000.0).abs() < 1e-9);
        assert_eq!(d.tax, 3_200.0);
        assert!((d.tax_rate_pct - 3_200.0 / 31_200.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_tax_is_net_difference() {
        let d = derive_row(&row(40_000.0, 56_000.0, 31_200.0, 29_000.0, None));
        assert_eq!(d.tax, 2_200.0);
    }

    #[test]
    fn dataset_filters_and_sorts() {
        let rows = vec![
            row(3_000.0, 4_200.0, 2_340.0, 2_340.0, Some(0.0)),
            row(0.0, 0.0, 0.0, 0.0, Some(0.0)),
            row(1_000.0, 1_400.0, 780.0, 780.0, Some(0.0)),
            row(2_000.0, -1.0, 1_560.0, 1_560.0, Some(0.0)),
        ];
        let ds = build_dataset(&rows).unwrap();
        let gross: Vec<f64> = ds.rows.iter().map(|r| r.gross).collect();
        assert_eq!(gross, vec![1_000.0, 3_000.0]);
        assert_eq!(ds.max_gross(), 3_000.0);
    }

    #[test]
    fn zero_tax_everywhere_is_flagged() {
        let rows = vec![
            row(1_000.0, 1_400.0, 780.0, 780.0, Some(0.0)),
            row(2_000.0, 2_800.0, 1_560.0, 1_559.5, None),
        ];
        let ds = build_dataset(&rows).unwrap();
        assert!(ds.tax_looks_uncomputed);
        assert!(ds.has_tax());
        assert!((ds.tax_total - 0.5).abs() < 1e-9);

        let taxed = vec![
            row(1_000.0, 1_400.0, 780.0, 780.0, Some(0.0)),
            row(60_000.0, 84_000.0, 46_800.0, 40_000.0, Some(6_800.0)),
        ];
        let ds = build_dataset(&taxed).unwrap();
        assert!(!ds.tax_looks_uncomputed);
        assert_eq!(ds.tax_max, 6_800.0);
    }

    #[test]
    fn no_tax_means_no_tax_rate_chart() {
        let rows = vec![row(1_000.0, 1_400.0, 780.0, 780.0, Some(0.0))];
        let ds = build_dataset(&rows).unwrap();
        assert!(!ds.has_tax());
    }

    #[test]
    fn nothing_plottable_is_a_data_error() {
        let err = build_dataset(&[row(0.0, 0.0, 0.0, 0.0, None)]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(build_dataset(&[]).unwrap_err().exit_code(), 3);
    }
}
