//! Progressive income tax.
//!
//! The tax is computed on the per-share quotient and scaled back up:
//!
//! ```text
//! q   = income / shares
//! tax = shares * Σ rate_k * |q ∩ (bound_{k-1}, bound_k]|
//! ```
//!
//! Used when the remote evaluator does not return a usable tax amount.

use crate::error::AppError;

/// One bracket of a progressive schedule: income up to `upper_bound` is taxed at
/// `rate` (a fraction, not a percentage).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    pub upper_bound: f64,
    pub rate: f64,
}

impl TaxBracket {
    pub const fn new(upper_bound: f64, rate: f64) -> Self {
        Self { upper_bound, rate }
    }
}

/// Annual schedule for a single share.
pub const INCOME_TAX_SCHEDULE: [TaxBracket; 5] = [
    TaxBracket::new(11_294.0, 0.0),
    TaxBracket::new(28_797.0, 0.11),
    TaxBracket::new(82_341.0, 0.30),
    TaxBracket::new(177_106.0, 0.41),
    TaxBracket::new(f64::INFINITY, 0.45),
];

/// Check that a schedule is well formed: bounds strictly increasing, last bound
/// unbounded, rates non-decreasing and within `[0, 1]`.
pub fn validate_schedule(schedule: &[TaxBracket]) -> Result<(), AppError> {
    let Some(last) = schedule.last() else {
        return Err(AppError::config("Tax schedule is empty."));
    };
    if last.upper_bound != f64::INFINITY {
        return Err(AppError::config("Last tax bracket must be unbounded."));
    }

    let mut prev_bound = 0.0;
    let mut prev_rate = 0.0;
    for (idx, bracket) in schedule.iter().enumerate() {
        if !(0.0..=1.0).contains(&bracket.rate) {
            return Err(AppError::config(format!(
                "Tax bracket {idx} has rate {} outside [0, 1].",
                bracket.rate
            )));
        }
        if bracket.upper_bound <= prev_bound {
            return Err(AppError::config(format!(
                "Tax bracket {idx} bound {} is not above {prev_bound}.",
                bracket.upper_bound
            )));
        }
        if bracket.rate < prev_rate {
            return Err(AppError::config(format!(
                "Tax bracket {idx} rate {} is below the previous rate {prev_rate}.",
                bracket.rate
            )));
        }
        prev_bound = bracket.upper_bound;
        prev_rate = bracket.rate;
    }
    Ok(())
}

/// Income tax on `income` for a household of `shares` fiscal shares, using the
/// built-in schedule. `shares` is expected to be `>= 1` (validated upstream).
pub fn compute_income_tax(income: f64, shares: f64) -> f64 {
    compute_with_schedule(&INCOME_TAX_SCHEDULE, income, shares)
}

/// Same as [`compute_income_tax`] with an explicit schedule.
pub fn compute_with_schedule(schedule: &[TaxBracket], income: f64, shares: f64) -> f64 {
    let quotient = income / shares;

    let mut tax_per_share = 0.0;
    let mut lower = 0.0;
    for bracket in schedule {
        if quotient <= lower {
            break;
        }
        let slice = quotient.min(bracket.upper_bound) - lower;
        if slice > 0.0 {
            tax_per_share += slice * bracket.rate;
        }
        lower = bracket.upper_bound;
    }

    (tax_per_share * shares).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schedule_is_well_formed() {
        validate_schedule(&INCOME_TAX_SCHEDULE).unwrap();
    }

    #[test]
    fn malformed_schedules_are_rejected() {
        let bounded = [TaxBracket::new(10_000.0, 0.0), TaxBracket::new(20_000.0, 0.1)];
        assert!(validate_schedule(&bounded).is_err());

        let decreasing_rate = [
            TaxBracket::new(10_000.0, 0.2),
            TaxBracket::new(f64::INFINITY, 0.1),
        ];
        assert!(validate_schedule(&decreasing_rate).is_err());

        let unordered = [
            TaxBracket::new(20_000.0, 0.0),
            TaxBracket::new(10_000.0, 0.1),
            TaxBracket::new(f64::INFINITY, 0.2),
        ];
        assert!(validate_schedule(&unordered).is_err());
        assert!(validate_schedule(&[]).is_err());
    }

    #[test]
    fn anchor_values() {
        assert_eq!(compute_income_tax(0.0, 1.0), 0.0);
        assert_eq!(compute_income_tax(11_294.0, 1.0), 0.0);

        let expected = (28_797.0 - 11_294.0) * 0.11;
        let got = compute_income_tax(28_797.0, 1.0);
        assert!((got - expected).abs() < 1e-9, "expected {expected}, got {got}");

        // 100k: 0.11*17503 + 0.30*53544 + 0.41*17659
        let expected = 17_503.0 * 0.11 + 53_544.0 * 0.30 + 17_659.0 * 0.41;
        let got = compute_income_tax(100_000.0, 1.0);
        assert!((got - expected).abs() < 1e-6, "expected {expected}, got {got}");
    }

    #[test]
    fn top_bracket_is_unbounded() {
        let below = compute_income_tax(177_106.0, 1.0);
        let above = compute_income_tax(277_106.0, 1.0);
        assert!((above - below - 100_000.0 * 0.45).abs() < 1e-6);
    }

    #[test]
    fn negative_income_is_floored_at_zero() {
        assert_eq!(compute_income_tax(-5_000.0, 1.0), 0.0);
    }

    #[test]
    fn continuous_at_bracket_boundaries() {
        for bracket in INCOME_TAX_SCHEDULE.iter().filter(|b| b.upper_bound.is_finite()) {
            let b = bracket.upper_bound;
            let left = compute_income_tax(b - 1e-6, 1.0);
            let at = compute_income_tax(b, 1.0);
            let right = compute_income_tax(b + 1e-6, 1.0);
            assert!((at - left).abs() < 1e-5, "jump below {b}: {left} -> {at}");
            assert!((right - at).abs() < 1e-5, "jump above {b}: {at} -> {right}");
        }
    }

    #[test]
    fn monotone_in_income() {
        for shares in [1.0, 1.5, 2.0, 3.0] {
            let mut prev = compute_income_tax(0.0, shares);
            let mut income = 0.0;
            while income <= 600_000.0 {
                let tax = compute_income_tax(income, shares);
                assert!(
                    tax + 1e-9 >= prev,
                    "tax decreased at income {income} with {shares} shares: {prev} -> {tax}"
                );
                prev = tax;
                income += 250.0;
            }
        }
    }

    #[test]
    fn shares_scale_the_quotient() {
        for n in [1.0_f64, 2.0, 3.0, 4.0] {
            for income in [0.0, 15_000.0, 60_000.0, 250_000.0, 900_000.0] {
                let split = compute_income_tax(income, n);
                let scaled = compute_income_tax(income / n, 1.0) * n;
                assert!(
                    (split - scaled).abs() < 1e-6,
                    "income {income}, shares {n}: {split} vs {scaled}"
                );
            }
        }
        // Two shares keep a 40k household in the 11% bracket.
        let couple = compute_income_tax(40_000.0, 2.0);
        assert!((couple - 2.0 * (20_000.0 - 11_294.0) * 0.11).abs() < 1e-6);
    }
}
