//! Calculation validator: re-derives every numeric claim from its
//! canonical formula and compares within a relative tolerance.
//!
//! This check is critical: a recommendation built on a wrong number is
//! wrong no matter how well it reads.

use crate::types::{CalculationClaim, HeuristicResult};

pub const CHECK_NAME: &str = "calculation_validator";

/// Expected value for a claim under its canonical formula. Loan payoff is
/// `+inf` when the payment never exceeds the monthly interest accrual.
pub fn expected_value(claim: &CalculationClaim) -> f64 {
    match *claim {
        CalculationClaim::Margin {
            income, expenses, ..
        } => income - expenses,

        CalculationClaim::Projection {
            initial,
            margin,
            months,
            ..
        } => initial + margin * months,

        CalculationClaim::CompoundInterest {
            principal,
            annual_rate,
            compounds_per_year,
            years,
            ..
        } => principal * (1.0 + annual_rate / compounds_per_year).powf(compounds_per_year * years),

        CalculationClaim::LoanPayoff {
            principal,
            annual_rate,
            monthly_payment,
            ..
        } => loan_payoff_months(principal, annual_rate, monthly_payment),
    }
}

/// Months to amortize `principal` at `annual_rate` with a fixed
/// `monthly_payment`, solved from the amortization identity.
fn loan_payoff_months(principal: f64, annual_rate: f64, monthly_payment: f64) -> f64 {
    let monthly_rate = annual_rate / 12.0;

    if monthly_rate <= 0.0 {
        return principal / monthly_payment;
    }

    // Payment at or below the interest accrual never retires the balance.
    if monthly_payment <= principal * monthly_rate {
        return f64::INFINITY;
    }

    -(1.0 - monthly_rate * principal / monthly_payment).ln() / (1.0 + monthly_rate).ln()
}

fn claimed_value(claim: &CalculationClaim) -> f64 {
    match *claim {
        CalculationClaim::Margin { claimed, .. }
        | CalculationClaim::Projection { claimed, .. }
        | CalculationClaim::CompoundInterest { claimed, .. } => claimed,
        CalculationClaim::LoanPayoff { claimed_months, .. } => claimed_months,
    }
}

fn kind_name(claim: &CalculationClaim) -> &'static str {
    match claim {
        CalculationClaim::Margin { .. } => "margin",
        CalculationClaim::Projection { .. } => "projection",
        CalculationClaim::CompoundInterest { .. } => "compound_interest",
        CalculationClaim::LoanPayoff { .. } => "loan_payoff",
    }
}

/// Whether a claimed value matches the expected one within `tolerance`.
///
/// The tolerance is relative to the claimed value; a zero claim degrades
/// to an absolute comparison against the tolerance itself.
pub fn within_tolerance(claimed: f64, expected: f64, tolerance: f64) -> bool {
    if expected.is_infinite() {
        return claimed.is_infinite() && claimed.signum() == expected.signum();
    }
    if claimed == 0.0 {
        return expected.abs() <= tolerance;
    }
    ((claimed - expected) / claimed).abs() <= tolerance
}

/// Validate all declared calculations. No declared claims passes
/// trivially with score 1.0.
pub fn check(claims: &[CalculationClaim], tolerance: f64) -> HeuristicResult {
    if claims.is_empty() {
        return HeuristicResult {
            name: CHECK_NAME.to_string(),
            passed: true,
            score: 1.0,
            is_critical: true,
            message: "no calculations declared".to_string(),
            details: vec![],
        };
    }

    let mut details = Vec::new();
    let mut valid = 0usize;

    for claim in claims {
        let expected = expected_value(claim);
        let claimed = claimed_value(claim);

        if within_tolerance(claimed, expected, tolerance) {
            valid += 1;
        } else {
            details.push(format!(
                "{}: claimed {claimed} but expected {expected}",
                kind_name(claim)
            ));
        }
    }

    let passed = valid == claims.len();
    let score = valid as f64 / claims.len() as f64;

    HeuristicResult {
        name: CHECK_NAME.to_string(),
        passed,
        score,
        is_critical: true,
        message: if passed {
            format!("{valid}/{} calculations verified", claims.len())
        } else {
            format!("{}/{} calculations failed verification", claims.len() - valid, claims.len())
        },
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margin(income: f64, expenses: f64, claimed: f64) -> CalculationClaim {
        CalculationClaim::Margin {
            income,
            expenses,
            claimed,
        }
    }

    #[test]
    fn test_correct_margin_passes() {
        let result = check(&[margin(1200.0, 1500.0, -300.0)], 0.01);
        assert!(result.passed);
        assert_eq!(result.score, 1.0);
        assert!(result.is_critical);
    }

    #[test]
    fn test_margin_within_one_percent_passes() {
        // -300 claimed as -299: off by 1/299 ≈ 0.33%.
        let result = check(&[margin(1200.0, 1500.0, -299.0)], 0.01);
        assert!(result.passed);
    }

    #[test]
    fn test_margin_outside_tolerance_fails() {
        let result = check(&[margin(1200.0, 1500.0, -250.0)], 0.01);
        assert!(!result.passed);
        assert!(result.is_critical);
        assert_eq!(result.details.len(), 1);
    }

    #[test]
    fn test_spec_scenario_minus_200() {
        // income 1200, expenses 1500 claimed as -200: wrong, margin is -300.
        let wrong = check(&[margin(1200.0, 1500.0, -200.0)], 0.01);
        assert!(!wrong.passed);

        let right = check(&[margin(1200.0, 1400.0, -200.0)], 0.01);
        assert!(right.passed);
        assert_eq!(right.score, 1.0);
    }

    #[test]
    fn test_projection() {
        let claim = CalculationClaim::Projection {
            initial: 500.0,
            margin: 150.0,
            months: 6.0,
            claimed: 1400.0,
        };
        assert!(check(&[claim], 0.01).passed);
    }

    #[test]
    fn test_compound_interest() {
        // 1000 at 5% compounded monthly for 2 years ≈ 1104.94.
        let claim = CalculationClaim::CompoundInterest {
            principal: 1000.0,
            annual_rate: 0.05,
            compounds_per_year: 12.0,
            years: 2.0,
            claimed: 1104.94,
        };
        assert!(check(&[claim], 0.01).passed);
    }

    #[test]
    fn test_loan_payoff_finite() {
        // 1000 at 12% APR, paying 100/month: ~10.6 months.
        let expected = expected_value(&CalculationClaim::LoanPayoff {
            principal: 1000.0,
            annual_rate: 0.12,
            monthly_payment: 100.0,
            claimed_months: 0.0,
        });
        assert!(expected > 10.0 && expected < 11.0);
    }

    #[test]
    fn test_loan_payoff_never_amortizes() {
        // 10 a month on 1000 at 24% APR is below the 20/month accrual.
        let claim = CalculationClaim::LoanPayoff {
            principal: 1000.0,
            annual_rate: 0.24,
            monthly_payment: 10.0,
            claimed_months: 120.0,
        };
        let expected = expected_value(&claim);
        assert!(expected.is_infinite());
        // A finite claim against an infinite payoff fails.
        assert!(!check(&[claim], 0.01).passed);
    }

    #[test]
    fn test_zero_interest_loan() {
        let claim = CalculationClaim::LoanPayoff {
            principal: 1200.0,
            annual_rate: 0.0,
            monthly_payment: 100.0,
            claimed_months: 12.0,
        };
        assert!(check(&[claim], 0.01).passed);
    }

    #[test]
    fn test_empty_claims_pass_trivially() {
        let result = check(&[], 0.01);
        assert!(result.passed);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_mixed_claims_partial_score() {
        let result = check(
            &[
                margin(1200.0, 1500.0, -300.0),
                margin(1200.0, 1500.0, -100.0),
            ],
            0.01,
        );
        assert!(!result.passed);
        assert_eq!(result.score, 0.5);
    }
}
