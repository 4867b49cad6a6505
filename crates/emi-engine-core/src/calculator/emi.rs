use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calculator::terms::LoanTerms;
use crate::time_value;
use crate::{types::*, EmiEngineError, EmiEngineResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Raw loan terms as captured by a loan-creation form. Any field may still be
/// missing while the form is being filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmiInput {
    #[serde(default)]
    pub principal: Option<Money>,
    /// Interest per 100 currency units of principal, per month.
    #[serde(default)]
    pub flat_rate_per_100: Option<Rate>,
    #[serde(default)]
    pub tenure_months: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiOutput {
    pub monthly_interest: Money,
    pub total_interest: Money,
    pub total_repayment: Money,
    pub emi_amount: Money,
    /// `emi_amount * tenure_months`, what the schedule actually collects.
    pub scheduled_total: Money,
    /// `scheduled_total - total_repayment`, the drift introduced by rounding.
    pub rounding_difference: Money,
    /// Effective per-month rate on the declining balance implied by the flat
    /// schedule, if it could be solved.
    pub implied_monthly_rate: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lenient EMI used for live recomputation while loan terms are edited.
///
/// Returns zero when the terms are not computable (missing tenure, zero or
/// negative tenure, non-positive principal, negative rate). Zero is a
/// "not computed" marker and must not be shown as a real installment.
pub fn compute_emi(principal: Money, flat_rate_per_100: Rate, tenure_months: i64) -> Money {
    match LoanTerms::new(principal, flat_rate_per_100, tenure_months) {
        Ok(terms) => terms.emi(),
        Err(_) => Decimal::ZERO,
    }
}

/// Strict EMI calculation with the full flat-interest breakdown.
pub fn calculate_emi(input: &EmiInput) -> EmiEngineResult<ComputationOutput<EmiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = terms_from_input(input)?;
    let breakdown = terms.breakdown();
    let months = Decimal::from(terms.tenure_months);

    let scheduled_total = breakdown.emi_amount * months;
    let rounding_difference = scheduled_total - breakdown.total_repayment;
    if !rounding_difference.is_zero() {
        warnings.push(format!(
            "EMI rounding makes the schedule collect {scheduled_total} against a repayment of {}",
            breakdown.total_repayment
        ));
    }

    let implied_monthly_rate = match implied_rate(&terms, breakdown.emi_amount) {
        Ok(r) => Some(r.round_dp(6)),
        Err(e) => {
            tracing::warn!(error = %e, "implied monthly rate not solved");
            warnings.push(format!("Implied monthly rate not available: {e}"));
            None
        }
    };

    tracing::debug!(
        principal = %terms.principal,
        rate = %terms.flat_rate_per_100,
        tenure = terms.tenure_months,
        emi = %breakdown.emi_amount,
        "computed flat-rate EMI"
    );

    let output = EmiOutput {
        monthly_interest: breakdown.monthly_interest,
        total_interest: breakdown.total_interest,
        total_repayment: breakdown.total_repayment,
        emi_amount: breakdown.emi_amount,
        scheduled_total,
        rounding_difference,
        implied_monthly_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "interest_basis": "flat, on original principal, per 100 per month",
        "rounding": "2 dp, half-up",
    });

    Ok(with_metadata(
        "Flat-rate EMI (non-amortising)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Turn raw form terms into validated [`LoanTerms`].
///
/// A missing value makes the EMI undefined rather than invalid.
pub fn terms_from_input(input: &EmiInput) -> EmiEngineResult<LoanTerms> {
    let principal = input
        .principal
        .ok_or_else(|| EmiEngineError::ComputationNotApplicable("principal is missing".into()))?;
    let rate = input.flat_rate_per_100.ok_or_else(|| {
        EmiEngineError::ComputationNotApplicable("flat_rate_per_100 is missing".into())
    })?;
    let tenure = input
        .tenure_months
        .ok_or_else(|| EmiEngineError::ComputationNotApplicable("tenure_months is missing".into()))?;
    LoanTerms::new(principal, rate, tenure)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn implied_rate(terms: &LoanTerms, emi_amount: Money) -> EmiEngineResult<Rate> {
    let mut flows = Vec::with_capacity(terms.tenure_months as usize + 1);
    flows.push(-terms.principal);
    flows.extend(std::iter::repeat(emi_amount).take(terms.tenure_months as usize));
    let guess = (terms.flat_rate_per_100 / Decimal::ONE_HUNDRED).max(dec!(0.01));
    time_value::irr(&flows, guess)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_input() -> EmiInput {
        EmiInput {
            principal: Some(dec!(1000)),
            flat_rate_per_100: Some(dec!(2)),
            tenure_months: Some(12),
        }
    }

    #[test]
    fn test_compute_emi_reference() {
        assert_eq!(compute_emi(dec!(1000), dec!(2), 12), dec!(103.33));
    }

    #[test]
    fn test_compute_emi_invalid_is_zero() {
        assert_eq!(compute_emi(dec!(1000), dec!(2), 0), Decimal::ZERO);
        assert_eq!(compute_emi(dec!(1000), dec!(2), -3), Decimal::ZERO);
        assert_eq!(compute_emi(dec!(-1000), dec!(2), 12), Decimal::ZERO);
        assert_eq!(compute_emi(dec!(1000), dec!(-2), 12), Decimal::ZERO);
    }

    #[test]
    fn test_calculate_emi_breakdown() {
        let out = calculate_emi(&reference_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.monthly_interest, dec!(20));
        assert_eq!(r.total_interest, dec!(240));
        assert_eq!(r.total_repayment, dec!(1240));
        assert_eq!(r.emi_amount, dec!(103.33));
        assert_eq!(r.scheduled_total, dec!(1239.96));
        assert_eq!(r.rounding_difference, dec!(-0.04));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_implied_rate_exceeds_flat_rate() {
        let out = calculate_emi(&reference_input()).unwrap();
        let r = out.result.implied_monthly_rate.unwrap();
        // A flat 2% on the original principal costs more than 2% per month on
        // the declining balance.
        assert!(r > dec!(0.02) && r < dec!(0.05), "got {r}");
    }

    #[test]
    fn test_missing_tenure_not_applicable() {
        let mut input = reference_input();
        input.tenure_months = None;
        match calculate_emi(&input).unwrap_err() {
            EmiEngineError::ComputationNotApplicable(msg) => assert!(msg.contains("tenure")),
            other => panic!("Expected ComputationNotApplicable, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_tenure_invalid() {
        let mut input = reference_input();
        input.tenure_months = Some(0);
        match calculate_emi(&input).unwrap_err() {
            EmiEngineError::InvalidInput { field, .. } => assert_eq!(field, "tenure_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_division_has_no_warning() {
        let input = EmiInput {
            principal: Some(dec!(1200)),
            flat_rate_per_100: Some(dec!(1)),
            tenure_months: Some(12),
        };
        let out = calculate_emi(&input).unwrap();
        // 1200 + 12 * 12 = 1344, / 12 = 112
        assert_eq!(out.result.emi_amount, dec!(112));
        assert!(out.result.rounding_difference.is_zero());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_metadata_populated() {
        let out = calculate_emi(&reference_input()).unwrap();
        assert!(!out.methodology.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
