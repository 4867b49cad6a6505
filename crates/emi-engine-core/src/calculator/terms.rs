use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EmiEngineError;
use crate::types::{round_money, Money, Rate};
use crate::EmiEngineResult;

/// Validated, immutable terms of a flat-rate loan.
///
/// `flat_rate_per_100` is the interest charged per 100 currency units of
/// principal per month, always on the original principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub flat_rate_per_100: Rate,
    pub tenure_months: u32,
}

/// The intermediate figures of the flat-interest EMI derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatBreakdown {
    pub monthly_interest: Money,
    pub total_interest: Money,
    pub total_repayment: Money,
    pub emi_amount: Money,
}

impl LoanTerms {
    pub fn new(
        principal: Money,
        flat_rate_per_100: Rate,
        tenure_months: i64,
    ) -> EmiEngineResult<Self> {
        if tenure_months <= 0 {
            return Err(EmiEngineError::invalid(
                "tenure_months",
                format!("Tenure must be a positive number of months, got {tenure_months}."),
            ));
        }
        let tenure_months = u32::try_from(tenure_months).map_err(|_| {
            EmiEngineError::invalid("tenure_months", "Tenure exceeds the supported range.")
        })?;
        let terms = LoanTerms {
            principal,
            flat_rate_per_100,
            tenure_months,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// Re-check the invariants, for terms that arrived through deserialisation.
    pub fn validate(&self) -> EmiEngineResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(EmiEngineError::invalid(
                "principal",
                "Principal must be positive.",
            ));
        }
        if self.flat_rate_per_100 < Decimal::ZERO {
            return Err(EmiEngineError::invalid(
                "flat_rate_per_100",
                "Interest rate cannot be negative.",
            ));
        }
        if self.tenure_months == 0 {
            return Err(EmiEngineError::invalid(
                "tenure_months",
                "Tenure must be at least one month.",
            ));
        }
        Ok(())
    }

    /// Flat-interest derivation. Every figure is rounded for display, the EMI
    /// from the unrounded repayment.
    pub fn breakdown(&self) -> FlatBreakdown {
        let months = Decimal::from(self.tenure_months);
        let monthly_interest = self.principal * self.flat_rate_per_100 / Decimal::ONE_HUNDRED;
        let total_interest = monthly_interest * months;
        let total_repayment = self.principal + total_interest;
        FlatBreakdown {
            monthly_interest: round_money(monthly_interest),
            total_interest: round_money(total_interest),
            total_repayment: round_money(total_repayment),
            emi_amount: round_money(total_repayment / months),
        }
    }

    pub fn emi(&self) -> Money {
        self.breakdown().emi_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_rejects_zero_tenure() {
        let err = LoanTerms::new(dec!(1000), dec!(2), 0).unwrap_err();
        match err {
            EmiEngineError::InvalidInput { field, .. } => assert_eq!(field, "tenure_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_negative_principal() {
        let err = LoanTerms::new(dec!(-1), dec!(2), 12).unwrap_err();
        match err {
            EmiEngineError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_negative_rate() {
        assert!(LoanTerms::new(dec!(1000), dec!(-0.5), 12).is_err());
    }

    #[test]
    fn test_breakdown_reference_loan() {
        let terms = LoanTerms::new(dec!(1000), dec!(2), 12).unwrap();
        let b = terms.breakdown();
        assert_eq!(b.monthly_interest, dec!(20));
        assert_eq!(b.total_interest, dec!(240));
        assert_eq!(b.total_repayment, dec!(1240));
        assert_eq!(b.emi_amount, dec!(103.33));
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        let terms = LoanTerms::new(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(terms.emi(), dec!(100));
    }
}
