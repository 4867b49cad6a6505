use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::schedule::repayment::RepaymentSchedule;
use crate::summary::loan::{summarize_loan, LoanSummary};
use crate::{types::*, EmiEngineError, EmiEngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub loans: Vec<RepaymentSchedule>,
    pub as_of: NaiveDate,
}

/// Dashboard totals across every loan on the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_loans: u32,
    /// Unsettled installments due on or before `as_of`.
    pub pending_emi_count: u32,
    pub pending_emi_amount: Money,
    /// Loans with at least one overdue installment.
    pub overdue_loan_count: u32,
    pub total_collected: Money,
    pub loans: Vec<LoanSummary>,
}

pub fn summarize_portfolio(
    loans: &[RepaymentSchedule],
    as_of: NaiveDate,
) -> EmiEngineResult<PortfolioSummary> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut summaries = Vec::with_capacity(loans.len());
    let mut pending_count = 0u32;
    let mut pending_amount = Decimal::ZERO;
    let mut overdue_loans = 0u32;
    let mut collected = Decimal::ZERO;

    for loan in loans {
        if !seen.insert(loan.file_number.as_str()) {
            return Err(EmiEngineError::invalid(
                "loans",
                format!("file number {} appears more than once", loan.file_number),
            ));
        }
        let s = summarize_loan(loan, as_of)?;
        pending_count += s.pending_emi_count;
        pending_amount += s.total_pending_amount;
        if s.overdue_emi_count > 0 {
            overdue_loans += 1;
        }
        collected += s.total_paid;
        summaries.push(s);
    }

    Ok(PortfolioSummary {
        total_loans: summaries.len() as u32,
        pending_emi_count: pending_count,
        pending_emi_amount: pending_amount,
        overdue_loan_count: overdue_loans,
        total_collected: collected,
        loans: summaries,
    })
}

pub fn portfolio_summary(
    input: &PortfolioInput,
) -> EmiEngineResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for loan in &input.loans {
        loan.validate()?;
    }
    if input.loans.is_empty() {
        warnings.push("No loans supplied; all totals are zero".into());
    }
    let summary = summarize_portfolio(&input.loans, input.as_of)?;

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "as_of": input.as_of.to_string(),
        "loans": input.loans.len(),
    });

    Ok(with_metadata(
        "Loan portfolio collection summary",
        &assumptions,
        warnings,
        elapsed,
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::terms::LoanTerms;
    use crate::reconciliation::policy::PenaltyPolicy;
    use crate::schedule::installment::PaymentUpdate;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn loan(file_number: &str) -> RepaymentSchedule {
        let terms = LoanTerms::new(dec!(2000), Decimal::ZERO, 2).unwrap();
        RepaymentSchedule::new(file_number, terms, d("2024-01-01"), PenaltyPolicy::default())
            .unwrap()
    }

    #[test]
    fn test_two_loans_one_overdue() {
        let mut paid_up = loan("A-1");
        paid_up
            .apply_payment(
                1,
                &PaymentUpdate {
                    paid_amount: dec!(1000),
                    payment_date: Some(d("2024-02-01")),
                },
            )
            .unwrap();
        let late = loan("A-2");

        // 2024-02-06: A-2's first installment is 5 days late (penalty 10)
        let p = summarize_portfolio(&[paid_up, late], d("2024-02-06")).unwrap();
        assert_eq!(p.total_loans, 2);
        assert_eq!(p.pending_emi_count, 1);
        assert_eq!(p.pending_emi_amount, dec!(1010));
        assert_eq!(p.overdue_loan_count, 1);
        assert_eq!(p.total_collected, dec!(1000));
        assert_eq!(p.loans[1].pending_days, 5);
    }

    #[test]
    fn test_duplicate_file_number_rejected() {
        let err = summarize_portfolio(&[loan("X"), loan("X")], d("2024-02-06")).unwrap_err();
        assert!(matches!(err, EmiEngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_empty_portfolio_warns() {
        let out = portfolio_summary(&PortfolioInput {
            loans: vec![],
            as_of: d("2024-02-06"),
        })
        .unwrap();
        assert_eq!(out.result.total_loans, 0);
        assert_eq!(out.warnings.len(), 1);
    }
}
