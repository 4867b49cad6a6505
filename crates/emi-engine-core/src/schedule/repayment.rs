use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calculator::terms::LoanTerms;
use crate::reconciliation::policy::PenaltyPolicy;
use crate::schedule::installment::{Installment, PaymentUpdate, StatusTransition};
use crate::{types::*, EmiEngineError, EmiEngineResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The full installment schedule of one loan.
///
/// Installments are generated once from the terms and are never removed
/// individually; deleting the loan drops the whole schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub file_number: String,
    pub terms: LoanTerms,
    pub creation_date: NaiveDate,
    #[serde(default)]
    pub policy: PenaltyPolicy,
    pub installments: Vec<Installment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub file_number: String,
    pub principal: Money,
    pub flat_rate_per_100: Rate,
    pub tenure_months: i64,
    pub creation_date: NaiveDate,
    #[serde(default)]
    pub policy: PenaltyPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub schedule: RepaymentSchedule,
    pub emi_number: u32,
    pub paid_amount: Money,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub emi_number: u32,
    pub transition: StatusTransition,
    pub installment: Installment,
    pub schedule: RepaymentSchedule,
}

// ---------------------------------------------------------------------------
// Schedule generation
// ---------------------------------------------------------------------------

/// One installment per month of tenure. Installment `k` falls due `k` months
/// after `creation_date`, clamped to the end of shorter months.
pub fn generate_schedule(
    terms: &LoanTerms,
    creation_date: NaiveDate,
) -> EmiEngineResult<Vec<Installment>> {
    terms.validate()?;
    let emi_amount = terms.emi();

    (1..=terms.tenure_months)
        .map(|k| -> EmiEngineResult<Installment> {
            let due_date = creation_date
                .checked_add_months(Months::new(k))
                .ok_or_else(|| {
                    EmiEngineError::DateError(format!(
                        "due date of installment {k} after {creation_date} is out of range"
                    ))
                })?;
            Ok(Installment::new(k, due_date, emi_amount))
        })
        .collect()
}

impl RepaymentSchedule {
    pub fn new(
        file_number: impl Into<String>,
        terms: LoanTerms,
        creation_date: NaiveDate,
        policy: PenaltyPolicy,
    ) -> EmiEngineResult<Self> {
        let file_number = file_number.into();
        if file_number.trim().is_empty() {
            return Err(EmiEngineError::invalid(
                "file_number",
                "File number cannot be empty.",
            ));
        }
        policy.validate()?;
        let installments = generate_schedule(&terms, creation_date)?;
        tracing::debug!(
            file_number = %file_number,
            installments = installments.len(),
            "generated repayment schedule"
        );
        Ok(RepaymentSchedule {
            file_number,
            terms,
            creation_date,
            policy,
            installments,
        })
    }

    /// Check the structural invariants: one installment per month numbered
    /// 1..=tenure with no gaps or duplicates, and a constant EMI.
    pub fn validate(&self) -> EmiEngineResult<()> {
        self.terms.validate()?;
        self.policy.validate()?;

        let expected = self.terms.tenure_months as usize;
        if self.installments.len() != expected {
            return Err(EmiEngineError::ScheduleIntegrity(format!(
                "expected {expected} installments, found {}",
                self.installments.len()
            )));
        }

        let mut numbers: Vec<u32> = self.installments.iter().map(|i| i.emi_number).collect();
        numbers.sort_unstable();
        for (idx, n) in numbers.iter().enumerate() {
            let want = idx as u32 + 1;
            if *n != want {
                return Err(EmiEngineError::ScheduleIntegrity(format!(
                    "emi_number sequence broken at {want}: found {n}"
                )));
            }
        }

        let emi = self.terms.emi();
        if let Some(bad) = self.installments.iter().find(|i| i.emi_amount != emi) {
            return Err(EmiEngineError::ScheduleIntegrity(format!(
                "installment {} has EMI {} but the terms give {emi}",
                bad.emi_number, bad.emi_amount
            )));
        }
        Ok(())
    }

    pub fn installment(&self, emi_number: u32) -> EmiEngineResult<&Installment> {
        self.installments
            .iter()
            .find(|i| i.emi_number == emi_number)
            .ok_or(EmiEngineError::InstallmentNotFound { emi_number })
    }

    /// Apply a payment or correction to one installment.
    pub fn apply_payment(
        &mut self,
        emi_number: u32,
        update: &PaymentUpdate,
    ) -> EmiEngineResult<StatusTransition> {
        let policy = self.policy;
        let inst = self
            .installments
            .iter_mut()
            .find(|i| i.emi_number == emi_number)
            .ok_or(EmiEngineError::InstallmentNotFound { emi_number })?;
        inst.apply(update, &policy)
    }

    /// Re-derive every installment from its stored payment.
    pub fn refresh(&mut self) -> EmiEngineResult<()> {
        let policy = self.policy;
        for inst in &mut self.installments {
            inst.refresh(&policy)?;
        }
        Ok(())
    }

    pub fn paid_count(&self) -> usize {
        self.installments
            .iter()
            .filter(|i| i.status.is_settled())
            .count()
    }

    pub fn total_paid(&self) -> Money {
        self.installments.iter().map(|i| i.paid_amount).sum()
    }

    /// Sum of positive remainders; overpayments do not offset other months.
    pub fn total_outstanding(&self) -> Money {
        self.installments
            .iter()
            .map(|i| i.remaining_amount.max(Decimal::ZERO))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Envelope entry points
// ---------------------------------------------------------------------------

pub fn build_schedule(
    input: &ScheduleInput,
) -> EmiEngineResult<ComputationOutput<RepaymentSchedule>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let terms = LoanTerms::new(input.principal, input.flat_rate_per_100, input.tenure_months)?;
    let schedule = RepaymentSchedule::new(
        input.file_number.clone(),
        terms,
        input.creation_date,
        input.policy,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "due_dates": "creation date + k months, clamped to month end",
        "emi_amount": terms.emi().to_string(),
    });

    Ok(with_metadata(
        "Flat-rate repayment schedule",
        &assumptions,
        warnings,
        elapsed,
        schedule,
    ))
}

pub fn apply_payment(input: &PaymentInput) -> EmiEngineResult<ComputationOutput<PaymentOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.schedule.validate()?;
    let mut schedule = input.schedule.clone();
    // Derived fields arrive from the caller; re-derive them before trusting
    // any status.
    schedule.refresh()?;
    let stale = schedule
        .installments
        .iter()
        .zip(&input.schedule.installments)
        .filter(|(fresh, supplied)| fresh != supplied)
        .count();
    if stale > 0 {
        tracing::warn!(
            file_number = %schedule.file_number,
            stale,
            "recomputed installments with stale derived fields"
        );
        warnings.push(format!(
            "{stale} installment(s) carried stale overdue, remaining or status values and were recomputed"
        ));
    }
    let update = PaymentUpdate {
        paid_amount: input.paid_amount,
        payment_date: input.payment_date,
    };
    let transition = schedule.apply_payment(input.emi_number, &update)?;
    if transition.regressed() {
        warnings.push(format!(
            "Installment {} moved from {} back to Pending",
            input.emi_number, transition.from
        ));
    }
    if input.payment_date.is_none() && !input.paid_amount.is_zero() {
        warnings.push("Payment recorded without a payment date; no penalty assessed".into());
    }
    let installment = schedule.installment(input.emi_number)?.clone();

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "file_number": schedule.file_number,
        "daily_penalty_rate": schedule.policy.daily_penalty_rate.to_string(),
    });

    Ok(with_metadata(
        "Installment payment reconciliation",
        &assumptions,
        warnings,
        elapsed,
        PaymentOutcome {
            emi_number: input.emi_number,
            transition,
            installment,
            schedule,
        },
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::reconcile::PaymentStatus;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_schedule() -> RepaymentSchedule {
        let terms = LoanTerms::new(dec!(1000), dec!(2), 12).unwrap();
        RepaymentSchedule::new("F-100", terms, d("2024-01-15"), PenaltyPolicy::default()).unwrap()
    }

    #[test]
    fn test_generates_one_row_per_month() {
        let s = sample_schedule();
        assert_eq!(s.installments.len(), 12);
        assert_eq!(s.installments[0].emi_number, 1);
        assert_eq!(s.installments[0].due_date, d("2024-02-15"));
        assert_eq!(s.installments[11].due_date, d("2025-01-15"));
        assert!(s.installments.iter().all(|i| i.emi_amount == dec!(103.33)));
        s.validate().unwrap();
    }

    #[test]
    fn test_month_end_clamping() {
        let terms = LoanTerms::new(dec!(300), Decimal::ZERO, 3).unwrap();
        let rows = generate_schedule(&terms, d("2024-01-31")).unwrap();
        assert_eq!(rows[0].due_date, d("2024-02-29"));
        assert_eq!(rows[1].due_date, d("2024-03-31"));
        assert_eq!(rows[2].due_date, d("2024-04-30"));
    }

    #[test]
    fn test_empty_file_number_rejected() {
        let terms = LoanTerms::new(dec!(1000), dec!(2), 12).unwrap();
        let err = RepaymentSchedule::new("  ", terms, d("2024-01-15"), PenaltyPolicy::default())
            .unwrap_err();
        match err {
            EmiEngineError::InvalidInput { field, .. } => assert_eq!(field, "file_number"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_detects_gap() {
        let mut s = sample_schedule();
        s.installments[4].emi_number = 13;
        assert!(matches!(
            s.validate().unwrap_err(),
            EmiEngineError::ScheduleIntegrity(_)
        ));
    }

    #[test]
    fn test_validate_detects_duplicate() {
        let mut s = sample_schedule();
        s.installments[4].emi_number = 4;
        assert!(matches!(
            s.validate().unwrap_err(),
            EmiEngineError::ScheduleIntegrity(_)
        ));
    }

    #[test]
    fn test_validate_detects_emi_drift() {
        let mut s = sample_schedule();
        s.installments[2].emi_amount = dec!(100);
        assert!(matches!(
            s.validate().unwrap_err(),
            EmiEngineError::ScheduleIntegrity(_)
        ));
    }

    #[test]
    fn test_apply_payment_unknown_installment() {
        let mut s = sample_schedule();
        let update = PaymentUpdate {
            paid_amount: dec!(103.33),
            payment_date: Some(d("2024-02-15")),
        };
        match s.apply_payment(13, &update).unwrap_err() {
            EmiEngineError::InstallmentNotFound { emi_number } => assert_eq!(emi_number, 13),
            other => panic!("Expected InstallmentNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_payment_counts() {
        let mut s = sample_schedule();
        let update = PaymentUpdate {
            paid_amount: dec!(103.33),
            payment_date: Some(d("2024-02-15")),
        };
        s.apply_payment(1, &update).unwrap();
        assert_eq!(s.paid_count(), 1);
        assert_eq!(s.total_paid(), dec!(103.33));
        assert_eq!(s.total_outstanding(), dec!(103.33) * dec!(11));
    }

    #[test]
    fn test_envelope_apply_payment_reports_transition() {
        let input = PaymentInput {
            schedule: sample_schedule(),
            emi_number: 2,
            paid_amount: dec!(103.33),
            payment_date: Some(d("2024-03-15")),
        };
        let out = apply_payment(&input).unwrap();
        assert_eq!(out.result.transition.from, PaymentStatus::Pending);
        assert_eq!(out.result.transition.to, PaymentStatus::Paid);
        assert_eq!(out.result.installment.status, PaymentStatus::Paid);
        assert_eq!(out.result.schedule.paid_count(), 1);
        // the caller's schedule is not mutated
        assert_eq!(input.schedule.paid_count(), 0);
    }

    #[test]
    fn test_apply_payment_recomputes_stale_rows() {
        let mut tampered = sample_schedule();
        tampered.installments[4].status = PaymentStatus::Paid;
        tampered.installments[4].remaining_amount = Decimal::ZERO;
        let input = PaymentInput {
            schedule: tampered,
            emi_number: 1,
            paid_amount: dec!(103.33),
            payment_date: Some(d("2024-02-15")),
        };
        let out = apply_payment(&input).unwrap();
        let fifth = out.result.schedule.installment(5).unwrap();
        assert_eq!(fifth.status, PaymentStatus::Pending);
        assert_eq!(fifth.remaining_amount, dec!(103.33));
        assert_eq!(out.result.schedule.paid_count(), 1);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_build_schedule_rejects_zero_tenure() {
        let input = ScheduleInput {
            file_number: "F-1".into(),
            principal: dec!(1000),
            flat_rate_per_100: dec!(2),
            tenure_months: 0,
            creation_date: d("2024-01-01"),
            policy: PenaltyPolicy::default(),
        };
        assert!(build_schedule(&input).is_err());
    }
}
