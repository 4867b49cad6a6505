use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::reconciliation::policy::PenaltyPolicy;
use crate::reconciliation::reconcile::{reconcile_with_policy, Reconciliation};
use crate::schedule::installment::Installment;
use crate::schedule::repayment::RepaymentSchedule;
use crate::{types::*, EmiEngineResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSummaryInput {
    pub schedule: RepaymentSchedule,
    pub as_of: NaiveDate,
}

/// Collection position of one loan on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub file_number: String,
    pub tenure_months: u32,
    pub paid_emi_count: u32,
    pub remaining_emi_count: u32,
    /// Unsettled installments due on or before `as_of`.
    pub pending_emi_count: u32,
    /// Unsettled installments whose due date has passed.
    pub overdue_emi_count: u32,
    /// Days since the oldest unsettled due date, 0 when nothing is overdue.
    pub pending_days: i64,
    pub total_paid: Money,
    /// Owed now: unsettled installments due on or before `as_of`, with the
    /// penalty accrued to `as_of` for the ones never paid.
    pub total_pending_amount: Money,
    /// Owed over the rest of the loan, including `total_pending_amount`.
    pub total_outstanding: Money,
    pub next_due_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// What an installment would settle for on `as_of`.
///
/// Derived fields stored on the installment are ignored. An installment that
/// the stored payment does not settle, has no payment date and is already
/// past due is reconciled as if paid on `as_of`; every other installment uses
/// its stored payment.
pub fn amount_due_as_of(
    installment: &Installment,
    as_of: NaiveDate,
    policy: &PenaltyPolicy,
) -> EmiEngineResult<Reconciliation> {
    let recorded = installment.reconciliation(policy)?;
    if recorded.status.is_settled()
        || installment.payment_date.is_some()
        || installment.due_date >= as_of
    {
        return Ok(recorded);
    }
    reconcile_with_policy(
        installment.emi_amount,
        installment.due_date,
        Some(as_of),
        installment.paid_amount,
        policy,
    )
}

pub fn summarize_loan(schedule: &RepaymentSchedule, as_of: NaiveDate) -> EmiEngineResult<LoanSummary> {
    let policy = &schedule.policy;
    let mut paid = 0u32;
    let mut pending = 0u32;
    let mut overdue = 0u32;
    let mut oldest_overdue: Option<NaiveDate> = None;
    let mut next_due: Option<NaiveDate> = None;
    let mut pending_amount = Decimal::ZERO;
    let mut outstanding = Decimal::ZERO;

    for inst in &schedule.installments {
        let rec = amount_due_as_of(inst, as_of, policy)?;
        if rec.status.is_settled() {
            paid += 1;
            continue;
        }

        let owed = rec.remaining_amount.max(Decimal::ZERO);
        outstanding += owed;
        if inst.due_date <= as_of {
            pending += 1;
            pending_amount += owed;
        }
        if inst.due_date < as_of {
            overdue += 1;
            oldest_overdue = Some(oldest_overdue.map_or(inst.due_date, |d| d.min(inst.due_date)));
        }
        next_due = Some(next_due.map_or(inst.due_date, |d| d.min(inst.due_date)));
    }

    let tenure = schedule.terms.tenure_months;
    let pending_days = oldest_overdue.map_or(0, |d| (as_of - d).num_days());

    tracing::debug!(
        file_number = %schedule.file_number,
        paid,
        overdue,
        pending_days,
        "summarised loan"
    );

    Ok(LoanSummary {
        file_number: schedule.file_number.clone(),
        tenure_months: tenure,
        paid_emi_count: paid,
        remaining_emi_count: tenure.saturating_sub(paid),
        pending_emi_count: pending,
        overdue_emi_count: overdue,
        pending_days,
        total_paid: schedule.total_paid(),
        total_pending_amount: pending_amount,
        total_outstanding: outstanding,
        next_due_date: next_due,
    })
}

pub fn loan_summary(input: &LoanSummaryInput) -> EmiEngineResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.schedule.validate()?;
    let summary = summarize_loan(&input.schedule, input.as_of)?;

    if input.as_of < input.schedule.creation_date {
        warnings.push(format!(
            "as_of {} is before the loan was created on {}",
            input.as_of, input.schedule.creation_date
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "as_of": input.as_of.to_string(),
        "unpaid_overdue_penalty": "accrued to as_of",
    });

    Ok(with_metadata(
        "Loan collection summary",
        &assumptions,
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
