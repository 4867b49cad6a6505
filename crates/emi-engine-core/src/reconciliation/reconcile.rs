use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::reconciliation::policy::PenaltyPolicy;
use crate::{types::*, EmiEngineError, EmiEngineResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Settlement state of one installment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Overpaid,
}

impl PaymentStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Overpaid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Overpaid => "Overpaid",
        };
        f.write_str(s)
    }
}

/// Wire record for a single reconciliation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileInput {
    pub emi_amount: Money,
    pub due_date: NaiveDate,
    /// Actual or proposed payment date; absent means not yet paid.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_amount: Money,
    #[serde(default)]
    pub policy: PenaltyPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub overdue_days: i64,
    pub overdue_amount: Money,
    pub total_due: Money,
    /// Negative when the installment is overpaid.
    pub remaining_amount: Money,
    pub status: PaymentStatus,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reconcile an installment under the default 0.2%-per-day penalty.
pub fn reconcile(
    emi_amount: Money,
    due_date: NaiveDate,
    payment_date: Option<NaiveDate>,
    paid_amount: Money,
) -> EmiEngineResult<Reconciliation> {
    reconcile_with_policy(
        emi_amount,
        due_date,
        payment_date,
        paid_amount,
        &PenaltyPolicy::default(),
    )
}

/// Reconcile an installment from scratch: penalty, amount due, remainder and
/// status are all re-derived from the arguments.
pub fn reconcile_with_policy(
    emi_amount: Money,
    due_date: NaiveDate,
    payment_date: Option<NaiveDate>,
    paid_amount: Money,
    policy: &PenaltyPolicy,
) -> EmiEngineResult<Reconciliation> {
    if emi_amount < Decimal::ZERO {
        return Err(EmiEngineError::invalid(
            "emi_amount",
            "EMI amount cannot be negative.",
        ));
    }
    if paid_amount < Decimal::ZERO {
        return Err(EmiEngineError::invalid(
            "paid_amount",
            "Paid amount cannot be negative.",
        ));
    }
    policy.validate()?;

    // Penalty only for strictly later payment dates.
    let overdue_days = match payment_date {
        Some(paid_on) if paid_on > due_date => (paid_on - due_date).num_days(),
        _ => 0,
    };
    let overdue_amount =
        round_money(emi_amount * policy.daily_penalty_rate * Decimal::from(overdue_days));

    let total_due = emi_amount + overdue_amount;
    let remaining_amount = total_due - paid_amount;
    let status = classify(paid_amount, total_due);

    tracing::trace!(
        %emi_amount,
        overdue_days,
        %overdue_amount,
        %remaining_amount,
        %status,
        "reconciled installment"
    );

    Ok(Reconciliation {
        overdue_days,
        overdue_amount,
        total_due,
        remaining_amount,
        status,
    })
}

/// Envelope-returning form of [`reconcile_with_policy`] for the wire record.
pub fn reconcile_installment(
    input: &ReconcileInput,
) -> EmiEngineResult<ComputationOutput<Reconciliation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = reconcile_with_policy(
        input.emi_amount,
        input.due_date,
        input.payment_date,
        input.paid_amount,
        &input.policy,
    )?;

    if input.payment_date.is_none() && !input.paid_amount.is_zero() {
        warnings.push(
            "paid_amount given without payment_date; no overdue penalty was assessed".into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "daily_penalty_rate": input.policy.daily_penalty_rate.to_string(),
        "penalty_basis": "simple, on the installment amount, per day after due date",
    });

    Ok(with_metadata(
        "Overdue penalty reconciliation",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn classify(paid_amount: Money, total_due: Money) -> PaymentStatus {
    if paid_amount > total_due {
        PaymentStatus::Overpaid
    } else if paid_amount == total_due {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
