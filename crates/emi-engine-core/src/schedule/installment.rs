use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reconciliation::policy::PenaltyPolicy;
use crate::reconciliation::reconcile::{reconcile_with_policy, PaymentStatus, Reconciliation};
use crate::types::Money;
use crate::EmiEngineResult;

/// One month of a repayment schedule.
///
/// `emi_number`, `due_date` and `emi_amount` are fixed at loan creation.
/// `paid_amount` and `payment_date` change only through [`Installment::apply`];
/// the remaining fields are derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub emi_number: u32,
    pub due_date: NaiveDate,
    pub emi_amount: Money,
    #[serde(default)]
    pub paid_amount: Money,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub overdue_amount: Money,
    pub remaining_amount: Money,
    #[serde(default)]
    pub status: PaymentStatus,
}

/// A payment or correction event. Replaces the recorded values, it does not
/// add to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub paid_amount: Money,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
}

impl StatusTransition {
    /// A settled installment fell back to pending after a correction.
    pub fn regressed(&self) -> bool {
        self.from.is_settled() && self.to == PaymentStatus::Pending
    }

    pub fn settled(&self) -> bool {
        !self.from.is_settled() && self.to.is_settled()
    }
}

impl Installment {
    pub fn new(emi_number: u32, due_date: NaiveDate, emi_amount: Money) -> Self {
        Installment {
            emi_number,
            due_date,
            emi_amount,
            paid_amount: Decimal::ZERO,
            payment_date: None,
            overdue_amount: Decimal::ZERO,
            remaining_amount: emi_amount,
            status: PaymentStatus::Pending,
        }
    }

    /// Record a payment or correct an earlier one, recomputing everything
    /// derived from scratch. On error the installment is left untouched.
    pub fn apply(
        &mut self,
        update: &PaymentUpdate,
        policy: &PenaltyPolicy,
    ) -> EmiEngineResult<StatusTransition> {
        let rec = reconcile_with_policy(
            self.emi_amount,
            self.due_date,
            update.payment_date,
            update.paid_amount,
            policy,
        )?;
        let from = self.status;

        self.paid_amount = update.paid_amount;
        self.payment_date = update.payment_date;
        self.set_derived(&rec);

        let transition = StatusTransition {
            from,
            to: self.status,
        };
        if transition.regressed() {
            tracing::warn!(
                emi_number = self.emi_number,
                remaining = %self.remaining_amount,
                "settled installment reverted to Pending after correction"
            );
        } else {
            tracing::debug!(
                emi_number = self.emi_number,
                from = %transition.from,
                to = %transition.to,
                "installment updated"
            );
        }
        Ok(transition)
    }

    /// Re-derive penalty, remainder and status from the stored payment.
    pub fn refresh(&mut self, policy: &PenaltyPolicy) -> EmiEngineResult<()> {
        let rec = self.reconciliation(policy)?;
        self.set_derived(&rec);
        Ok(())
    }

    /// Reconciliation of the stored payment, without mutating.
    pub fn reconciliation(&self, policy: &PenaltyPolicy) -> EmiEngineResult<Reconciliation> {
        reconcile_with_policy(
            self.emi_amount,
            self.due_date,
            self.payment_date,
            self.paid_amount,
            policy,
        )
    }

    fn set_derived(&mut self, rec: &Reconciliation) {
        self.overdue_amount = rec.overdue_amount;
        self.remaining_amount = rec.remaining_amount;
        self.status = rec.status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pay(amount: Money, on: &str) -> PaymentUpdate {
        PaymentUpdate {
            paid_amount: amount,
            payment_date: Some(d(on)),
        }
    }

    #[test]
    fn test_new_is_pending_for_full_amount() {
        let inst = Installment::new(1, d("2024-02-01"), dec!(103.33));
        assert_eq!(inst.status, PaymentStatus::Pending);
        assert_eq!(inst.remaining_amount, dec!(103.33));
    }

    #[test]
    fn test_pending_to_paid() {
        let mut inst = Installment::new(1, d("2024-01-01"), dec!(1000));
        let t = inst
            .apply(&pay(dec!(1000), "2024-01-01"), &PenaltyPolicy::default())
            .unwrap();
        assert!(t.settled());
        assert_eq!(inst.status, PaymentStatus::Paid);
        assert_eq!(inst.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn test_pending_to_overpaid() {
        let mut inst = Installment::new(1, d("2024-01-01"), dec!(1000));
        let t = inst
            .apply(&pay(dec!(1050), "2023-12-30"), &PenaltyPolicy::default())
            .unwrap();
        assert_eq!(t.to, PaymentStatus::Overpaid);
        assert_eq!(inst.remaining_amount, dec!(-50));
    }

    #[test]
    fn test_late_date_correction_regresses_paid() {
        let policy = PenaltyPolicy::default();
        let mut inst = Installment::new(1, d("2024-01-01"), dec!(1000));
        inst.apply(&pay(dec!(1000), "2024-01-01"), &policy).unwrap();
        assert_eq!(inst.status, PaymentStatus::Paid);

        // The payment actually came in ten days late: 20 of penalty now owed.
        let t = inst.apply(&pay(dec!(1000), "2024-01-11"), &policy).unwrap();
        assert!(t.regressed());
        assert_eq!(inst.overdue_amount, dec!(20));
        assert_eq!(inst.remaining_amount, dec!(20));
    }

    #[test]
    fn test_earlier_date_removes_penalty_and_recomputes() {
        let policy = PenaltyPolicy::default();
        let mut inst = Installment::new(1, d("2024-01-01"), dec!(1000));
        inst.apply(&pay(dec!(1020), "2024-01-11"), &policy).unwrap();
        assert_eq!(inst.status, PaymentStatus::Paid);

        inst.apply(&pay(dec!(1020), "2024-01-01"), &policy).unwrap();
        assert_eq!(inst.overdue_amount, Decimal::ZERO);
        assert_eq!(inst.remaining_amount, dec!(-20));
        assert_eq!(inst.status, PaymentStatus::Overpaid);
    }

    #[test]
    fn test_invalid_update_leaves_installment_untouched() {
        let mut inst = Installment::new(1, d("2024-01-01"), dec!(1000));
        let before = inst.clone();
        assert!(inst
            .apply(&pay(dec!(-5), "2024-01-01"), &PenaltyPolicy::default())
            .is_err());
        assert_eq!(inst, before);
    }
}
