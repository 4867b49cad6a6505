use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::emi::{compute_emi, terms_from_input, EmiInput};
use crate::reconciliation::policy::PenaltyPolicy;
use crate::schedule::repayment::RepaymentSchedule;
use crate::{types::*, EmiEngineError, EmiEngineResult};

/// Loan terms as they stand while a loan-creation form is open.
///
/// A draft is never mutated in place: every edit goes through
/// [`LoanDraft::reduce`], which returns the next draft with `emi_amount`
/// recomputed. A zero `emi_amount` means the terms are not computable yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDraft {
    pub file_number: String,
    pub principal: Option<Money>,
    pub flat_rate_per_100: Option<Rate>,
    pub tenure_months: Option<i64>,
    pub creation_date: NaiveDate,
    pub emi_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DraftAction {
    SetFileNumber(String),
    SetPrincipal(Option<Money>),
    SetFlatRate(Option<Rate>),
    SetTenure(Option<i64>),
    SetCreationDate(NaiveDate),
    /// Clear every term, keeping the creation date.
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftInput {
    pub draft: LoanDraft,
    #[serde(default)]
    pub actions: Vec<DraftAction>,
}

impl DraftAction {
    /// Build an action from a raw form field. Text that does not parse as a
    /// number clears the value; an unknown field name is an error.
    pub fn from_form_input(field: &str, raw: &str) -> EmiEngineResult<Self> {
        let raw = raw.trim();
        let action = match field {
            "file_number" | "fileNumber" => DraftAction::SetFileNumber(raw.to_string()),
            "principal" | "loanAmount" => DraftAction::SetPrincipal(raw.parse::<Decimal>().ok()),
            "flat_rate_per_100" | "interestRate" => {
                DraftAction::SetFlatRate(raw.parse::<Decimal>().ok())
            }
            "tenure_months" | "tenure" => DraftAction::SetTenure(raw.parse::<i64>().ok()),
            "creation_date" | "loanCreationDate" => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    EmiEngineError::invalid(field, format!("'{raw}' is not a YYYY-MM-DD date: {e}"))
                })?;
                DraftAction::SetCreationDate(date)
            }
            other => {
                return Err(EmiEngineError::invalid(
                    "field",
                    format!("unknown loan draft field '{other}'"),
                ))
            }
        };
        Ok(action)
    }
}

impl LoanDraft {
    pub fn new(creation_date: NaiveDate) -> Self {
        LoanDraft {
            file_number: String::new(),
            principal: None,
            flat_rate_per_100: None,
            tenure_months: None,
            creation_date,
            emi_amount: Decimal::ZERO,
        }
    }

    /// The single update function for drafts.
    pub fn reduce(self, action: DraftAction) -> Self {
        let next = match action {
            DraftAction::SetFileNumber(file_number) => LoanDraft {
                file_number,
                ..self
            },
            DraftAction::SetPrincipal(principal) => LoanDraft { principal, ..self },
            DraftAction::SetFlatRate(flat_rate_per_100) => LoanDraft {
                flat_rate_per_100,
                ..self
            },
            DraftAction::SetTenure(tenure_months) => LoanDraft {
                tenure_months,
                ..self
            },
            DraftAction::SetCreationDate(creation_date) => LoanDraft {
                creation_date,
                ..self
            },
            DraftAction::Reset => LoanDraft::new(self.creation_date),
        };
        next.with_recomputed_emi()
    }

    pub fn is_computable(&self) -> bool {
        !self.emi_amount.is_zero()
    }

    pub fn emi_input(&self) -> EmiInput {
        EmiInput {
            principal: self.principal,
            flat_rate_per_100: self.flat_rate_per_100,
            tenure_months: self.tenure_months,
        }
    }

    /// Validate the draft and generate the loan's schedule.
    pub fn finalize(&self, policy: PenaltyPolicy) -> EmiEngineResult<RepaymentSchedule> {
        let terms = terms_from_input(&self.emi_input())?;
        RepaymentSchedule::new(self.file_number.clone(), terms, self.creation_date, policy)
    }

    fn with_recomputed_emi(self) -> Self {
        let emi_amount = match (self.principal, self.flat_rate_per_100, self.tenure_months) {
            (Some(p), Some(r), Some(t)) => compute_emi(p, r, t),
            _ => Decimal::ZERO,
        };
        LoanDraft { emi_amount, ..self }
    }
}

/// Fold a batch of actions over a draft.
pub fn reduce_draft(input: DraftInput) -> LoanDraft {
    input
        .actions
        .into_iter()
        .fold(input.draft.with_recomputed_emi(), LoanDraft::reduce)
}
