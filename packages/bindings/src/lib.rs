use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use emi_engine_core::{calculator, draft, reconciliation, schedule, summary};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, raw: &str) -> NapiResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| to_napi_error(format!("{field}: '{raw}' is not a number ({e})")))
}

// ---------------------------------------------------------------------------
// EMI calculator
// ---------------------------------------------------------------------------

/// Live EMI for the loan form. Returns "0" when the terms are not computable;
/// callers must treat "0" as "not computed".
#[napi]
pub fn compute_emi(principal: String, flat_rate_per_100: String, tenure_months: i64) -> String {
    let (Ok(p), Ok(r)) = (
        parse_decimal("principal", &principal),
        parse_decimal("flat_rate_per_100", &flat_rate_per_100),
    ) else {
        return Decimal::ZERO.to_string();
    };
    calculator::emi::compute_emi(p, r, tenure_months).to_string()
}

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    let input: calculator::emi::EmiInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calculator::emi::calculate_emi(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[napi]
pub fn reconcile(input_json: String) -> NapiResult<String> {
    let input: reconciliation::reconcile::ReconcileInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = reconciliation::reconcile::reconcile_installment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: schedule::repayment::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::repayment::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn apply_payment(input_json: String) -> NapiResult<String> {
    let input: schedule::repayment::PaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::repayment::apply_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[napi]
pub fn summarize_loan(input_json: String) -> NapiResult<String> {
    let input: summary::loan::LoanSummaryInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = summary::loan::loan_summary(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_portfolio(input_json: String) -> NapiResult<String> {
    let input: summary::portfolio::PortfolioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = summary::portfolio::portfolio_summary(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loan draft
// ---------------------------------------------------------------------------

/// Apply a batch of draft actions and return the next draft.
#[napi]
pub fn reduce_draft(input_json: String) -> NapiResult<String> {
    let input: draft::loan_draft::DraftInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let next = draft::loan_draft::reduce_draft(input);
    serde_json::to_string(&next).map_err(to_napi_error)
}

/// Apply one raw form field edit, as typed, to a draft.
#[napi]
pub fn update_draft_field(draft_json: String, field: String, raw: String) -> NapiResult<String> {
    let current: draft::loan_draft::LoanDraft =
        serde_json::from_str(&draft_json).map_err(to_napi_error)?;
    let action =
        draft::loan_draft::DraftAction::from_form_input(&field, &raw).map_err(to_napi_error)?;
    serde_json::to_string(&current.reduce(action)).map_err(to_napi_error)
}

/// Start an empty draft dated `creation_date` (YYYY-MM-DD).
#[napi]
pub fn new_draft(creation_date: String) -> NapiResult<String> {
    let date = chrono::NaiveDate::parse_from_str(creation_date.trim(), "%Y-%m-%d")
        .map_err(to_napi_error)?;
    serde_json::to_string(&draft::loan_draft::LoanDraft::new(date)).map_err(to_napi_error)
}
