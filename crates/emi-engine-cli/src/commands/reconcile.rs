use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use emi_engine_core::reconciliation::reconcile::{self, ReconcileInput};

use crate::input;

/// Arguments for single-installment reconciliation
#[derive(Args)]
pub struct ReconcileArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Installment amount
    #[arg(long)]
    pub emi_amount: Option<Decimal>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due_date: Option<NaiveDate>,

    /// Actual or proposed payment date (YYYY-MM-DD); omit if unpaid
    #[arg(long)]
    pub payment_date: Option<NaiveDate>,

    /// Amount paid so far
    #[arg(long, default_value = "0")]
    pub paid_amount: Decimal,

    /// Penalty policy file (YAML or JSON)
    #[arg(long)]
    pub policy: Option<String>,
}

pub fn run_reconcile(args: ReconcileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rec_input: ReconcileInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => ReconcileInput {
            emi_amount: args
                .emi_amount
                .ok_or("--emi-amount is required (or provide --input)")?,
            due_date: args
                .due_date
                .ok_or("--due-date is required (or provide --input)")?,
            payment_date: args.payment_date,
            paid_amount: args.paid_amount,
            policy: Default::default(),
        },
    };
    if let Some(ref path) = args.policy {
        rec_input.policy = input::policy::load_policy(path)?;
    }

    let result = reconcile::reconcile_installment(&rec_input)?;
    Ok(serde_json::to_value(result)?)
}
