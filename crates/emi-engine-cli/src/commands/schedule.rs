use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use emi_engine_core::schedule::repayment::{self, PaymentInput, RepaymentSchedule, ScheduleInput};

use crate::commands::today;
use crate::input;

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan file number
    #[arg(long)]
    pub file_number: Option<String>,

    /// Loan principal
    #[arg(long, alias = "loan-amount")]
    pub principal: Option<Decimal>,

    /// Interest per 100 of principal per month
    #[arg(long, alias = "flat-rate-per-100")]
    pub rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long, alias = "tenure-months", allow_hyphen_values = true)]
    pub tenure: Option<i64>,

    /// Loan creation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub creation_date: Option<NaiveDate>,

    /// Penalty policy file (YAML or JSON)
    #[arg(long)]
    pub policy: Option<String>,
}

/// Arguments for recording a payment against a schedule
#[derive(Args)]
pub struct PayArgs {
    /// Path to a JSON payment request: {"schedule": ..., "emi_number": ..., ...}
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON schedule, as produced by `emi schedule`
    #[arg(long, conflicts_with = "input")]
    pub schedule: Option<String>,

    /// Installment to pay
    #[arg(long)]
    pub emi_number: Option<u32>,

    /// Total amount paid against the installment
    #[arg(long)]
    pub paid_amount: Option<Decimal>,

    /// Payment date (YYYY-MM-DD)
    #[arg(long)]
    pub payment_date: Option<NaiveDate>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sched_input: ScheduleInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => ScheduleInput {
            file_number: args
                .file_number
                .ok_or("--file-number is required (or provide --input)")?,
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            flat_rate_per_100: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
            creation_date: args.creation_date.unwrap_or_else(today),
            policy: Default::default(),
        },
    };
    if let Some(ref path) = args.policy {
        sched_input.policy = input::policy::load_policy(path)?;
    }

    let result = repayment::build_schedule(&sched_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pay(args: PayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pay_input: PaymentInput = if let Some(ref path) = args.schedule {
        let schedule: RepaymentSchedule = input::read_record(path)?;
        PaymentInput {
            schedule,
            emi_number: args.emi_number.ok_or("--emi-number is required with --schedule")?,
            paid_amount: args.paid_amount.ok_or("--paid-amount is required with --schedule")?,
            payment_date: args.payment_date,
        }
    } else if let Some(parsed) = input::read_input(args.input.as_deref())? {
        parsed
    } else {
        return Err("--input <file.json>, --schedule <file.json> or stdin required for pay".into());
    };

    let result = repayment::apply_payment(&pay_input)?;
    Ok(serde_json::to_value(result)?)
}
