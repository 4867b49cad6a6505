use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use emi_engine_core::calculator::emi::{self, EmiInput};

use crate::input;

/// Arguments for EMI calculation
#[derive(Args)]
pub struct EmiArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long, alias = "loan-amount")]
    pub principal: Option<Decimal>,

    /// Interest per 100 of principal per month
    #[arg(long, alias = "flat-rate-per-100")]
    pub rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long, alias = "tenure-months", allow_hyphen_values = true)]
    pub tenure: Option<i64>,
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let emi_input: EmiInput = match input::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => EmiInput {
            principal: args.principal,
            flat_rate_per_100: args.rate,
            tenure_months: args.tenure,
        },
    };
    let result = emi::calculate_emi(&emi_input)?;
    Ok(serde_json::to_value(result)?)
}
