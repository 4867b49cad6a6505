use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use emi_engine_core::schedule::repayment::RepaymentSchedule;
use emi_engine_core::summary::loan::{self, LoanSummaryInput};
use emi_engine_core::summary::portfolio::{self, PortfolioInput};

use crate::commands::today;
use crate::input;

/// Arguments for loan / portfolio summaries
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON input: one schedule, an array of schedules, or
    /// {"loans": [...], "as_of": ...}
    #[arg(long)]
    pub input: Option<String>,

    /// Date to summarise as of (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: Value = input::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for summary")?;

    let as_of = args.as_of;
    let result = if data.is_array() {
        let loans: Vec<RepaymentSchedule> = serde_json::from_value(data)?;
        let out = portfolio::portfolio_summary(&PortfolioInput {
            loans,
            as_of: as_of.unwrap_or_else(today),
        })?;
        serde_json::to_value(out)?
    } else if data.get("loans").is_some() {
        let mut parsed: PortfolioInput = serde_json::from_value(data)?;
        if let Some(as_of) = as_of {
            parsed.as_of = as_of;
        }
        serde_json::to_value(portfolio::portfolio_summary(&parsed)?)?
    } else if data.get("schedule").is_some() {
        let mut parsed: LoanSummaryInput = serde_json::from_value(data)?;
        if let Some(as_of) = as_of {
            parsed.as_of = as_of;
        }
        serde_json::to_value(loan::loan_summary(&parsed)?)?
    } else {
        let schedule: RepaymentSchedule = serde_json::from_value(data)?;
        let out = loan::loan_summary(&LoanSummaryInput {
            schedule,
            as_of: as_of.unwrap_or_else(today),
        })?;
        serde_json::to_value(out)?
    };
    Ok(result)
}
