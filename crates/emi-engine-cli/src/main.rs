mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::emi::EmiArgs;
use commands::reconcile::ReconcileArgs;
use commands::schedule::{PayArgs, ScheduleArgs};
use commands::summary::SummaryArgs;

/// Flat-rate EMI calculations for vehicle and consumer loans
#[derive(Parser)]
#[command(
    name = "emi",
    version,
    about = "Flat-rate EMI, overdue penalty and collection calculations",
    long_about = "A CLI for loan installment calculations with decimal precision. \
                  Computes flat-rate EMIs, generates monthly repayment schedules, \
                  reconciles late payments against the overdue penalty and summarises \
                  what is pending across a loan book."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the EMI of a flat-rate loan
    Emi(EmiArgs),
    /// Reconcile one installment against its due date and payment
    Reconcile(ReconcileArgs),
    /// Generate the monthly repayment schedule of a loan
    Schedule(ScheduleArgs),
    /// Record or correct a payment on a schedule
    Pay(PayArgs),
    /// Summarise pending and overdue amounts for a loan or a loan book
    Summary(SummaryArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Log to stderr so stdout stays machine readable. `EMI_LOG` takes the usual
/// env-filter directives, e.g. `EMI_LOG=emi_engine_core=debug`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("EMI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::emi::run_emi(args),
        Commands::Reconcile(args) => commands::reconcile::run_reconcile(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Pay(args) => commands::schedule::run_pay(args),
        Commands::Summary(args) => commands::summary::run_summary(args),
        Commands::Version => {
            println!("emi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
