use crate::runner::{run_gate, run_reconciliation};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use registration_tasks::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Registration Scheduled Tasks",
    about = "Cancel registrations requested through support cases on the configured run date",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile cancellation cases and mail the summary (default command)
    Run(RunArgs),
    /// Report whether the configured run date allows a run today
    Gate(RunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Override the configured snapshot directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Override the configured outbox directory
    #[arg(long)]
    pub(crate) outbox_dir: Option<PathBuf>,
    /// Date to evaluate the run gate against (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => run_reconciliation(args),
        Command::Gate(args) => run_gate(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
