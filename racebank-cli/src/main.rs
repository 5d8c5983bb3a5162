//! Racebank CLI - reproduce race conditions on demand

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;
mod output;

use commands::{all, config, deposit, frequency, mixed, trace, transfer, withdraw};

/// Racebank - a bank account that races on purpose
#[derive(Parser)]
#[command(name = "rb", version, about, long_about = None)]
struct Cli {
    /// Log scenario progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concurrent deposits on one account (lost updates)
    Deposit {
        /// Number of concurrent deposits
        #[arg(long, short)]
        tasks: Option<usize>,
        /// Amount per deposit
        #[arg(long, short, allow_hyphen_values = true)]
        amount: Option<Decimal>,
        /// Starting balance
        #[arg(long, allow_hyphen_values = true)]
        initial: Option<Decimal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Concurrent withdrawals on one account (overdrafts)
    Withdraw {
        /// Number of concurrent withdrawals
        #[arg(long, short)]
        tasks: Option<usize>,
        /// Amount per withdrawal
        #[arg(long, short, allow_hyphen_values = true)]
        amount: Option<Decimal>,
        /// Starting balance
        #[arg(long, allow_hyphen_values = true)]
        initial: Option<Decimal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposits and withdrawals racing together
    Mixed {
        /// Starting balance
        #[arg(long, allow_hyphen_values = true)]
        initial: Option<Decimal>,
        /// Number of concurrent deposits
        #[arg(long)]
        deposits: Option<usize>,
        /// Amount per deposit
        #[arg(long, allow_hyphen_values = true)]
        deposit_amount: Option<Decimal>,
        /// Number of concurrent withdrawals
        #[arg(long)]
        withdrawals: Option<usize>,
        /// Amount per withdrawal
        #[arg(long, allow_hyphen_values = true)]
        withdrawal_amount: Option<Decimal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Opposing transfers between two accounts (money creation/destruction)
    Transfer {
        /// Transfers in each direction
        #[arg(long, short)]
        per_direction: Option<usize>,
        /// Amount per transfer
        #[arg(long, short, allow_hyphen_values = true)]
        amount: Option<Decimal>,
        /// Starting balance of each account
        #[arg(long, allow_hyphen_values = true)]
        initial: Option<Decimal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Repeat a concurrent deposit trial and report the corruption rate
    Frequency {
        /// Number of trials
        #[arg(long)]
        trials: Option<usize>,
        /// Concurrent deposits per trial
        #[arg(long, short)]
        tasks: Option<usize>,
        /// Amount per deposit
        #[arg(long, short, allow_hyphen_values = true)]
        amount: Option<Decimal>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Step-by-step trace of two overlapping deposits
    Trace {
        /// Amount per deposit
        #[arg(long, short, default_value = "100", allow_hyphen_values = true)]
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every scenario with configured defaults
    All {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or create the settings file
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    commands::init_logging(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Deposit {
            tasks,
            amount,
            initial,
            json,
        } => deposit::run(tasks, amount, initial, json),
        Commands::Withdraw {
            tasks,
            amount,
            initial,
            json,
        } => withdraw::run(tasks, amount, initial, json),
        Commands::Mixed {
            initial,
            deposits,
            deposit_amount,
            withdrawals,
            withdrawal_amount,
            json,
        } => {
            let overrides = mixed::MixedOverrides {
                initial,
                deposits,
                deposit_amount,
                withdrawals,
                withdrawal_amount,
            };
            mixed::run(overrides, json)
        }
        Commands::Transfer {
            per_direction,
            amount,
            initial,
            json,
        } => transfer::run(per_direction, amount, initial, json),
        Commands::Frequency {
            trials,
            tasks,
            amount,
            json,
        } => frequency::run(trials, tasks, amount, json),
        Commands::Trace { amount, json } => trace::run(amount, json),
        Commands::All { json } => all::run(json),
        Commands::Config { command } => config::run(command),
    }
}
