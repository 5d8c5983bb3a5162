//! Config command - show or create the settings file

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use racebank_core::config::{Config, SETTINGS_FILE};

use super::get_racebank_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings (file plus environment overrides)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file without asking
        #[arg(long, short = 'f')]
        force: bool,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => show(json),
        ConfigCommands::Init { force } => init(force),
    }
}

fn show(json: bool) -> Result<()> {
    let racebank_dir = get_racebank_dir()?;
    let config = Config::load(&racebank_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}", "Racebank Settings".bold());
    println!("Directory: {}", racebank_dir.display());
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![
        "Latency".to_string(),
        format!(
            "read {} ms, write {} ms, jitter {} ms",
            config.latency.read_delay_ms, config.latency.write_delay_ms, config.latency.jitter_ms
        ),
    ]);
    table.add_row(vec![
        "Deposits".to_string(),
        format!(
            "{} x {} from {}",
            config.deposits.tasks, config.deposits.amount, config.deposits.initial
        ),
    ]);
    table.add_row(vec![
        "Withdrawals".to_string(),
        format!(
            "{} x {} from {}",
            config.withdrawals.tasks, config.withdrawals.amount, config.withdrawals.initial
        ),
    ]);
    table.add_row(vec![
        "Mixed".to_string(),
        format!(
            "{} x {} in, {} x {} out, from {}",
            config.mixed.deposits,
            config.mixed.deposit_amount,
            config.mixed.withdrawals,
            config.mixed.withdrawal_amount,
            config.mixed.initial
        ),
    ]);
    table.add_row(vec![
        "Transfers".to_string(),
        format!(
            "{} x {} each way, {} per account",
            config.transfers.per_direction, config.transfers.amount, config.transfers.initial
        ),
    ]);
    table.add_row(vec![
        "Frequency".to_string(),
        format!(
            "{} trials of {} x {}",
            config.frequency.trials, config.frequency.tasks, config.frequency.amount
        ),
    ]);
    println!("{}", table);
    Ok(())
}

fn init(force: bool) -> Result<()> {
    let racebank_dir = get_racebank_dir()?;
    let settings_path = racebank_dir.join(SETTINGS_FILE);

    if settings_path.exists() && !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", settings_path.display()))
            .default(false)
            .interact()?;
        if !confirmed {
            output::info("Cancelled");
            return Ok(());
        }
    }

    Config::default().save(&racebank_dir)?;
    output::success(&format!("Wrote default settings to {}", settings_path.display()));
    Ok(())
}
