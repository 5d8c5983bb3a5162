//! Frequency command - corruption rate across repeated trials

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;
use racebank_core::FrequencyReport;
use rust_decimal::Decimal;

use super::{block_on, get_context};
use crate::output;

pub fn run(
    trials: Option<usize>,
    tasks: Option<usize>,
    amount: Option<Decimal>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let settings = &ctx.config.frequency;
    let trials = trials.unwrap_or(settings.trials);
    let tasks = tasks.unwrap_or(settings.tasks);
    let amount = amount.unwrap_or(settings.amount);

    let report = block_on(ctx.frequency_service.run(trials, tasks, amount))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &FrequencyReport) {
    println!("{}", "Corruption Frequency".bold());
    println!();
    println!(
        "{} trials of {} concurrent deposits of {}",
        report.trials, report.tasks_per_trial, report.amount
    );
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Lost updates", "Trials", ""]);
    for (lost, count) in &report.lost_update_histogram {
        table.add_row(vec![
            Cell::new(lost),
            Cell::new(count),
            output::verdict_cell(*lost > 0),
        ]);
    }
    println!("{}", table);

    println!(
        "Corrupted trials: {} / {} ({:.1}%)",
        report.corrupted_trials.to_string().red(),
        report.trials,
        report.corruption_rate
    );
    println!("Clean trials: {}", report.clean_trials().to_string().green());
}
