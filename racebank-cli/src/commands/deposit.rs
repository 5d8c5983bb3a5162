//! Deposit command - concurrent deposits on one account

use anyhow::Result;
use colored::Colorize;
use racebank_core::DepositReport;
use rust_decimal::Decimal;

use super::{block_on, get_context};
use crate::output;

pub fn run(
    tasks: Option<usize>,
    amount: Option<Decimal>,
    initial: Option<Decimal>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let settings = &ctx.config.deposits;
    let tasks = tasks.unwrap_or(settings.tasks);
    let amount = amount.unwrap_or(settings.amount);
    let initial = initial.unwrap_or(settings.initial);

    let report = block_on(ctx.deposit_service.run(tasks, amount, initial))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &DepositReport) {
    println!("{}", "Concurrent Deposits".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Deposits", &format!("{} x {}", report.tasks, report.amount)]);
    table.add_row(vec!["Initial balance", &report.initial.to_string()]);
    table.add_row(vec!["Expected balance", &report.expected.to_string()]);
    table.add_row(vec!["Actual balance", &report.actual.to_string()]);
    table.add_row(vec!["Transactions", &report.transaction_count.to_string()]);
    table.add_row(vec!["Money lost", &report.money_lost.to_string()]);
    table.add_row(vec!["Lost updates", &report.lost_updates.to_string()]);
    println!("{}", table);

    output::verdict(
        report.is_corrupted(),
        &format!(
            "{} of {} deposits were overwritten",
            report.lost_updates, report.tasks
        ),
    );
}
