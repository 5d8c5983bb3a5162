//! Withdraw command - concurrent withdrawals racing past the balance check

use anyhow::Result;
use colored::Colorize;
use racebank_core::WithdrawalReport;
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
    let settings = &ctx.config.withdrawals;
    let tasks = tasks.unwrap_or(settings.tasks);
    let amount = amount.unwrap_or(settings.amount);
    let initial = initial.unwrap_or(settings.initial);

    let report = block_on(ctx.withdrawal_service.run(tasks, amount, initial))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &WithdrawalReport) {
    println!("{}", "Concurrent Withdrawals".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Withdrawals", &format!("{} x {}", report.tasks, report.amount)]);
    table.add_row(vec!["Initial balance", &report.initial.to_string()]);
    table.add_row(vec!["Successful", &report.successful_withdrawals.to_string()]);
    table.add_row(vec!["Refused", &report.failed_withdrawals.to_string()]);
    table.add_row(vec!["Paid out", &report.paid_out.to_string()]);
    table.add_row(vec!["Expected balance", &report.expected.to_string()]);
    table.add_row(vec!["Actual balance", &report.actual.to_string()]);
    table.add_row(vec!["Overpaid", &report.overpaid.to_string()]);
    println!("{}", table);

    if report.overdrawn {
        output::warning(&format!("Account overdrawn: balance {}", report.actual));
    }
    output::verdict(
        report.is_corrupted(),
        &format!(
            "paid out {} from a balance of {}",
            report.paid_out, report.initial
        ),
    );
}
