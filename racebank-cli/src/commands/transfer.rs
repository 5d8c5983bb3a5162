//! Transfer command - opposing transfers between two accounts

use anyhow::Result;
use colored::Colorize;
use racebank_core::{Drift, TransferReport};
use rust_decimal::Decimal;

use super::{block_on, get_context};
use crate::output;

pub fn run(
    per_direction: Option<usize>,
    amount: Option<Decimal>,
    initial: Option<Decimal>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let settings = &ctx.config.transfers;
    let per_direction = per_direction.unwrap_or(settings.per_direction);
    let amount = amount.unwrap_or(settings.amount);
    let initial = initial.unwrap_or(settings.initial);

    let report = block_on(ctx.transfer_service.run(per_direction, amount, initial))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &TransferReport) {
    println!("{}", "Opposing Transfers".bold());
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["", report.account_a.name.as_str(), report.account_b.name.as_str()]);
    table.add_row(vec![
        "Successful transfers out".to_string(),
        report.successful_a_to_b.to_string(),
        report.successful_b_to_a.to_string(),
    ]);
    table.add_row(vec![
        "Final balance".to_string(),
        report.account_a.balance.to_string(),
        report.account_b.balance.to_string(),
    ]);
    table.add_row(vec![
        "Transactions".to_string(),
        report.account_a.transaction_count.to_string(),
        report.account_b.transaction_count.to_string(),
    ]);
    println!("{}", table);

    println!("Total before: {}", report.total_before);
    println!("Total after: {}", report.total_after);

    let detail = match report.drift {
        Drift::Created => format!("{} was created out of nothing", report.delta),
        Drift::Destroyed => format!("{} vanished", report.delta.abs()),
        Drift::Conserved => "combined balance conserved".to_string(),
    };
    output::verdict(report.is_corrupted(), &detail);
}
