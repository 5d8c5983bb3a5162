//! Trace command - narrate two overlapping deposits

use anyhow::Result;
use colored::Colorize;
use racebank_core::TraceReport;
use rust_decimal::Decimal;

use super::{block_on, get_context};
use crate::output;

pub fn run(amount: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let report = block_on(ctx.trace_service.run(amount))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &TraceReport) {
    println!("{}", "Two Overlapping Deposits".bold());
    println!();
    output::info(&format!(
        "caller 1 and caller 2 each deposit {} into an empty account",
        report.amount
    ));
    println!();

    let mut lines = report.narrative();
    let outcome = lines.pop().unwrap_or_default();
    for line in lines {
        println!("  {}", line);
    }
    println!();
    output::verdict(report.lost_update, &outcome);
}
