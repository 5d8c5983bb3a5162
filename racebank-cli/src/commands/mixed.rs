//! Mixed command - deposits and withdrawals racing together

use anyhow::Result;
use colored::Colorize;
use racebank_core::MixedReport;
use rust_decimal::Decimal;

use super::{block_on, get_context};
use crate::output;

/// Command-line values that replace configured ones
pub struct MixedOverrides {
    pub initial: Option<Decimal>,
    pub deposits: Option<usize>,
    pub deposit_amount: Option<Decimal>,
    pub withdrawals: Option<usize>,
    pub withdrawal_amount: Option<Decimal>,
}

pub fn run(overrides: MixedOverrides, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let mut plan = ctx.config.mixed.plan();
    if let Some(initial) = overrides.initial {
        plan.initial = initial;
    }
    if let Some(deposits) = overrides.deposits {
        plan.deposits = deposits;
    }
    if let Some(amount) = overrides.deposit_amount {
        plan.deposit_amount = amount;
    }
    if let Some(withdrawals) = overrides.withdrawals {
        plan.withdrawals = withdrawals;
    }
    if let Some(amount) = overrides.withdrawal_amount {
        plan.withdrawal_amount = amount;
    }

    let report = block_on(ctx.mixed_service.run(&plan))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &MixedReport) {
    println!("{}", "Mixed Deposits and Withdrawals".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Initial balance", &report.initial.to_string()]);
    table.add_row(vec![
        "Deposits",
        &format!("{} (total {})", report.deposits, report.deposit_total),
    ]);
    table.add_row(vec![
        "Withdrawals",
        &format!(
            "{} of {} succeeded (total {})",
            report.successful_withdrawals, report.withdrawals, report.withdrawal_total
        ),
    ]);
    table.add_row(vec!["Expected balance", &report.expected.to_string()]);
    table.add_row(vec!["Actual balance", &report.actual.to_string()]);
    table.add_row(vec!["Discrepancy", &report.discrepancy.to_string()]);
    println!("{}", table);

    output::verdict(
        report.corrupted,
        &format!("balance is off by {}", report.discrepancy),
    );
}
