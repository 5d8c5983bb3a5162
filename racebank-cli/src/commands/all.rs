//! All command - run every scenario with configured defaults

use anyhow::{bail, Result};
use racebank_core::{
    DepositReport, FrequencyReport, MixedReport, OperationResult, RacebankContext, TraceReport,
    TransferReport, WithdrawalReport,
};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{block_on, deposit, frequency, get_context, mixed, trace, transfer, withdraw};
use crate::output;

/// JSON output structure
#[derive(Serialize)]
struct AllOutput {
    deposits: OperationResult<DepositReport>,
    withdrawals: OperationResult<WithdrawalReport>,
    mixed: OperationResult<MixedReport>,
    transfers: OperationResult<TransferReport>,
    frequency: OperationResult<FrequencyReport>,
    trace: OperationResult<TraceReport>,
}

impl AllOutput {
    fn failures(&self) -> Vec<&str> {
        [
            &self.deposits.error,
            &self.withdrawals.error,
            &self.mixed.error,
            &self.transfers.error,
            &self.frequency.error,
            &self.trace.error,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect()
    }
}

async fn run_all(ctx: &RacebankContext) -> AllOutput {
    let config = &ctx.config;
    AllOutput {
        deposits: ctx
            .deposit_service
            .run(config.deposits.tasks, config.deposits.amount, config.deposits.initial)
            .await
            .into(),
        withdrawals: ctx
            .withdrawal_service
            .run(config.withdrawals.tasks, config.withdrawals.amount, config.withdrawals.initial)
            .await
            .into(),
        mixed: ctx.mixed_service.run(&config.mixed.plan()).await.into(),
        transfers: ctx
            .transfer_service
            .run(config.transfers.per_direction, config.transfers.amount, config.transfers.initial)
            .await
            .into(),
        frequency: ctx
            .frequency_service
            .run(config.frequency.trials, config.frequency.tasks, config.frequency.amount)
            .await
            .into(),
        trace: ctx.trace_service.run(Decimal::from(100)).await.into(),
    }
}

fn print_section<T>(result: &OperationResult<T>, print: impl Fn(&T)) {
    match (&result.data, &result.error) {
        (Some(report), _) => print(report),
        (None, Some(e)) => output::error(e),
        (None, None) => {}
    }
    println!();
}

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let all = block_on(run_all(&ctx))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&all)?);
    } else {
        print_section(&all.deposits, deposit::print_report);
        print_section(&all.withdrawals, withdraw::print_report);
        print_section(&all.mixed, mixed::print_report);
        print_section(&all.transfers, transfer::print_report);
        print_section(&all.frequency, frequency::print_report);
        print_section(&all.trace, trace::print_report);
    }

    let failures = all.failures();
    if !failures.is_empty() {
        bail!("{} scenario(s) failed: {}", failures.len(), failures.join("; "));
    }
    Ok(())
}
