//! Withdrawal service - concurrent withdrawals racing past the balance check

use std::rc::Rc;

use rust_decimal::Decimal;

use super::runner::run_concurrently;
use crate::domain::result::Result;
use crate::domain::{Account, LatencyProfile, WithdrawalReport};

/// Concurrent withdrawal (overdraft) scenario
pub struct WithdrawalService {
    latency: LatencyProfile,
}

impl WithdrawalService {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }

    /// Run `tasks` concurrent withdrawals of `amount` on an account holding `initial`
    pub async fn run(
        &self,
        tasks: usize,
        amount: Decimal,
        initial: Decimal,
    ) -> Result<WithdrawalReport> {
        WithdrawalReport::check_range(tasks, amount, initial)?;
        let account =
            Rc::new(Account::with_balance("withdrawals", initial).with_latency(self.latency));
        tracing::debug!(tasks, %amount, %initial, "starting concurrent withdrawals");

        let ops: Vec<_> = (0..tasks)
            .map(|_| {
                let account = Rc::clone(&account);
                async move { account.withdraw(amount).await }
            })
            .collect();
        let outcomes = run_concurrently(ops).await?;
        let successful = outcomes.iter().filter(|ok| **ok).count();

        let report =
            WithdrawalReport::new(account.snapshot(), tasks, amount, initial, successful)?;
        if report.overdrawn {
            tracing::warn!(actual = %report.actual, "account overdrawn");
        }
        if report.overpaid > Decimal::ZERO {
            tracing::warn!(
                paid_out = %report.paid_out,
                overpaid = %report.overpaid,
                "withdrawals paid out more than the balance held"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_matches_successful_withdrawals() {
        let service = WithdrawalService::new(LatencyProfile::none());
        let report = service.run(20, Decimal::from(100), Decimal::from(1000)).await.unwrap();
        assert_eq!(report.successful_withdrawals + report.failed_withdrawals, 20);
        assert_eq!(
            report.expected,
            Decimal::from(1000) - Decimal::from(100) * Decimal::from(report.successful_withdrawals)
        );
        assert_eq!(report.overdrawn, report.actual < Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_withdrawal_passes_the_stale_check() {
        let service = WithdrawalService::new(LatencyProfile::from_millis(10, 5, 0));
        let report = service.run(20, Decimal::from(100), Decimal::from(1000)).await.unwrap();

        // All 20 read 1000 before any of them wrote 900
        assert_eq!(report.successful_withdrawals, 20);
        assert_eq!(report.actual, Decimal::from(900));
        assert_eq!(report.paid_out, Decimal::from(2000));
        assert_eq!(report.overpaid, Decimal::from(1000));
        assert_eq!(report.account.transaction_count, 20);
        assert!(report.is_corrupted());
    }
}
