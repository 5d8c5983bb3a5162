//! Deposit service - concurrent deposits on one account

use std::rc::Rc;

use rust_decimal::Decimal;

use super::runner::run_concurrently;
use crate::domain::result::Result;
use crate::domain::{Account, DepositReport, LatencyProfile};

/// Concurrent deposit scenario
pub struct DepositService {
    latency: LatencyProfile,
}

impl DepositService {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }

    /// Run `tasks` concurrent deposits of `amount` on an account holding `initial`
    pub async fn run(
        &self,
        tasks: usize,
        amount: Decimal,
        initial: Decimal,
    ) -> Result<DepositReport> {
        let account = Account::with_balance("deposits", initial).with_latency(self.latency);
        self.run_on(Rc::new(account), tasks, amount).await
    }

    /// Same as [`run`](Self::run) against an existing account
    ///
    /// The account's current balance is taken as the starting point. Fails
    /// with `Overflow` before any deposit runs when the expected balance does
    /// not fit in a `Decimal`.
    pub async fn run_on(
        &self,
        account: Rc<Account>,
        tasks: usize,
        amount: Decimal,
    ) -> Result<DepositReport> {
        let initial = account.balance();
        DepositReport::expected(tasks, amount, initial)?;
        tracing::debug!(tasks, %amount, %initial, "starting concurrent deposits");

        let ops: Vec<_> = (0..tasks)
            .map(|_| {
                let account = Rc::clone(&account);
                async move { account.deposit(amount).await }
            })
            .collect();
        run_concurrently(ops).await?;

        let report = DepositReport::new(account.snapshot(), tasks, amount, initial)?;
        if report.is_corrupted() {
            tracing::warn!(
                expected = %report.expected,
                actual = %report.actual,
                lost_updates = report.lost_updates,
                "deposits lost updates"
            );
        }
        Ok(report)
    }
}
