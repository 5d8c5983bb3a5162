//! Mixed service - deposits and withdrawals racing on one account

use std::rc::Rc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::runner::{operation, run_concurrently, Operation};
use crate::domain::report::{checked_difference, checked_product, checked_sum};
use crate::domain::result::Result;
use crate::domain::{Account, LatencyProfile, MixedReport};

/// What to throw at the account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixedPlan {
    pub initial: Decimal,
    pub deposits: usize,
    pub deposit_amount: Decimal,
    pub withdrawals: usize,
    pub withdrawal_amount: Decimal,
}

impl MixedPlan {
    /// Fails with `Overflow` when the plan's totals do not fit in a `Decimal`
    pub fn check_range(&self) -> Result<()> {
        let deposited = checked_product(self.deposit_amount, self.deposits)?;
        let withdrawn = checked_product(self.withdrawal_amount, self.withdrawals)?;
        checked_difference(checked_sum(self.initial, deposited)?, withdrawn)?;
        Ok(())
    }
}

/// Result of one spawned operation
enum Outcome {
    Deposited,
    Withdrew(bool),
}

async fn deposit(account: Rc<Account>, amount: Decimal) -> Result<Outcome> {
    account.deposit(amount).await?;
    Ok(Outcome::Deposited)
}

async fn withdraw(account: Rc<Account>, amount: Decimal) -> Result<Outcome> {
    Ok(Outcome::Withdrew(account.withdraw(amount).await?))
}

/// Mixed deposit/withdrawal scenario
pub struct MixedService {
    latency: LatencyProfile,
}

impl MixedService {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }

    pub async fn run(&self, plan: &MixedPlan) -> Result<MixedReport> {
        plan.check_range()?;
        let account =
            Rc::new(Account::with_balance("mixed", plan.initial).with_latency(self.latency));
        tracing::debug!(
            deposits = plan.deposits,
            withdrawals = plan.withdrawals,
            initial = %plan.initial,
            "starting mixed deposits and withdrawals"
        );

        let mut ops: Vec<Operation<Outcome>> =
            Vec::with_capacity(plan.deposits + plan.withdrawals);
        // Interleave the two kinds so neither gets a head start at spawn time
        for i in 0..plan.deposits.max(plan.withdrawals) {
            if i < plan.deposits {
                let account = Rc::clone(&account);
                let amount = plan.deposit_amount;
                ops.push(operation(deposit(account, amount)));
            }
            if i < plan.withdrawals {
                let account = Rc::clone(&account);
                let amount = plan.withdrawal_amount;
                ops.push(operation(withdraw(account, amount)));
            }
        }

        let outcomes = run_concurrently(ops).await?;
        let mut deposit_amounts = Vec::with_capacity(plan.deposits);
        let mut successful_withdrawals = 0;
        for outcome in outcomes {
            match outcome {
                Outcome::Deposited => deposit_amounts.push(plan.deposit_amount),
                Outcome::Withdrew(true) => successful_withdrawals += 1,
                Outcome::Withdrew(false) => {}
            }
        }

        let report = MixedReport::new(
            account.snapshot(),
            plan.initial,
            &deposit_amounts,
            plan.withdrawal_amount,
            plan.withdrawals,
            successful_withdrawals,
        )?;
        if report.corrupted {
            tracing::warn!(
                expected = %report.expected,
                actual = %report.actual,
                discrepancy = %report.discrepancy,
                "mixed operations corrupted the balance"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> MixedPlan {
        MixedPlan {
            initial: Decimal::from(1000),
            deposits: 6,
            deposit_amount: Decimal::from(50),
            withdrawals: 4,
            withdrawal_amount: Decimal::from(75),
        }
    }

    #[tokio::test]
    async fn test_expected_balance_uses_successful_withdrawals() {
        let service = MixedService::new(LatencyProfile::none());
        let report = service.run(&plan()).await.unwrap();

        assert_eq!(report.deposits, 6);
        assert_eq!(report.deposit_total, Decimal::from(300));
        assert_eq!(report.withdrawals, 4);
        assert_eq!(
            report.withdrawal_total,
            Decimal::from(75) * Decimal::from(report.successful_withdrawals)
        );
        assert_eq!(
            report.expected,
            Decimal::from(1300) - report.withdrawal_total
        );
        assert_eq!(report.account.transaction_count, 6 + report.successful_withdrawals as u64);
    }

    #[tokio::test]
    async fn test_invalid_withdrawal_amount_fails() {
        let mut bad = plan();
        bad.withdrawal_amount = Decimal::from(-1);
        let service = MixedService::new(LatencyProfile::none());
        let err = service.run(&bad).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_out_of_range_plan_fails() {
        let mut huge = plan();
        huge.deposit_amount = Decimal::MAX;
        let service = MixedService::new(LatencyProfile::none());
        let err = service.run(&huge).await.unwrap_err();
        assert!(matches!(err, crate::domain::result::Error::Overflow(_)));
    }
}
