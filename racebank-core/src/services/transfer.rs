//! Transfer service - opposing transfers between two accounts

use std::rc::Rc;

use rust_decimal::Decimal;

use super::runner::{operation, run_concurrently, Operation};
use crate::domain::report::{checked_product, checked_sum};
use crate::domain::result::Result;
use crate::domain::{Account, LatencyProfile, TransferReport};

#[derive(Clone, Copy)]
enum Direction {
    AToB,
    BToA,
}

async fn transfer(
    direction: Direction,
    source: Rc<Account>,
    target: Rc<Account>,
    amount: Decimal,
) -> Result<(Direction, bool)> {
    let moved = source.transfer(Some(target.as_ref()), amount).await?;
    Ok((direction, moved))
}

/// Two-account conservation scenario
pub struct TransferService {
    latency: LatencyProfile,
}

impl TransferService {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }

    /// Run `per_direction` transfers of `amount` each way between two accounts
    /// that both start at `initial`
    pub async fn run(
        &self,
        per_direction: usize,
        amount: Decimal,
        initial: Decimal,
    ) -> Result<TransferReport> {
        // Neither balance can climb past its start plus every credit it receives
        let ceiling = checked_sum(initial, checked_product(amount, per_direction)?)?;
        checked_sum(ceiling, ceiling)?;
        let total_before = checked_sum(initial, initial)?;

        let a = Rc::new(Account::with_balance("account-a", initial).with_latency(self.latency));
        let b = Rc::new(Account::with_balance("account-b", initial).with_latency(self.latency));
        tracing::debug!(per_direction, %amount, %total_before, "starting opposing transfers");

        let mut ops: Vec<Operation<(Direction, bool)>> = Vec::with_capacity(per_direction * 2);
        for _ in 0..per_direction {
            for direction in [Direction::AToB, Direction::BToA] {
                let (source, target) = match direction {
                    Direction::AToB => (Rc::clone(&a), Rc::clone(&b)),
                    Direction::BToA => (Rc::clone(&b), Rc::clone(&a)),
                };
                ops.push(operation(transfer(direction, source, target, amount)));
            }
        }

        let outcomes = run_concurrently(ops).await?;
        let successful = outcomes.iter().fold((0, 0), |(ab, ba), (direction, moved)| {
            match (direction, moved) {
                (Direction::AToB, true) => (ab + 1, ba),
                (Direction::BToA, true) => (ab, ba + 1),
                _ => (ab, ba),
            }
        });

        let report = TransferReport::new(
            a.snapshot(),
            b.snapshot(),
            per_direction,
            amount,
            successful,
            total_before,
        )?;
        if report.is_corrupted() {
            tracing::warn!(
                delta = %report.delta,
                drift = report.drift.as_str(),
                "transfers changed the combined balance"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Drift;

    #[tokio::test]
    async fn test_totals_and_drift_agree() {
        let service = TransferService::new(LatencyProfile::none());
        let report = service.run(5, Decimal::from(10), Decimal::from(1000)).await.unwrap();

        assert_eq!(report.total_before, Decimal::from(2000));
        assert_eq!(report.total_after, report.account_a.balance + report.account_b.balance);
        assert_eq!(report.delta, report.total_after - report.total_before);
        assert_eq!(report.drift, Drift::from_delta(report.delta));
        assert!(report.successful_a_to_b <= 5);
        assert!(report.successful_b_to_a <= 5);
    }

    #[tokio::test]
    async fn test_zero_amount_fails() {
        let service = TransferService::new(LatencyProfile::none());
        let err = service.run(2, Decimal::ZERO, Decimal::from(1000)).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_out_of_range_balances_fail() {
        let service = TransferService::new(LatencyProfile::none());
        let err = service.run(1, Decimal::ONE, Decimal::MAX).await.unwrap_err();
        assert!(matches!(err, crate::domain::result::Error::Overflow(_)));
    }
}
