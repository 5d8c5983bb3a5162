//! Scenario reports
//!
//! Corruption is the output of the system, so every report carries both the
//! arithmetically expected state and the observed one.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountSnapshot;
use super::result::{Error, Result};
use super::trace::{DepositRecord, StepKind, TraceEvent};

/// Tolerance applied before flagging a mixed-scenario balance as corrupted (0.01)
pub fn epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// `amount * count`, or `Overflow`
pub fn checked_product(amount: Decimal, count: usize) -> Result<Decimal> {
    amount
        .checked_mul(Decimal::from(count))
        .ok_or_else(|| Error::overflow(format!("{} x {}", count, amount)))
}

/// `a + b`, or `Overflow`
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| Error::overflow(format!("{} + {}", a, b)))
}

/// `a - b`, or `Overflow`
pub fn checked_difference(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| Error::overflow(format!("{} - {}", a, b)))
}

/// Concurrent deposits on one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositReport {
    pub account: AccountSnapshot,
    pub tasks: usize,
    pub amount: Decimal,
    pub initial: Decimal,
    pub expected: Decimal,
    pub actual: Decimal,
    pub transaction_count: u64,
    /// expected - actual
    pub money_lost: Decimal,
    /// money_lost expressed in whole deposits
    pub lost_updates: u64,
}

impl DepositReport {
    pub fn new(
        account: AccountSnapshot,
        tasks: usize,
        amount: Decimal,
        initial: Decimal,
    ) -> Result<Self> {
        let expected = Self::expected(tasks, amount, initial)?;
        let actual = account.balance;
        let money_lost = checked_difference(expected, actual)?;
        Ok(Self {
            tasks,
            amount,
            initial,
            expected,
            actual,
            transaction_count: account.transaction_count,
            money_lost,
            lost_updates: lost_updates(money_lost, amount),
            account,
        })
    }

    /// Final balance if no deposit were lost: `initial + tasks * amount`
    pub fn expected(tasks: usize, amount: Decimal, initial: Decimal) -> Result<Decimal> {
        checked_sum(initial, checked_product(amount, tasks)?)
    }

    pub fn is_corrupted(&self) -> bool {
        self.actual != self.expected
    }
}

/// Approximate number of overwritten operations behind `money_lost`
pub fn lost_updates(money_lost: Decimal, amount: Decimal) -> u64 {
    if amount <= Decimal::ZERO || money_lost <= Decimal::ZERO {
        return 0;
    }
    (money_lost / amount).round().to_u64().unwrap_or(0)
}

/// Concurrent withdrawals on one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalReport {
    pub account: AccountSnapshot,
    pub tasks: usize,
    pub amount: Decimal,
    pub initial: Decimal,
    pub successful_withdrawals: usize,
    pub failed_withdrawals: usize,
    /// initial - amount * successful_withdrawals
    pub expected: Decimal,
    pub actual: Decimal,
    /// Money handed out by successful withdrawals
    pub paid_out: Decimal,
    /// Money handed out beyond the initial balance
    pub overpaid: Decimal,
    /// Final balance dropped below zero
    pub overdrawn: bool,
}

impl WithdrawalReport {
    pub fn new(
        account: AccountSnapshot,
        tasks: usize,
        amount: Decimal,
        initial: Decimal,
        successful_withdrawals: usize,
    ) -> Result<Self> {
        let paid_out = checked_product(amount, successful_withdrawals)?;
        let actual = account.balance;
        Ok(Self {
            tasks,
            amount,
            initial,
            successful_withdrawals,
            failed_withdrawals: tasks.saturating_sub(successful_withdrawals),
            expected: checked_difference(initial, paid_out)?,
            actual,
            paid_out,
            overpaid: checked_difference(paid_out, initial)?.max(Decimal::ZERO),
            overdrawn: actual < Decimal::ZERO,
            account,
        })
    }

    /// Checks that every figure of a run with `tasks` withdrawals fits in a `Decimal`
    pub fn check_range(tasks: usize, amount: Decimal, initial: Decimal) -> Result<()> {
        let most = checked_product(amount, tasks)?;
        checked_difference(initial, most)?;
        checked_difference(most, initial)?;
        Ok(())
    }

    /// Observed balance differs from what the successful withdrawals imply
    pub fn discrepancy(&self) -> Decimal {
        self.actual.saturating_sub(self.expected)
    }

    pub fn is_corrupted(&self) -> bool {
        self.actual != self.expected || self.overdrawn || self.overpaid > Decimal::ZERO
    }
}

/// Concurrent deposits and withdrawals together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixedReport {
    pub account: AccountSnapshot,
    pub initial: Decimal,
    pub deposits: usize,
    pub deposit_total: Decimal,
    pub withdrawals: usize,
    pub successful_withdrawals: usize,
    pub withdrawal_total: Decimal,
    pub expected: Decimal,
    pub actual: Decimal,
    /// actual - expected
    pub discrepancy: Decimal,
    pub corrupted: bool,
}

impl MixedReport {
    pub fn new(
        account: AccountSnapshot,
        initial: Decimal,
        deposit_amounts: &[Decimal],
        withdrawal_amount: Decimal,
        withdrawals: usize,
        successful_withdrawals: usize,
    ) -> Result<Self> {
        let deposit_total = deposit_amounts
            .iter()
            .try_fold(Decimal::ZERO, |total, amount| checked_sum(total, *amount))?;
        let withdrawal_total = checked_product(withdrawal_amount, successful_withdrawals)?;
        let expected = checked_difference(checked_sum(initial, deposit_total)?, withdrawal_total)?;
        let actual = account.balance;
        let discrepancy = checked_difference(actual, expected)?;
        Ok(Self {
            initial,
            deposits: deposit_amounts.len(),
            deposit_total,
            withdrawals,
            successful_withdrawals,
            withdrawal_total,
            expected,
            actual,
            discrepancy,
            corrupted: discrepancy.abs() > epsilon(),
            account,
        })
    }
}

/// Direction of a change in the combined balance of two accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Drift {
    /// Combined balance went up
    Created,
    /// Combined balance went down
    Destroyed,
    Conserved,
}

impl Drift {
    pub fn from_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            Drift::Created
        } else if delta < Decimal::ZERO {
            Drift::Destroyed
        } else {
            Drift::Conserved
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Drift::Created => "created",
            Drift::Destroyed => "destroyed",
            Drift::Conserved => "conserved",
        }
    }
}

/// Opposing concurrent transfers between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReport {
    pub account_a: AccountSnapshot,
    pub account_b: AccountSnapshot,
    pub per_direction: usize,
    pub amount: Decimal,
    pub successful_a_to_b: usize,
    pub successful_b_to_a: usize,
    pub total_before: Decimal,
    pub total_after: Decimal,
    /// total_after - total_before
    pub delta: Decimal,
    pub drift: Drift,
}

impl TransferReport {
    pub fn new(
        account_a: AccountSnapshot,
        account_b: AccountSnapshot,
        per_direction: usize,
        amount: Decimal,
        successful: (usize, usize),
        total_before: Decimal,
    ) -> Result<Self> {
        let total_after = checked_sum(account_a.balance, account_b.balance)?;
        let delta = checked_difference(total_after, total_before)?;
        Ok(Self {
            account_a,
            account_b,
            per_direction,
            amount,
            successful_a_to_b: successful.0,
            successful_b_to_a: successful.1,
            total_before,
            total_after,
            delta,
            drift: Drift::from_delta(delta),
        })
    }

    pub fn is_corrupted(&self) -> bool {
        self.drift != Drift::Conserved
    }
}

/// Outcome of one trial inside a frequency run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub corrupted: bool,
    pub lost_updates: u64,
}

/// Corruption rate across repeated concurrent-deposit trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyReport {
    pub trials: usize,
    pub tasks_per_trial: usize,
    pub amount: Decimal,
    pub corrupted_trials: usize,
    /// Percentage of trials whose final balance missed the expectation
    pub corruption_rate: f64,
    /// Lost updates per trial -> number of trials
    pub lost_update_histogram: BTreeMap<u64, usize>,
}

impl FrequencyReport {
    pub fn new(
        tasks_per_trial: usize,
        amount: Decimal,
        corrupted_trials: usize,
        outcomes: &[TrialOutcome],
    ) -> Self {
        let trials = outcomes.len();
        let mut lost_update_histogram = BTreeMap::new();
        for outcome in outcomes {
            *lost_update_histogram.entry(outcome.lost_updates).or_insert(0) += 1;
        }
        Self {
            trials,
            tasks_per_trial,
            amount,
            corrupted_trials,
            corruption_rate: corruption_rate(corrupted_trials, trials),
            lost_update_histogram,
        }
    }

    pub fn clean_trials(&self) -> usize {
        self.trials - self.corrupted_trials.min(self.trials)
    }
}

/// `corrupted / trials` as a percentage, zero when nothing ran
pub fn corruption_rate(corrupted: usize, trials: usize) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    corrupted as f64 / trials as f64 * 100.0
}

/// Step-by-step record of two overlapping deposits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    pub account: AccountSnapshot,
    pub amount: Decimal,
    pub events: Vec<TraceEvent>,
    /// Completion records in completion order
    pub completions: Vec<DepositRecord>,
    pub expected: Decimal,
    pub actual: Decimal,
    pub lost_update: bool,
}

impl TraceReport {
    pub fn narrative(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.events.iter().map(TraceEvent::describe).collect();
        for record in &self.completions {
            lines.push(format!(
                "{} finished depositing {} at {}",
                record.caller,
                record.amount,
                record.completed_at.format("%H:%M:%S%.6f")
            ));
        }
        if self.lost_update {
            let writes: Vec<&TraceEvent> = self
                .events
                .iter()
                .filter(|e| e.step == StepKind::Write)
                .collect();
            match writes.as_slice() {
                [.., lost, kept] => lines.push(format!(
                    "expected balance {} but found {}: {} overwrote the {} written by {}",
                    self.expected, self.actual, kept.caller, lost.value, lost.caller
                )),
                _ => lines.push(format!(
                    "expected balance {} but found {}",
                    self.expected, self.actual
                )),
            }
        } else {
            lines.push(format!(
                "balance {} matches the expectation: the deposits did not overlap",
                self.actual
            ));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::CallerId;

    fn snapshot(balance: i64, count: u64) -> AccountSnapshot {
        AccountSnapshot {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            balance: Decimal::from(balance),
            transaction_count: count,
        }
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn event(caller: u32, step: StepKind, value: i64, elapsed_us: u64) -> TraceEvent {
        TraceEvent {
            caller: CallerId(caller),
            account: "traced".to_string(),
            step,
            value: dec(value),
            at: Utc::now(),
            elapsed_us,
        }
    }

    #[test]
    fn test_epsilon_is_one_cent() {
        assert_eq!(epsilon().to_string(), "0.01");
    }

    #[test]
    fn test_deposit_report_counts_lost_updates() {
        let report = DepositReport::new(snapshot(3, 10), 10, Decimal::ONE, Decimal::ZERO).unwrap();
        assert_eq!(report.expected, dec(10));
        assert_eq!(report.money_lost, dec(7));
        assert_eq!(report.lost_updates, 7);
        assert!(report.is_corrupted());

        let clean = DepositReport::new(snapshot(10, 10), 10, Decimal::ONE, Decimal::ZERO).unwrap();
        assert!(!clean.is_corrupted());
        assert_eq!(clean.lost_updates, 0);
    }

    #[test]
    fn test_expected_totals_reject_overflow() {
        let err = DepositReport::expected(2, Decimal::MAX, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));

        let err = DepositReport::expected(1, Decimal::ONE, Decimal::MAX).unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));

        let err = WithdrawalReport::check_range(3, Decimal::MAX, dec(1000)).unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
        assert!(WithdrawalReport::check_range(20, dec(100), dec(1000)).is_ok());
    }

    #[test]
    fn test_withdrawal_report_expected_and_overpaid() {
        // 15 of 20 withdrawals of 100 succeeded against 1000
        let report =
            WithdrawalReport::new(snapshot(900, 15), 20, dec(100), dec(1000), 15).unwrap();
        assert_eq!(report.expected, dec(-500));
        assert_eq!(report.paid_out, dec(1500));
        assert_eq!(report.overpaid, dec(500));
        assert_eq!(report.failed_withdrawals, 5);
        assert_eq!(report.discrepancy(), dec(1400));
        assert!(!report.overdrawn);
        assert!(report.is_corrupted());
    }

    #[test]
    fn test_withdrawal_report_flags_negative_balance() {
        let report =
            WithdrawalReport::new(snapshot(-100, 11), 20, dec(100), dec(1000), 11).unwrap();
        assert!(report.overdrawn);
    }

    #[test]
    fn test_withdrawal_report_clean_run() {
        let report = WithdrawalReport::new(snapshot(0, 10), 20, dec(100), dec(1000), 10).unwrap();
        assert_eq!(report.expected, Decimal::ZERO);
        assert_eq!(report.overpaid, Decimal::ZERO);
        assert!(!report.is_corrupted());
    }

    #[test]
    fn test_mixed_report_applies_tolerance() {
        let deposits = vec![dec(50); 4];
        let within = AccountSnapshot {
            balance: Decimal::new(115_001, 2),
            ..snapshot(0, 6)
        };
        // 1000 + 200 - 2 * 25 = 1150
        let report = MixedReport::new(within, dec(1000), &deposits, dec(25), 3, 2).unwrap();
        assert_eq!(report.expected, dec(1150));
        assert!(!report.corrupted);

        let report =
            MixedReport::new(snapshot(1100, 6), dec(1000), &deposits, dec(25), 3, 2).unwrap();
        assert_eq!(report.discrepancy, dec(-50));
        assert!(report.corrupted);
    }

    #[test]
    fn test_transfer_report_reports_sign() {
        let created =
            TransferReport::new(snapshot(1030, 3), snapshot(1000, 3), 2, dec(10), (2, 2), dec(2000))
                .unwrap();
        assert_eq!(created.delta, dec(30));
        assert_eq!(created.drift, Drift::Created);

        let destroyed =
            TransferReport::new(snapshot(990, 3), snapshot(990, 3), 2, dec(10), (2, 2), dec(2000))
                .unwrap();
        assert_eq!(destroyed.delta, dec(-20));
        assert_eq!(destroyed.drift, Drift::Destroyed);

        let conserved =
            TransferReport::new(snapshot(1010, 3), snapshot(990, 3), 2, dec(10), (2, 1), dec(2000))
                .unwrap();
        assert_eq!(conserved.drift, Drift::Conserved);
        assert!(!conserved.is_corrupted());
    }

    #[test]
    fn test_frequency_report_rate_and_histogram() {
        let outcomes = vec![
            TrialOutcome { corrupted: true, lost_updates: 9 },
            TrialOutcome { corrupted: true, lost_updates: 9 },
            TrialOutcome { corrupted: false, lost_updates: 0 },
            TrialOutcome { corrupted: true, lost_updates: 8 },
        ];
        let report = FrequencyReport::new(10, Decimal::ONE, 3, &outcomes);
        assert_eq!(report.trials, 4);
        assert_eq!(report.clean_trials(), 1);
        assert!((report.corruption_rate - 75.0).abs() < f64::EPSILON);
        assert_eq!(report.lost_update_histogram.get(&9), Some(&2));
        assert_eq!(report.lost_update_histogram.get(&0), Some(&1));
    }

    #[test]
    fn test_corruption_rate_with_no_trials() {
        assert_eq!(corruption_rate(0, 0), 0.0);
        assert_eq!(corruption_rate(1, 4), 25.0);
    }

    #[test]
    fn test_narrative_names_the_overwritten_caller() {
        let report = TraceReport {
            account: snapshot(100, 2),
            amount: dec(100),
            events: vec![
                event(1, StepKind::Read, 0, 0),
                event(2, StepKind::Read, 0, 10),
                event(1, StepKind::Write, 100, 20),
                event(2, StepKind::Write, 100, 30),
            ],
            completions: Vec::new(),
            expected: dec(200),
            actual: dec(100),
            lost_update: true,
        };

        let narrative = report.narrative();
        assert_eq!(narrative.len(), 5);
        assert_eq!(
            narrative.last().unwrap(),
            "expected balance 200 but found 100: caller 2 overwrote the 100 written by caller 1"
        );
    }
}
