//! Account domain model
//!
//! `Account` is deliberately unsafe under concurrency. Every operation copies
//! the balance into a local, suspends, computes, suspends again and only then
//! writes back, so concurrent callers overwrite each other's results.
//!
//! Balance and count are plain [`Cell`]s: no lock, version check or atomic
//! primitive exists anywhere in this type. An account is shared between tasks
//! with `Rc<Account>` on a single-threaded `LocalSet`, so callers interleave
//! exactly at the pauses between a read and its write.

use std::cell::Cell;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::latency::{pause, LatencyProfile};
use super::result::{Error, Result};
use super::trace::{CallerId, StepKind};
use crate::ports::{NoopObserver, StepObserver};

/// Caller id used by the unobserved operations
const ANONYMOUS: CallerId = CallerId(0);

/// A bank account whose operations race by construction
///
/// Share it between local tasks with `Rc<Account>`. `reset` must only be
/// called while no other operation is in flight; this is documented, not
/// enforced.
#[derive(Debug)]
pub struct Account {
    id: Uuid,
    name: String,
    latency: LatencyProfile,
    balance: Cell<Decimal>,
    transaction_count: Cell<u64>,
}

impl Account {
    /// Create an account with a zero balance
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_balance(name, Decimal::ZERO)
    }

    /// Create an account with an initial balance
    pub fn with_balance(name: impl Into<String>, initial: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            latency: LatencyProfile::default(),
            balance: Cell::new(initial),
            transaction_count: Cell::new(0),
        }
    }

    /// Replace the simulated processing latency
    pub fn with_latency(mut self, latency: LatencyProfile) -> Self {
        self.latency = latency;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latency(&self) -> LatencyProfile {
        self.latency
    }

    /// Current balance (racy snapshot read)
    pub fn balance(&self) -> Decimal {
        self.balance.get()
    }

    /// Number of completed operations (racy snapshot read)
    pub fn transaction_count(&self) -> u64 {
        self.transaction_count.get()
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            name: self.name.clone(),
            balance: self.balance(),
            transaction_count: self.transaction_count(),
        }
    }

    /// Add `amount` to the balance
    pub async fn deposit(&self, amount: Decimal) -> Result<()> {
        self.deposit_observed(ANONYMOUS, amount, &NoopObserver).await
    }

    /// Deposit, reporting every step to `observer`
    pub async fn deposit_observed(
        &self,
        caller: CallerId,
        amount: Decimal,
        observer: &dyn StepObserver,
    ) -> Result<()> {
        validate_amount(amount)?;

        let current = self.balance.get();
        self.step(observer, caller, StepKind::Read, current);
        pause(self.latency.read_pause()).await;

        let updated = current
            .checked_add(amount)
            .ok_or_else(|| Error::overflow(format!("{} + {}", current, amount)))?;
        self.step(observer, caller, StepKind::Compute, updated);
        pause(self.latency.write_pause()).await;

        self.balance.set(updated);
        self.step(observer, caller, StepKind::Write, updated);
        self.increment(observer, caller);

        observer.on_complete(caller, amount);
        Ok(())
    }

    /// Take `amount` out of the balance
    ///
    /// Returns `Ok(false)` without touching state when the balance read at the
    /// start is too low. The check and the later write are separated by a
    /// pause, so concurrent withdrawals can all pass against the same balance.
    pub async fn withdraw(&self, amount: Decimal) -> Result<bool> {
        self.withdraw_observed(ANONYMOUS, amount, &NoopObserver).await
    }

    /// Withdraw, reporting every step to `observer`
    pub async fn withdraw_observed(
        &self,
        caller: CallerId,
        amount: Decimal,
        observer: &dyn StepObserver,
    ) -> Result<bool> {
        validate_amount(amount)?;

        let current = self.balance.get();
        self.step(observer, caller, StepKind::Read, current);
        pause(self.latency.read_pause()).await;

        self.step(observer, caller, StepKind::Check, current);
        if current < amount {
            return Ok(false);
        }

        let updated = current - amount;
        self.step(observer, caller, StepKind::Compute, updated);
        pause(self.latency.write_pause()).await;

        self.balance.set(updated);
        self.step(observer, caller, StepKind::Write, updated);
        self.increment(observer, caller);

        observer.on_complete(caller, amount);
        Ok(true)
    }

    /// Move `amount` from this account to `target`
    ///
    /// Fails with `NullTarget` when `target` is `None`. The debit and the
    /// credit are two separately delayed writes, each computed from a value
    /// read before its pause, so opposing transfers between the same pair of
    /// accounts can create or destroy money. A credit that would overflow the
    /// target fails after the debit has already been written.
    pub async fn transfer(&self, target: Option<&Account>, amount: Decimal) -> Result<bool> {
        self.transfer_observed(ANONYMOUS, target, amount, &NoopObserver)
            .await
    }

    /// Transfer, reporting every step on both accounts to `observer`
    pub async fn transfer_observed(
        &self,
        caller: CallerId,
        target: Option<&Account>,
        amount: Decimal,
        observer: &dyn StepObserver,
    ) -> Result<bool> {
        validate_amount(amount)?;
        let target = target.ok_or(Error::NullTarget)?;

        let source_balance = self.balance.get();
        self.step(observer, caller, StepKind::Check, source_balance);
        if source_balance < amount {
            return Ok(false);
        }

        pause(self.latency.read_pause()).await;
        let debited = source_balance - amount;
        self.balance.set(debited);
        self.step(observer, caller, StepKind::Write, debited);
        self.increment(observer, caller);

        let target_balance = target.balance.get();
        target.step(observer, caller, StepKind::Read, target_balance);
        pause(self.latency.write_pause()).await;
        let credited = target_balance
            .checked_add(amount)
            .ok_or_else(|| Error::overflow(format!("{} + {}", target_balance, amount)))?;
        target.balance.set(credited);
        target.step(observer, caller, StepKind::Write, credited);
        target.increment(observer, caller);

        observer.on_complete(caller, amount);
        Ok(true)
    }

    /// Set the balance and clear the transaction count
    ///
    /// Only valid while no operation is in flight.
    pub fn reset(&self, new_balance: Decimal) {
        self.balance.set(new_balance);
        self.transaction_count.set(0);
    }

    fn increment(&self, observer: &dyn StepObserver, caller: CallerId) {
        let count = self.transaction_count.get() + 1;
        self.transaction_count.set(count);
        self.step(observer, caller, StepKind::Increment, Decimal::from(count));
    }

    fn step(
        &self,
        observer: &dyn StepObserver,
        caller: CallerId,
        step: StepKind,
        value: Decimal,
    ) {
        tracing::trace!(
            account = %self.name,
            caller = caller.0,
            step = step.as_str(),
            %value,
            "account step"
        );
        observer.on_step(caller, &self.name, step, value);
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_argument(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

/// Point-in-time view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub transaction_count: u64,
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn quiet(initial: i64) -> Account {
        Account::with_balance("test", Decimal::from(initial))
            .with_latency(LatencyProfile::none())
    }

    #[tokio::test]
    async fn test_sequential_operations() {
        let account = quiet(1000);
        account.deposit(Decimal::from(500)).await.unwrap();
        assert!(account.withdraw(Decimal::from(200)).await.unwrap());
        account.deposit(Decimal::from(100)).await.unwrap();

        assert_eq!(account.balance(), Decimal::from(1400));
        assert_eq!(account.transaction_count(), 3);
    }

    #[tokio::test]
    async fn test_invalid_amounts_leave_state_unchanged() {
        let account = quiet(50);

        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            let err = account.deposit(amount).await.unwrap_err();
            assert!(err.is_invalid_argument());
        }
        let err = account.withdraw(Decimal::ZERO).await.unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(account.balance(), Decimal::from(50));
        assert_eq!(account.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_is_not_an_error() {
        let account = quiet(10);
        assert!(!account.withdraw(Decimal::from(11)).await.unwrap());
        assert_eq!(account.balance(), Decimal::from(10));
        assert_eq!(account.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_transfer_moves_money_and_counts_both_sides() {
        let source = quiet(100);
        let target = quiet(0);

        assert!(source.transfer(Some(&target), Decimal::from(40)).await.unwrap());
        assert_eq!(source.balance(), Decimal::from(60));
        assert_eq!(target.balance(), Decimal::from(40));
        assert_eq!(source.transaction_count(), 1);
        assert_eq!(target.transaction_count(), 1);

        assert!(!source.transfer(Some(&target), Decimal::from(61)).await.unwrap());
        assert_eq!(source.balance(), Decimal::from(60));
    }

    #[tokio::test]
    async fn test_transfer_validation() {
        let source = quiet(100);
        let target = quiet(0);

        let err = source.transfer(None, Decimal::from(10)).await.unwrap_err();
        assert!(matches!(err, Error::NullTarget));

        let err = source.transfer(Some(&target), Decimal::from(-1)).await.unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(source.balance(), Decimal::from(100));
        assert_eq!(source.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let account = quiet(0);
        account.deposit(Decimal::from(25)).await.unwrap();
        account.reset(Decimal::ZERO);
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.transaction_count(), 0);

        account.reset(Decimal::new(12345, 2));
        assert_eq!(account.balance(), Decimal::new(12345, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_overlapping_deposits_lose_one_update() {
        let latency = LatencyProfile::from_millis(10, 5, 0);
        let account = Rc::new(Account::new("shared").with_latency(latency));

        let a = Rc::clone(&account);
        let b = Rc::clone(&account);
        let (ra, rb) = tokio::join!(a.deposit(Decimal::ONE), b.deposit(Decimal::ONE));
        ra.unwrap();
        rb.unwrap();

        // Both read zero before either wrote
        assert_eq!(account.balance(), Decimal::ONE);
        assert_eq!(account.transaction_count(), 2);
    }

    #[tokio::test]
    async fn test_deposit_overflow_is_an_error() {
        let account = Account::with_balance("full", Decimal::MAX)
            .with_latency(LatencyProfile::none());

        let err = account.deposit(Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
        assert_eq!(account.balance(), Decimal::MAX);
        assert_eq!(account.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_transfer_credit_overflow_is_an_error() {
        let source = quiet(10);
        let target = Account::with_balance("full", Decimal::MAX)
            .with_latency(LatencyProfile::none());

        let err = source.transfer(Some(&target), Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
        assert_eq!(target.balance(), Decimal::MAX);
        assert_eq!(target.transaction_count(), 0);
    }

    #[test]
    fn test_snapshot() {
        let account = Account::with_balance("savings", Decimal::from(7));
        let snapshot = account.snapshot();
        assert_eq!(snapshot.id, account.id());
        assert_eq!(snapshot.name, "savings");
        assert_eq!(snapshot.balance, Decimal::from(7));
        assert_eq!(snapshot.transaction_count, 0);
    }
}
