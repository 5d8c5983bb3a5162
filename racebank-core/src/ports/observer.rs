//! Step observer port

use rust_decimal::Decimal;

use crate::domain::{CallerId, StepKind};

/// Receives every step of an observed account operation
///
/// Implementations are harness bookkeeping. They may synchronize internally
/// but must never be used to guard account state.
pub trait StepObserver: Send + Sync {
    /// Called right after `step` happened on `account`
    fn on_step(&self, caller: CallerId, account: &str, step: StepKind, value: Decimal);

    /// Called once an operation has fully completed
    fn on_complete(&self, _caller: CallerId, _amount: Decimal) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&self, _caller: CallerId, _account: &str, _step: StepKind, _value: Decimal) {}
}
