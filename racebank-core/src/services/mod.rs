//! Service layer - the concurrency harness
//!
//! Each service drives one scenario: it builds fresh accounts, spawns the
//! concurrent operations through the runner, waits for all of them and turns
//! the final state into a report.

mod deposit;
mod frequency;
mod mixed;
pub mod runner;
mod trace;
mod transfer;
mod withdrawal;

pub use deposit::DepositService;
pub use frequency::FrequencyService;
pub use mixed::{MixedPlan, MixedService};
pub use runner::{operation, run_concurrently, Operation};
pub use trace::{TraceRecorder, TraceService};
pub use transfer::TransferService;
pub use withdrawal::WithdrawalService;
