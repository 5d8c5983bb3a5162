//! Core domain entities
//!
//! The racy account plus the plain data the harness produces about it.

mod account;
pub mod latency;
pub mod report;
pub mod result;
mod trace;

pub use account::{Account, AccountSnapshot};
pub use latency::LatencyProfile;
pub use report::{
    DepositReport, Drift, FrequencyReport, MixedReport, TraceReport, TransferReport,
    TrialOutcome, WithdrawalReport,
};
pub use trace::{CallerId, DepositRecord, StepKind, TraceEvent};
