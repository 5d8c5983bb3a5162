//! Racebank Core - a bank account that races on purpose
//!
//! The account in this crate performs every operation as an unsynchronized
//! read, pause, compute, pause, write sequence so concurrent callers overwrite
//! each other. The services drive many concurrent operations against it and
//! report how far the final state drifted from the arithmetic expectation.
//!
//! - **domain**: the racy `Account`, latency profile, trace records and reports
//! - **ports**: the step observer seam used for detailed traces
//! - **services**: one harness service per scenario plus the concurrent runner
//! - **config**: settings file and environment overrides

pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;

use anyhow::Result;

use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Account, AccountSnapshot, DepositReport, Drift, FrequencyReport, LatencyProfile,
    MixedReport, TraceReport, TransferReport, WithdrawalReport,
};

/// Main context for racebank scenarios
///
/// Holds the configuration and one service per scenario, all sharing the
/// configured latency profile.
pub struct RacebankContext {
    pub config: Config,
    pub deposit_service: DepositService,
    pub withdrawal_service: WithdrawalService,
    pub mixed_service: MixedService,
    pub transfer_service: TransferService,
    pub frequency_service: FrequencyService,
    pub trace_service: TraceService,
}

impl RacebankContext {
    /// Create a context from the settings in `racebank_dir`
    pub fn new(racebank_dir: &Path) -> Result<Self> {
        let config = Config::load(racebank_dir)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        let latency = config.latency_profile();
        tracing::debug!(?latency, "building racebank context");

        Self {
            deposit_service: DepositService::new(latency),
            withdrawal_service: WithdrawalService::new(latency),
            mixed_service: MixedService::new(latency),
            transfer_service: TransferService::new(latency),
            frequency_service: FrequencyService::new(latency),
            trace_service: TraceService::new(latency),
            config,
        }
    }
}
