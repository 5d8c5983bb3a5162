//! Frequency service - how often does a concurrent deposit trial go wrong

use std::sync::atomic::{AtomicUsize, Ordering};
use std::rc::Rc;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::deposit::DepositService;
use super::runner::run_concurrently;
use crate::domain::result::Result;
use crate::domain::{Account, FrequencyReport, LatencyProfile, TrialOutcome};

/// Repeated-trial corruption rate scenario
pub struct FrequencyService {
    latency: LatencyProfile,
}

impl FrequencyService {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }

    /// Run `trials` independent trials of `tasks` concurrent deposits of `amount`
    ///
    /// Every trial gets a fresh zero-balance account. Trials themselves run
    /// concurrently; the corrupted-trial counter is the only state they share.
    pub async fn run(
        &self,
        trials: usize,
        tasks: usize,
        amount: Decimal,
    ) -> Result<FrequencyReport> {
        tracing::debug!(trials, tasks, %amount, "starting frequency run");
        let corrupted = Arc::new(AtomicUsize::new(0));
        let latency = self.latency;

        let ops: Vec<_> = (0..trials)
            .map(|trial| run_trial(trial, latency, tasks, amount, Arc::clone(&corrupted)))
            .collect();
        let outcomes = run_concurrently(ops).await?;

        let corrupted_trials = corrupted.load(Ordering::SeqCst);
        let report = FrequencyReport::new(tasks, amount, corrupted_trials, &outcomes);
        tracing::info!(
            trials = report.trials,
            corrupted = report.corrupted_trials,
            rate = report.corruption_rate,
            "frequency run finished"
        );
        Ok(report)
    }
}

async fn run_trial(
    trial: usize,
    latency: LatencyProfile,
    tasks: usize,
    amount: Decimal,
    corrupted: Arc<AtomicUsize>,
) -> Result<TrialOutcome> {
    let account = Rc::new(Account::new(format!("trial-{}", trial)).with_latency(latency));
    let report = DepositService::new(latency).run_on(account, tasks, amount).await?;
    if report.is_corrupted() {
        corrupted.fetch_add(1, Ordering::SeqCst);
    }
    Ok(TrialOutcome {
        corrupted: report.is_corrupted(),
        lost_updates: report.lost_updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_matches_outcomes() {
        let service = FrequencyService::new(LatencyProfile::none());
        let report = service.run(6, 4, Decimal::ONE).await.unwrap();

        assert_eq!(report.trials, 6);
        let histogram_total: usize = report.lost_update_histogram.values().sum();
        assert_eq!(histogram_total, 6);
        let clean = report.lost_update_histogram.get(&0).copied().unwrap_or(0);
        assert_eq!(report.corrupted_trials, 6 - clean);
        let expected_rate = report.corrupted_trials as f64 / 6.0 * 100.0;
        assert!((report.corruption_rate - expected_rate).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_zero_trials() {
        let service = FrequencyService::new(LatencyProfile::none());
        let report = service.run(0, 10, Decimal::ONE).await.unwrap();
        assert_eq!(report.trials, 0);
        assert_eq!(report.corrupted_trials, 0);
        assert_eq!(report.corruption_rate, 0.0);
    }
}
