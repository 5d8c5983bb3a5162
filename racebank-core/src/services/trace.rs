//! Trace service - a step-by-step account of one lost update

use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;

use super::runner::run_concurrently;
use crate::domain::report::checked_product;
use crate::domain::result::Result;
use crate::domain::{
    Account, CallerId, DepositRecord, LatencyProfile, StepKind, TraceEvent, TraceReport,
};
use crate::ports::StepObserver;

/// Append-only record of steps and completions
///
/// The mutexes guard the recorder's own lists only; the observed account is
/// never touched under them.
pub struct TraceRecorder {
    started: Instant,
    events: Mutex<Vec<TraceEvent>>,
    completions: Mutex<Vec<DepositRecord>>,
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            events: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    /// Recorded steps ordered by time
    pub fn events(&self) -> Vec<TraceEvent> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        events.sort_by_key(|e| e.elapsed_us);
        events
    }

    /// Completion records in the order operations finished
    pub fn completions(&self) -> Vec<DepositRecord> {
        self.completions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StepObserver for TraceRecorder {
    fn on_step(&self, caller: CallerId, account: &str, step: StepKind, value: Decimal) {
        let event = TraceEvent {
            caller,
            account: account.to_string(),
            step,
            value,
            at: Utc::now(),
            elapsed_us: self.started.elapsed().as_micros() as u64,
        };
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    fn on_complete(&self, caller: CallerId, amount: Decimal) {
        let record = DepositRecord {
            caller,
            amount,
            completed_at: Utc::now(),
        };
        self.completions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

/// Two-caller detailed trace scenario
pub struct TraceService {
    latency: LatencyProfile,
}

impl TraceService {
    pub fn new(latency: LatencyProfile) -> Self {
        Self { latency }
    }

    /// Run exactly two concurrent deposits of `amount` on a fresh account
    pub async fn run(&self, amount: Decimal) -> Result<TraceReport> {
        let expected = checked_product(amount, 2)?;
        let account = Rc::new(Account::new("traced").with_latency(self.latency));
        let recorder = Arc::new(TraceRecorder::new());
        tracing::debug!(%amount, "starting traced deposits");

        let ops: Vec<_> = [CallerId(1), CallerId(2)]
            .into_iter()
            .map(|caller| {
                let account = Rc::clone(&account);
                let recorder = Arc::clone(&recorder);
                async move {
                    account
                        .deposit_observed(caller, amount, recorder.as_ref())
                        .await
                }
            })
            .collect();
        run_concurrently(ops).await?;

        let actual = account.balance();
        Ok(TraceReport {
            account: account.snapshot(),
            amount,
            events: recorder.events(),
            completions: recorder.completions(),
            expected,
            actual,
            lost_update: actual != expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_sorts_events() {
        let recorder = TraceRecorder::new();
        recorder.on_step(CallerId(1), "a", StepKind::Read, Decimal::ZERO);
        recorder.on_step(CallerId(2), "a", StepKind::Read, Decimal::ZERO);
        recorder.on_complete(CallerId(2), Decimal::ONE);

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].elapsed_us <= events[1].elapsed_us);
        assert_eq!(recorder.completions().len(), 1);
        assert_eq!(recorder.completions()[0].caller, CallerId(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_deposits_show_a_lost_update() {
        let service = TraceService::new(LatencyProfile::from_millis(20, 10, 0));
        let report = service.run(Decimal::from(100)).await.unwrap();

        // read, compute, write, increment for each caller
        assert_eq!(report.events.len(), 8);
        assert_eq!(report.completions.len(), 2);
        assert_eq!(report.expected, Decimal::from(200));
        assert_eq!(report.actual, Decimal::from(100));
        assert!(report.lost_update);
        assert_eq!(report.account.transaction_count, 2);

        let reads: Vec<_> = report
            .events
            .iter()
            .filter(|e| e.step == StepKind::Read)
            .collect();
        assert!(reads.iter().all(|e| e.value == Decimal::ZERO));

        let narrative = report.narrative();
        let writes: Vec<_> = report
            .events
            .iter()
            .filter(|e| e.step == StepKind::Write)
            .collect();
        assert_eq!(writes.len(), 2);
        assert_ne!(writes[0].caller, writes[1].caller);
        let verdict = narrative.last().unwrap();
        assert!(verdict.contains(&format!("{} overwrote", writes[1].caller)));
        assert!(verdict.contains(&format!("written by {}", writes[0].caller)));
    }
}
