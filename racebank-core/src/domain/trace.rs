//! Step and invocation records for interleaving analysis

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one concurrent caller within a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallerId(pub u32);

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caller {}", self.0)
    }
}

/// One step of an account operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Balance copied into a local value
    Read,
    /// Balance compared against the requested amount
    Check,
    /// New value computed from the local copy
    Compute,
    /// Computed value stored back into the balance
    Write,
    /// Transaction count incremented
    Increment,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Read => "read",
            StepKind::Check => "check",
            StepKind::Compute => "compute",
            StepKind::Write => "write",
            StepKind::Increment => "increment",
        }
    }
}

/// A recorded step with its timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub caller: CallerId,
    pub account: String,
    pub step: StepKind,
    /// Balance read, computed or written; new count for increments
    pub value: Decimal,
    pub at: DateTime<Utc>,
    /// Microseconds since the recorder was created
    pub elapsed_us: u64,
}

impl TraceEvent {
    /// Human-followable description of this step
    pub fn describe(&self) -> String {
        let action = match self.step {
            StepKind::Read => format!("reads balance {}", self.value),
            StepKind::Check => format!("checks balance {}", self.value),
            StepKind::Compute => format!("computes new balance {}", self.value),
            StepKind::Write => format!("writes balance {}", self.value),
            StepKind::Increment => format!("bumps transaction count to {}", self.value),
        };
        format!(
            "[{:>8.3} ms] {} {} on {}",
            self.elapsed_us as f64 / 1000.0,
            self.caller,
            action,
            self.account
        )
    }
}

/// Completion record of one concurrent deposit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRecord {
    pub caller: CallerId,
    pub amount: Decimal,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_mentions_caller_and_value() {
        let event = TraceEvent {
            caller: CallerId(2),
            account: "shared".to_string(),
            step: StepKind::Write,
            value: Decimal::new(10000, 2),
            at: Utc::now(),
            elapsed_us: 15_250,
        };
        let line = event.describe();
        assert!(line.contains("caller 2"));
        assert!(line.contains("writes balance 100.00"));
        assert!(line.contains("15.250 ms"));
        assert!(line.ends_with("on shared"));
    }

    #[test]
    fn test_step_kind_serializes_lowercase() {
        let json = serde_json::to_string(&StepKind::Increment).unwrap();
        assert_eq!(json, "\"increment\"");
        assert_eq!(StepKind::Check.as_str(), "check");
    }
}
