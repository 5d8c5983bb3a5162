//! Simulated processing latency
//!
//! The pauses between reading and writing account state are the fault
//! injection that makes interleavings observable. They must stay much longer
//! than the compute step itself or lost updates become too rare to show.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pauses applied inside every account operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyProfile {
    /// Pause between reading the balance and computing the new value
    pub read_delay: Duration,
    /// Pause between computing the new value and writing it back
    pub write_delay: Duration,
    /// Upper bound of a uniform random extra pause added to each delay
    pub jitter: Duration,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            read_delay: Duration::from_millis(10),
            write_delay: Duration::from_millis(5),
            jitter: Duration::from_millis(2),
        }
    }
}

impl LatencyProfile {
    pub fn new(read_delay: Duration, write_delay: Duration, jitter: Duration) -> Self {
        Self {
            read_delay,
            write_delay,
            jitter,
        }
    }

    /// No pauses at all (sequential tests)
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// Build from millisecond values (config file representation)
    pub fn from_millis(read_ms: u64, write_ms: u64, jitter_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(read_ms),
            Duration::from_millis(write_ms),
            Duration::from_millis(jitter_ms),
        )
    }

    pub fn read_pause(&self) -> Duration {
        self.read_delay + self.sample_jitter()
    }

    pub fn write_pause(&self) -> Duration {
        self.write_delay + self.sample_jitter()
    }

    fn sample_jitter(&self) -> Duration {
        let max = self.jitter.as_micros() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::thread_rng().gen_range(0..=max))
    }
}

/// Suspend the current task for `pause`
///
/// Zero-length pauses still yield so other tasks get a chance to run.
pub(crate) async fn pause(pause: Duration) {
    if pause.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(pause).await;
    }
}
