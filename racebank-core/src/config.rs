//! Configuration management
//!
//! Settings live in `settings.json` inside the racebank directory:
//! ```json
//! {
//!   "latency": { "readDelayMs": 10, "writeDelayMs": 5, "jitterMs": 2 },
//!   "deposits": { "tasks": 10, "amount": "1" },
//!   "frequency": { "trials": 20, "tasks": 10, "amount": "1" }
//! }
//! ```
//! Every section and field is optional; missing ones take their defaults.

use std::path::Path;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::LatencyProfile;
use crate::services::MixedPlan;

pub const SETTINGS_FILE: &str = "settings.json";

/// Racebank configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub latency: LatencySettings,
    pub deposits: DepositSettings,
    pub withdrawals: WithdrawalSettings,
    pub mixed: MixedSettings,
    pub transfers: TransferSettings,
    pub frequency: FrequencySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatencySettings {
    pub read_delay_ms: u64,
    pub write_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for LatencySettings {
    fn default() -> Self {
        Self {
            read_delay_ms: 10,
            write_delay_ms: 5,
            jitter_ms: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepositSettings {
    pub initial: Decimal,
    pub tasks: usize,
    pub amount: Decimal,
}

impl Default for DepositSettings {
    fn default() -> Self {
        Self {
            initial: Decimal::ZERO,
            tasks: 10,
            amount: Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WithdrawalSettings {
    pub initial: Decimal,
    pub tasks: usize,
    pub amount: Decimal,
}

impl Default for WithdrawalSettings {
    fn default() -> Self {
        Self {
            initial: Decimal::from(1000),
            tasks: 20,
            amount: Decimal::from(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixedSettings {
    pub initial: Decimal,
    pub deposits: usize,
    pub deposit_amount: Decimal,
    pub withdrawals: usize,
    pub withdrawal_amount: Decimal,
}

impl Default for MixedSettings {
    fn default() -> Self {
        Self {
            initial: Decimal::from(1000),
            deposits: 20,
            deposit_amount: Decimal::from(50),
            withdrawals: 20,
            withdrawal_amount: Decimal::from(75),
        }
    }
}

impl MixedSettings {
    pub fn plan(&self) -> MixedPlan {
        MixedPlan {
            initial: self.initial,
            deposits: self.deposits,
            deposit_amount: self.deposit_amount,
            withdrawals: self.withdrawals,
            withdrawal_amount: self.withdrawal_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferSettings {
    pub initial: Decimal,
    pub per_direction: usize,
    pub amount: Decimal,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            initial: Decimal::from(1000),
            per_direction: 50,
            amount: Decimal::from(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrequencySettings {
    pub trials: usize,
    pub tasks: usize,
    pub amount: Decimal,
}

impl Default for FrequencySettings {
    fn default() -> Self {
        Self {
            trials: 20,
            tasks: 10,
            amount: Decimal::ONE,
        }
    }
}

impl Config {
    /// Load config from the racebank directory
    ///
    /// Latency can be overridden via environment variables
    /// `RACEBANK_READ_DELAY_MS`, `RACEBANK_WRITE_DELAY_MS` and
    /// `RACEBANK_JITTER_MS` (for CI, where slower machines want wider windows).
    pub fn load(racebank_dir: &Path) -> Result<Self> {
        Self::load_with_env(racebank_dir, |key| std::env::var(key).ok())
    }

    /// Load config, reading overrides through `env`
    pub fn load_with_env(
        racebank_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let settings_path = racebank_dir.join(SETTINGS_FILE);

        let mut config: Config = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %settings_path.display(),
                    error = %e,
                    "ignoring unreadable settings"
                );
                Config::default()
            })
        } else {
            Config::default()
        };

        if let Some(ms) = parse_millis(&env, "RACEBANK_READ_DELAY_MS") {
            config.latency.read_delay_ms = ms;
        }
        if let Some(ms) = parse_millis(&env, "RACEBANK_WRITE_DELAY_MS") {
            config.latency.write_delay_ms = ms;
        }
        if let Some(ms) = parse_millis(&env, "RACEBANK_JITTER_MS") {
            config.latency.jitter_ms = ms;
        }

        Ok(config)
    }

    /// Save config to the racebank directory
    pub fn save(&self, racebank_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(racebank_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(racebank_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    pub fn latency_profile(&self) -> LatencyProfile {
        LatencyProfile::from_millis(
            self.latency.read_delay_ms,
            self.latency.write_delay_ms,
            self.latency.jitter_ms,
        )
    }
}

fn parse_millis(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric override");
            None
        }
    }
}
