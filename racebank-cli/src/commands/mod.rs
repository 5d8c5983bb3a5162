//! CLI command implementations

pub mod all;
pub mod config;
pub mod deposit;
pub mod frequency;
pub mod mixed;
pub mod trace;
pub mod transfer;
pub mod withdraw;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use racebank_core::RacebankContext;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output for
/// the racebank crates and everything else stays at warn.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,racebank_core=debug,racebank_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Get the racebank directory from environment or default
pub fn get_racebank_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("RACEBANK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".racebank"))
        .context("Could not find home directory (set RACEBANK_DIR)")
}

/// Build the scenario context from the racebank directory
pub fn get_context() -> Result<RacebankContext> {
    let racebank_dir = get_racebank_dir()?;
    tracing::debug!(dir = %racebank_dir.display(), "loading settings");
    RacebankContext::new(&racebank_dir)
        .with_context(|| format!("Failed to load settings from {:?}", racebank_dir))
}

/// Drive a scenario future to completion on a current-thread runtime
///
/// Scenario tasks share `Rc` accounts and run on the calling thread.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(fut))
}
