//! MatchJudge - Command-line entry point
//!
//! Runs one full sweep. The console report goes to stdout, logs to stderr.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use matchjudge::{
    benchmark::{Harness, ProcessRunner},
    config::Config,
    models::SolverRoster,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    let json = config.log.json;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.rust_log)),
        )
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    tracing::info!(
        work_dir = %config.storage.work_dir.display(),
        baseline = %config.harness.baseline,
        "Starting MatchJudge"
    );

    let roster = SolverRoster::from_config(&config.harness, &config.storage)?;
    let harness = Harness::new(config, Arc::new(ProcessRunner::new()), roster)?;

    // Dropping the sweep on Ctrl+C kills the running child (kill_on_drop)
    tokio::select! {
        summary = harness.run(std::io::stdout()) => {
            let summary = summary?;
            tracing::info!(attempts = summary.attempts.len(), "Sweep finished");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::warn!("Interrupted, stopping sweep");
            anyhow::bail!("interrupted");
        }
    }

    Ok(())
}
