//! relmirror: mirror origin releases into a mirror repository.
//!
//! # Usage
//!
//! ```text
//! relmirror
//! ```
//!
//! Runs one reconciliation pass. All settings come from the environment
//! (`GITHUB_USER`, `GITHUB_REPO`, `GITEE_USER`, `GITEE_REPO`,
//! `GITEE_RELEASE_REPO`, `GITEE_ACCESS_TOKEN`, plus optional tuning
//! variables); log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use relmirror_core::MirrorConfig;
use relmirror_sync::{pipeline, RunSummary};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "relmirror",
    version,
    about = "Mirror origin releases and their assets into a mirror repository",
    long_about = None,
)]
struct Cli {}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let _cli = Cli::parse();
    init_tracing();

    let config = MirrorConfig::from_env().context("invalid configuration")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let summary = runtime
        .block_on(pipeline::run(&config))
        .inspect_err(|err| error!(error = %err, "pass aborted"))
        .context("mirror pass failed")?;

    print_summary(&summary);
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_summary(summary: &RunSummary) {
    println!("{}", summary_line(summary));
}

fn summary_line(summary: &RunSummary) -> String {
    let publish = &summary.publish;
    let latest = match &publish.latest {
        Some(tally) => format!(
            "{} created, {} updated, {} failed",
            tally.created, tally.updated, tally.failed
        ),
        None => "unchanged".to_string(),
    };
    format!(
        "✓ {} missing, {} staged, {} failed; history: {} releases ({} created, {} updated, {} failed); latest: {latest}",
        summary.missing.len(),
        summary.fetched.len(),
        summary.failed.len(),
        publish.history.releases.len(),
        publish.history.tally.created,
        publish.history.tally.updated,
        publish.history.tally.failed,
    )
}
