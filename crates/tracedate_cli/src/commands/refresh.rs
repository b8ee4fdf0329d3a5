//! Refresh command implementation.

use super::Context;
use anyhow::{Context as _, Result};
use std::path::Path;
use std::time::Instant;
use tracedate_core::{refresh, GitCli};

/// Re-read metadata and references of everything already indexed.
pub fn run(ctx: &Context, repo: &Path) -> Result<()> {
    let start = Instant::now();
    let mut index = ctx.open_index()?;
    let git = GitCli::new(repo);

    println!("Refreshing metadata...");

    let report = refresh(&mut index, &git).context("Failed to refresh metadata")?;

    println!(
        "Refreshed {} commits and {} references in {:.2}s",
        report.commits_refreshed,
        report.refs,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
