//! Show command - index statistics.

use super::Context;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use console::style;
use tracedate_core::INDEX_SCHEMA_VERSION;

/// Print index statistics and the stored references.
pub fn run(ctx: &Context) -> Result<()> {
    let index = ctx.open_index()?;
    let stats = index.stats().context("Failed to read index statistics")?;
    let meta = index.meta().context("Failed to load metadata")?;

    println!("Index path: {}", index.path().display());
    println!("Schema version: {}", INDEX_SCHEMA_VERSION);
    println!("Commits: {}", style(stats.commits).cyan());
    println!("Line keys: {}", style(stats.line_keys).cyan());
    println!("References: {}", style(stats.refs).cyan());

    for (name, id) in &meta.refs {
        let when = meta
            .committer_time(id)
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "not indexed".to_string());
        println!("  {} {} {}", style(id.short()).yellow(), name, style(when).dim());
    }

    Ok(())
}
