//! Build command - index a reference's history.

use super::Context;
use anyhow::{Context as _, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tracedate_core::{build, GitCli, Index};

/// Index every commit reachable from `reference` in `repo`.
pub fn run(ctx: &Context, reference: &str, repo: &Path) -> Result<()> {
    if !GitCli::is_available() {
        anyhow::bail!("git was not found on PATH");
    }

    let start = Instant::now();
    let mut index = Index::open_or_create(&ctx.index_path)
        .with_context(|| format!("Failed to open index {}", ctx.index_path.display()))?;
    let mut git = GitCli::new(repo);

    println!(
        "{} Indexing {} from {}",
        style("→").cyan(),
        style(reference).bold(),
        repo.display()
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:12} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("█▓▒░  "),
    );

    let pb_clone = pb.clone();
    let report = build(
        &mut index,
        &mut git,
        reference,
        &ctx.config.library,
        Some(&move |current, total, id| {
            pb_clone.set_length(total as u64);
            pb_clone.set_position(current as u64);
            pb_clone.set_message(id.short());
        }),
    );
    pb.finish_and_clear();
    let report = report.context("Build aborted; completed commits are kept")?;

    println!();
    println!("{}", style("Build Report:").bold());
    println!("  Commits reachable: {}", style(report.commits_seen).cyan());
    println!("  Commits indexed:   {}", style(report.commits_indexed).green());
    println!("  Lines staged:      {}", style(report.lines_staged).cyan());
    println!("  References:        {}", style(report.refs).cyan());
    println!();
    println!(
        "{} Done in {:.2}s",
        style("✓").green(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
