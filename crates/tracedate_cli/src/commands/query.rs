//! Query command - date a traceback.

use super::Context;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local, Utc};
use std::io::Read;
use std::path::Path;
use tracedate_core::{strip_code_fences, trace_query, TraceReport};

/// Read a traceback from `file` or stdin and print its dating.
pub fn run(ctx: &Context, file: Option<&Path>, format: &str) -> Result<()> {
    if !matches!(format, "text" | "json") {
        anyhow::bail!("Unsupported format: {}. Use 'text' or 'json'.", format);
    }

    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let index = ctx.open_index()?;
    let result = trace_query(&index, &strip_code_fences(&text), &ctx.config)
        .context("Failed to query index")?;

    let Some(report) = result else {
        println!("No results");
        return Ok(());
    };

    match format {
        "json" => println!("{}", report.to_json()?),
        _ => println!("{}", to_text(&report, Utc::now().timestamp())),
    }

    Ok(())
}

fn to_text(report: &TraceReport, now: i64) -> String {
    format!(
        "Period: {} to {} ({} span)\nAge: At least {}\nBranches: {}\nTags: {}",
        date(report.time_start),
        date(report.time_end),
        days_between(report.time_start, report.time_end),
        days_between(report.time_end, now),
        list_or_none(&report.branches),
        list_or_none(&report.tags),
    )
}

/// Calendar date in the local time zone.
fn date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string()
}

fn days_between(a: i64, b: i64) -> String {
    match (b - a).div_euclid(86_400) {
        1 => "1 day".to_string(),
        n => format!("{} days", n),
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None match".to_string()
    } else {
        items.join(", ")
    }
}
