//! Turning a candidate commit set into a traceback answer.

use crate::ancestry::{classify, Lineage};
use crate::config::Config;
use crate::error::Result;
use crate::matcher::{extract_frames, match_frames};
use crate::store::Index;
use crate::types::{IndexMeta, TraceReport};
use crate::CommitId;
use std::collections::BTreeSet;
use tracing::debug;

const TAG_NAMESPACE: &str = "refs/tags/";

/// Builds the answer for a non-empty candidate set.
///
/// Returns `None` when no candidate has metadata, which includes the empty
/// set.
pub fn compose(
    meta: &IndexMeta,
    candidates: &BTreeSet<CommitId>,
    branches: Vec<String>,
) -> Option<TraceReport> {
    let times: Vec<i64> = candidates
        .iter()
        .filter_map(|id| meta.committer_time(id))
        .collect();
    let time_start = times.iter().copied().min()?;
    let time_end = times.iter().copied().max()?;

    let mut tagged: Vec<(i64, &str)> = meta
        .refs
        .iter()
        .filter(|(_, target)| candidates.contains(target))
        .filter_map(|(name, target)| {
            let tag = name.strip_prefix(TAG_NAMESPACE)?;
            Some((meta.committer_time(target).unwrap_or(i64::MIN), tag))
        })
        .collect();
    tagged.sort();

    Some(TraceReport {
        tags: tagged.into_iter().map(|(_, tag)| tag.to_string()).collect(),
        branches,
        time_start,
        time_end,
    })
}

/// Dates a traceback.
///
/// Extracts frames from `text`, matches them against the index, classifies
/// the surviving candidates and composes the answer. `Ok(None)` means no
/// match; errors are reserved for failures of the index itself.
///
/// # Examples
///
/// ```no_run
/// use tracedate_core::{trace_query, Config, Index};
///
/// # fn main() -> tracedate_core::Result<()> {
/// let config = Config::default();
/// let index = Index::open("tracedate.redb")?.expect("index built");
/// match trace_query(&index, "File \"discord/client.py\", line 1, in <module>\n    import asyncio", &config)? {
///     Some(report) => println!("{:?}", report.tags),
///     None => println!("No results"),
/// }
/// # Ok(())
/// # }
/// ```
pub fn trace_query(index: &Index, text: &str, config: &Config) -> Result<Option<TraceReport>> {
    let frames = extract_frames(text, &config.library.root_name);
    debug!(frames = frames.len(), "extracted frames");

    let candidates = match_frames(index, &frames)?;
    if candidates.is_empty() {
        return Ok(None);
    }
    debug!(candidates = candidates.len(), "matched commits");

    let meta = index.meta()?;
    let lineage = Lineage::from_config(&config.lineage)?;
    let branches = classify(&meta, &candidates, &lineage);

    Ok(compose(&meta, &candidates, branches))
}
