//! Index builder: walks a reference's whole history into the index.

use crate::config::LibraryConfig;
use crate::error::Result;
use crate::record::parse_commit_record;
use crate::scan::scan_worktree;
use crate::store::Index;
use crate::types::BuildReport;
use crate::vcs::{is_indexed_ref, Vcs};
use crate::CommitId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Progress callback for builds.
/// Called with (current, total, commit) before each new commit is scanned.
pub type BuildProgressCallback<'a> = dyn Fn(usize, usize, CommitId) + 'a;

/// Indexes every commit reachable from `reference` that the index does not
/// know yet.
///
/// Commits are processed oldest first. Each one is checked out, scanned and
/// parsed, then merged into the index in a single transaction, so an
/// aborted run leaves only whole commits behind and the next run picks up
/// where it stopped. Afterwards the reference mapping is rebuilt.
///
/// Leaves the working copy at the last processed commit.
///
/// # Errors
///
/// Any VCS failure or malformed commit record aborts the run.
pub fn build<V: Vcs + ?Sized>(
    index: &mut Index,
    vcs: &mut V,
    reference: &str,
    library: &LibraryConfig,
    progress: Option<&BuildProgressCallback<'_>>,
) -> Result<BuildReport> {
    let reachable = vcs.rev_list(reference)?;
    let known: BTreeSet<CommitId> = index.commit_ids()?.into_iter().collect();

    let pending: Vec<CommitId> = reachable
        .iter()
        .rev()
        .filter(|id| !known.contains(id))
        .copied()
        .collect();

    let mut report = BuildReport {
        commits_seen: reachable.len(),
        ..Default::default()
    };
    info!(
        reference,
        reachable = reachable.len(),
        new = pending.len(),
        "starting build"
    );

    for (i, id) in pending.iter().enumerate() {
        if let Some(cb) = progress {
            cb(i, pending.len(), *id);
        }

        vcs.checkout(*id)?;
        let staged = scan_worktree(vcs.worktree(), library)?;
        let meta = parse_commit_record(*id, &vcs.commit_record(*id)?)?;
        index.store_commit(*id, &meta, &staged)?;

        info!(
            commit = %id.short(),
            files = staged.file_count(),
            lines = staged.line_count(),
            subject = %meta.subject,
            "indexed commit"
        );
        report.commits_indexed += 1;
        report.lines_staged += staged.line_count();
    }

    report.refs = rebuild_refs(index, vcs)?;
    Ok(report)
}

/// Replaces the stored reference mapping with the current tips of every
/// indexed reference. Returns the number of references kept.
pub fn rebuild_refs<V: Vcs + ?Sized>(index: &mut Index, vcs: &V) -> Result<usize> {
    let refs: BTreeMap<String, CommitId> = vcs
        .list_refs()?
        .into_iter()
        .filter(|(name, _)| is_indexed_ref(name))
        .collect();
    index.replace_refs(&refs)?;
    Ok(refs.len())
}
