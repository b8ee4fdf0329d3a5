//! Metadata refresh without rescanning content.

use crate::builder::rebuild_refs;
use crate::error::Result;
use crate::record::parse_commit_record;
use crate::store::Index;
use crate::types::RefreshReport;
use crate::vcs::Vcs;
use std::collections::BTreeMap;
use tracing::info;

/// Re-derives the metadata of every indexed commit and rebuilds the
/// reference mapping. The line index is left untouched.
///
/// Safe to run at any time; running it twice changes nothing the second
/// time.
pub fn refresh<V: Vcs + ?Sized>(index: &mut Index, vcs: &V) -> Result<RefreshReport> {
    let ids = index.commit_ids()?;

    let mut metas = BTreeMap::new();
    for id in &ids {
        metas.insert(*id, parse_commit_record(*id, &vcs.commit_record(*id)?)?);
    }

    let changed = index.replace_commit_metas(&metas)?;
    let refs = rebuild_refs(index, vcs)?;
    info!(commits = ids.len(), changed, refs, "refreshed metadata");

    Ok(RefreshReport {
        commits_refreshed: ids.len(),
        refs,
    })
}
