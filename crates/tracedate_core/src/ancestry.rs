//! Lineage classification by walking commit ancestry.

use crate::config::LineageConfig;
use crate::error::Result;
use crate::types::IndexMeta;
use crate::CommitId;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Boundaries of the ancestry walk: marker commits and the tag for roots.
#[derive(Debug, Clone)]
pub struct Lineage {
    root_tag: String,
    markers: BTreeMap<CommitId, String>,
}

impl Lineage {
    /// Creates a lineage with the given root tag and markers.
    pub fn new(root_tag: impl Into<String>, markers: impl IntoIterator<Item = (CommitId, String)>) -> Self {
        Self {
            root_tag: root_tag.into(),
            markers: markers.into_iter().collect(),
        }
    }

    /// Builds the lineage described by the `[lineage]` config section.
    pub fn from_config(config: &LineageConfig) -> Result<Self> {
        Ok(Self::new(config.root_tag.clone(), config.markers()?))
    }
}

/// Tags every lineage the candidates trace back to.
///
/// Walks parents from all candidates with a worklist and a visited set, so
/// merges that reconverge are expanded once. A marker commit contributes its
/// tag and stops that path; so does a root commit, with the root tag.
/// Commits missing from `meta` cannot be expanded and are skipped.
///
/// Tags are returned in discovery order, each at most once. Candidates are
/// seeded by committer time so the order is deterministic.
pub fn classify(meta: &IndexMeta, candidates: &BTreeSet<CommitId>, lineage: &Lineage) -> Vec<String> {
    let mut seeds: Vec<CommitId> = candidates.iter().copied().collect();
    seeds.sort_by_key(|id| (meta.committer_time(id).unwrap_or(i64::MIN), *id));

    let mut worklist = seeds;
    let mut visited: HashSet<CommitId> = HashSet::new();
    let mut tags: Vec<String> = Vec::new();
    let mut record = |tag: &str| {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    };

    while let Some(id) = worklist.pop() {
        if !visited.insert(id) {
            continue;
        }

        if let Some(tag) = lineage.markers.get(&id) {
            record(tag);
            continue;
        }

        let Some(commit) = meta.commits.get(&id) else {
            debug!(commit = %id.short(), "ancestor not in metadata store");
            continue;
        };

        if commit.is_root() {
            record(&lineage.root_tag);
            continue;
        }

        worklist.extend(commit.parents.iter().filter(|p| !visited.contains(*p)).copied());
    }

    tags
}
