//! Core data types for tracedate.

use crate::CommitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Metadata of one indexed commit, parsed from its raw git record.
///
/// Never partially updated: a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    /// Parent commits (empty for a root commit).
    pub parents: BTreeSet<CommitId>,
    /// Author identity, `Name <email>`.
    pub author: String,
    /// Author timestamp (Unix seconds).
    pub author_time: i64,
    /// Committer identity, `Name <email>`.
    pub committer: String,
    /// Committer timestamp (Unix seconds).
    pub committer_time: i64,
    /// First line of the commit message.
    pub subject: String,
    /// Remainder of the commit message.
    pub body: String,
}

impl CommitMeta {
    /// Returns true for a commit without parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// The `META` view of the index: every reference and every known commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Non-branch reference name to the commit it points at.
    pub refs: BTreeMap<String, CommitId>,
    /// Metadata of every indexed commit.
    pub commits: BTreeMap<CommitId, CommitMeta>,
}

impl IndexMeta {
    /// Committer time of a known commit.
    pub fn committer_time(&self, id: &CommitId) -> Option<i64> {
        self.commits.get(id).map(|meta| meta.committer_time)
    }
}

/// Approximate logical location of a line: a file path and a 1-based line
/// number. Not tracked through renames.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineKey {
    /// Path relative to the repository root, `/` separated.
    pub path: String,
    /// 1-based line number.
    pub line_no: u32,
}

impl LineKey {
    /// Creates a key.
    pub fn new(path: impl Into<String>, line_no: u32) -> Self {
        Self {
            path: path.into(),
            line_no,
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line_no)
    }
}

/// Every exact text a [`LineKey`] ever held, with the commits that held it.
pub type LineEntry = BTreeMap<String, BTreeSet<CommitId>>;

/// One frame extracted from a traceback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Normalized path (see [`crate::normalize_path`]).
    pub path: String,
    /// Line number reported by the traceback.
    pub line_no: u32,
    /// Source text shown under the frame header, trimmed.
    pub text: String,
}

impl Frame {
    /// The index key this frame looks up.
    pub fn key(&self) -> LineKey {
        LineKey::new(self.path.clone(), self.line_no)
    }
}

/// Answer to a traceback query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceReport {
    /// Tags pointing at a candidate commit, oldest first, without `refs/tags/`.
    pub tags: Vec<String>,
    /// Lineage tags the candidates trace back to, in discovery order.
    pub branches: Vec<String>,
    /// Earliest committer time among the candidates.
    #[serde(rename = "time-start")]
    pub time_start: i64,
    /// Latest committer time among the candidates.
    #[serde(rename = "time-end")]
    pub time_end: i64,
}

impl TraceReport {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::TraceError::Serialization(e.to_string()))
    }
}

/// Report from an index build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Commits reachable from the reference.
    pub commits_seen: usize,
    /// Commits that were new and got scanned.
    pub commits_indexed: usize,
    /// Lines staged across all scanned commits.
    pub lines_staged: usize,
    /// References retained after the rebuild.
    pub refs: usize,
}

/// Report from a metadata refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Commits whose metadata was re-derived.
    pub commits_refreshed: usize,
    /// References retained after the rebuild.
    pub refs: usize,
}

/// Summary counts of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Indexed commits.
    pub commits: usize,
    /// Stored references.
    pub refs: usize,
    /// Distinct `(path, line)` keys.
    pub line_keys: usize,
}
