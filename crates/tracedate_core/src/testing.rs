//! In-memory VCS for builder and refresh tests.

use crate::error::{Result, TraceError};
use crate::vcs::Vcs;
use crate::CommitId;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct FakeCommit {
    parents: Vec<CommitId>,
    time: i64,
    subject: String,
    files: Vec<(String, String)>,
}

/// History built in memory; checkouts write the snapshot into a temp dir.
pub(crate) struct FakeVcs {
    worktree: TempDir,
    order: Vec<CommitId>,
    commits: BTreeMap<CommitId, FakeCommit>,
    refs: BTreeMap<String, CommitId>,
    checkouts: Vec<CommitId>,
    failing: HashSet<CommitId>,
    corrupt: HashSet<CommitId>,
}

impl FakeVcs {
    pub(crate) fn new() -> Self {
        Self {
            worktree: TempDir::new().expect("temp worktree"),
            order: Vec::new(),
            commits: BTreeMap::new(),
            refs: BTreeMap::new(),
            checkouts: Vec::new(),
            failing: HashSet::new(),
            corrupt: HashSet::new(),
        }
    }

    /// Adds a commit whose tree is exactly `files`.
    pub(crate) fn commit(
        &mut self,
        parents: &[CommitId],
        time: i64,
        subject: &str,
        files: &[(&str, &str)],
    ) -> CommitId {
        let n = self.order.len() as u8 + 1;
        let mut bytes = [0u8; 20];
        bytes[0] = 0xc0;
        bytes[19] = n;
        let id = CommitId::from_bytes(bytes);

        self.commits.insert(
            id,
            FakeCommit {
                parents: parents.to_vec(),
                time,
                subject: subject.to_string(),
                files: files
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
            },
        );
        self.order.push(id);
        id
    }

    /// Commit ids in creation order.
    pub(crate) fn ids(&self) -> &[CommitId] {
        &self.order
    }

    pub(crate) fn set_ref(&mut self, name: &str, id: CommitId) {
        self.refs.insert(name.to_string(), id);
    }

    pub(crate) fn remove_ref(&mut self, name: &str) {
        self.refs.remove(name);
    }

    pub(crate) fn reword(&mut self, id: CommitId, subject: &str) {
        if let Some(commit) = self.commits.get_mut(&id) {
            commit.subject = subject.to_string();
        }
    }

    pub(crate) fn fail_checkout(&mut self, id: CommitId) {
        self.failing.insert(id);
    }

    pub(crate) fn corrupt_record(&mut self, id: CommitId) {
        self.corrupt.insert(id);
    }

    pub(crate) fn clear_failures(&mut self) {
        self.failing.clear();
        self.corrupt.clear();
    }

    pub(crate) fn checkouts(&self) -> &[CommitId] {
        &self.checkouts
    }

    fn resolve(&self, reference: &str) -> Option<CommitId> {
        [
            reference.to_string(),
            format!("refs/heads/{}", reference),
            format!("refs/tags/{}", reference),
        ]
        .iter()
        .find_map(|name| self.refs.get(name).copied())
        .or_else(|| CommitId::from_hex(reference).ok())
        .filter(|id| self.commits.contains_key(id))
    }
}

impl Vcs for FakeVcs {
    fn worktree(&self) -> &Path {
        self.worktree.path()
    }

    fn rev_list(&self, reference: &str) -> Result<Vec<CommitId>> {
        let tip = self.resolve(reference).ok_or_else(|| TraceError::Vcs {
            command: "rev-list".to_string(),
            message: format!("unknown revision {}", reference),
        })?;

        let mut seen = BTreeSet::new();
        let mut stack = vec![tip];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.commits[&id].parents.iter().copied());
            }
        }

        let mut ids: Vec<CommitId> = seen.into_iter().collect();
        ids.sort_by_key(|id| std::cmp::Reverse((self.commits[id].time, *id)));
        Ok(ids)
    }

    fn checkout(&mut self, id: CommitId) -> Result<()> {
        if self.failing.contains(&id) {
            return Err(TraceError::Vcs {
                command: "checkout".to_string(),
                message: format!("simulated failure for {}", id),
            });
        }
        let commit = self.commits.get(&id).ok_or_else(|| TraceError::Vcs {
            command: "checkout".to_string(),
            message: format!("unknown commit {}", id),
        })?;

        for entry in fs::read_dir(self.worktree.path())? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        for (rel, content) in &commit.files {
            let path = self.worktree.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }

        self.checkouts.push(id);
        Ok(())
    }

    fn commit_record(&self, id: CommitId) -> Result<String> {
        let commit = self.commits.get(&id).ok_or_else(|| TraceError::Vcs {
            command: "log".to_string(),
            message: format!("unknown commit {}", id),
        })?;

        let mut record = format!("commit {}\ntree {}\n", id, "0".repeat(40));
        for parent in &commit.parents {
            record.push_str(&format!("parent {}\n", parent));
        }
        record.push_str(&format!(
            "author Test Author <author@example.com> {} +0000\n",
            commit.time
        ));
        record.push_str(&format!(
            "committer Test Committer <committer@example.com> {} +0000\n",
            commit.time
        ));
        if !self.corrupt.contains(&id) {
            record.push_str(&format!("\n    {}\n", commit.subject));
        }
        Ok(record)
    }

    fn list_refs(&self) -> Result<Vec<(String, CommitId)>> {
        Ok(self.refs.iter().map(|(n, id)| (n.clone(), *id)).collect())
    }
}
