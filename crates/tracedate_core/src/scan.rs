//! Per-commit scan of a checked-out working copy.
//!
//! A scan only stages lines; nothing reaches the index until
//! [`crate::Index::store_commit`] merges the whole stage in one transaction.

use crate::config::LibraryConfig;
use crate::error::Result;
use crate::matcher::normalize_path;
use crate::types::LineKey;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lines of every source file of one commit, staged before merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedCommit {
    files: BTreeMap<String, Vec<String>>,
}

impl StagedCommit {
    /// Creates an empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a file's content. Lines are right-trimmed.
    pub fn add_file(&mut self, path: impl Into<String>, content: &str) {
        let lines = content.lines().map(|l| l.trim_end().to_string()).collect();
        self.files.insert(path.into(), lines);
    }

    /// Every staged `(key, content)` pair, in path then line order.
    pub fn lines(&self) -> impl Iterator<Item = (LineKey, &str)> + '_ {
        self.files.iter().flat_map(|(path, lines)| {
            lines
                .iter()
                .enumerate()
                .map(move |(i, line)| (LineKey::new(path.clone(), i as u32 + 1), line.as_str()))
        })
    }

    /// Number of staged files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of staged lines.
    pub fn line_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Returns true if nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Stages every source file under `worktree/<library.source_root>`.
///
/// Paths are keyed the way tracebacks name them: relative to the worktree,
/// then cut at `library.root_name` like [`normalize_path`] does for frames.
///
/// Walks with an explicit directory stack. A missing source root stages
/// nothing.
pub fn scan_worktree(worktree: &Path, library: &LibraryConfig) -> Result<StagedCommit> {
    let mut staged = StagedCommit::new();
    let source_root = worktree.join(&library.source_root);
    if !source_root.is_dir() {
        debug!(root = %source_root.display(), "source root absent, nothing to stage");
        return Ok(staged);
    }

    let mut pending: Vec<PathBuf> = vec![source_root];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                && library.is_source_file(&entry.file_name().to_string_lossy())
            {
                let bytes = fs::read(&path)?;
                let rel = normalize_path(&relative_path(worktree, &path), &library.root_name);
                staged.add_file(rel, &String::from_utf8_lossy(&bytes));
            }
        }
    }

    Ok(staged)
}

/// `path` relative to `root`, `/` separated.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
