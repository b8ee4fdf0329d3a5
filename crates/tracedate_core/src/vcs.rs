//! Version control collaborator used by the index builder and refresh.
//!
//! The builder only needs four things from the VCS: the commits reachable
//! from a reference, a way to materialize a commit's tree, the raw record of
//! a commit and the current tip of every reference. [`GitCli`] provides them
//! by running the `git` binary against a working copy.

use crate::error::{Result, TraceError};
use crate::CommitId;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::trace;

/// Operations the index builder needs from version control.
pub trait Vcs {
    /// Directory where [`Vcs::checkout`] materializes trees.
    fn worktree(&self) -> &Path;

    /// Every commit reachable from `reference`, newest first.
    fn rev_list(&self, reference: &str) -> Result<Vec<CommitId>>;

    /// Materializes the tree of `id` in [`Vcs::worktree`].
    fn checkout(&mut self, id: CommitId) -> Result<()>;

    /// Raw commit record in `git log --format=raw` layout.
    fn commit_record(&self, id: CommitId) -> Result<String>;

    /// Every reference with the commit it currently points at.
    fn list_refs(&self) -> Result<Vec<(String, CommitId)>>;
}

/// [`Vcs`] backed by the `git` command line tool.
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    /// Uses the git working copy at `repo`.
    pub fn new(repo: impl AsRef<Path>) -> Self {
        Self {
            repo: repo.as_ref().to_path_buf(),
        }
    }

    /// Check if git is available.
    pub fn is_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Runs `git -C <repo> <args>` and returns stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        trace!(?args, "running git");
        let command = args.first().copied().unwrap_or_default().to_string();

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(|e| TraceError::Vcs {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TraceError::Vcs {
                command,
                message: stderr.trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| TraceError::Vcs {
            command,
            message: format!("invalid UTF-8 output: {}", e),
        })
    }
}

impl Vcs for GitCli {
    fn worktree(&self) -> &Path {
        &self.repo
    }

    fn rev_list(&self, reference: &str) -> Result<Vec<CommitId>> {
        self.run(&["rev-list", reference])?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(CommitId::from_hex)
            .collect()
    }

    fn checkout(&mut self, id: CommitId) -> Result<()> {
        self.run(&["checkout", "--quiet", &id.as_hex()])?;
        Ok(())
    }

    fn commit_record(&self, id: CommitId) -> Result<String> {
        self.run(&["log", "--no-walk", "--format=raw", &id.as_hex()])
    }

    fn list_refs(&self) -> Result<Vec<(String, CommitId)>> {
        let output = self.run(&[
            "for-each-ref",
            "--format=%(objectname)%09%(*objectname)%09%(refname)",
        ])?;
        parse_ref_listing(&output)
    }
}

/// Parses `object<TAB>peeled<TAB>name` lines. Annotated tags resolve to the
/// commit they peel to.
fn parse_ref_listing(output: &str) -> Result<Vec<(String, CommitId)>> {
    let mut refs = Vec::new();
    for line in output.lines().filter(|l| !l.is_empty()) {
        let mut parts = line.splitn(3, '\t');
        let (Some(object), Some(peeled), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TraceError::Vcs {
                command: "for-each-ref".to_string(),
                message: format!("unexpected line: {}", line),
            });
        };
        let target = if peeled.is_empty() { object } else { peeled };
        refs.push((name.to_string(), CommitId::from_hex(target)?));
    }
    Ok(refs)
}

/// Whether a reference is kept in the index.
///
/// Local branch heads move constantly and the current-position symbol is
/// not a release point, so both are left out.
pub fn is_indexed_ref(name: &str) -> bool {
    !name.starts_with("refs/heads/") && !name.contains("HEAD")
}
