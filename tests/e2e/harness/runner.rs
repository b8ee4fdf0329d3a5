use super::assertions::Assertion;
use super::clock::CommitClock;
use super::steps::ScenarioStep;
use super::workspace::TestWorkspace;
use anyhow::{anyhow, ensure, Context, Result};
use std::collections::HashMap;
use tracedate_core::{
    build, refresh, trace_query, BuildReport, CommitId, Config, GitCli, Index, MarkerSpec,
    TraceReport,
};

/// Executes scenarios against a real git repository and index file
pub struct ScenarioRunner {
    workspace: TestWorkspace,
    index: Option<Index>,
    config: Config,
    clock: CommitClock,
    commits: HashMap<String, (CommitId, i64)>,
    branch: String,
    last_build: Option<BuildReport>,
    current_step: usize,
}

impl ScenarioRunner {
    /// Create a new runner with an empty repository
    pub fn new() -> Result<Self> {
        Ok(Self {
            workspace: TestWorkspace::init()?,
            index: None,
            config: Config::default(),
            clock: CommitClock::new(),
            commits: HashMap::new(),
            branch: "master".to_string(),
            last_build: None,
            current_step: 0,
        })
    }

    /// Get current step number
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Execute all steps in sequence
    pub fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .with_context(|| format!("Step {}: {:?}", i, step))?;
        }
        Ok(())
    }

    fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        let ws = &self.workspace;
        match step {
            ScenarioStep::WriteFile { path, content } => ws.write_file(path, content),
            ScenarioStep::RemoveFile { path } => ws.remove_file(path),
            ScenarioStep::Commit { label } => {
                let time = self.clock.tick();
                let id = ws.commit_all(label, time)?;
                self.commits.insert(label.clone(), (id, time));
                Ok(())
            }
            ScenarioStep::Tag { name } => ws.git(&["tag", name], None).map(drop),
            ScenarioStep::AnnotatedTag { name } => {
                ws.git(&["tag", "-a", name, "-m", name], None).map(drop)
            }
            ScenarioStep::DeleteTag { name } => ws.git(&["tag", "-d", name], None).map(drop),
            ScenarioStep::Branch { name } => {
                ws.git(&["checkout", "--quiet", "-b", name], None)?;
                self.branch = name.clone();
                Ok(())
            }
            ScenarioStep::Switch { name } => {
                ws.git(&["checkout", "--quiet", name], None)?;
                self.branch = name.clone();
                Ok(())
            }
            ScenarioStep::Merge { branch, label } => {
                let time = self.clock.tick();
                let id = ws.merge(branch, label, time)?;
                self.commits.insert(label.clone(), (id, time));
                Ok(())
            }
            ScenarioStep::WaitDays { days } => {
                self.clock.advance_days(*days);
                Ok(())
            }
            ScenarioStep::MarkLineage { label, tag } => {
                let (id, _) = self.commit(label)?;
                self.config.lineage.markers.push(MarkerSpec {
                    commit: id.as_hex(),
                    tag: tag.clone(),
                });
                Ok(())
            }
            ScenarioStep::Build { reference } => self.handle_build(reference),
            ScenarioStep::Refresh => {
                let git = GitCli::new(self.workspace.repo_path());
                let index = self.index_mut()?;
                refresh(index, &git)?;
                Ok(())
            }
            ScenarioStep::ReopenIndex => {
                self.index = None;
                let index = Index::open(self.workspace.index_path())?
                    .ok_or_else(|| anyhow!("index file vanished"))?;
                self.index = Some(index);
                Ok(())
            }
            ScenarioStep::Assert { assertion } => self.check_assertion(assertion),
        }
    }

    fn handle_build(&mut self, reference: &str) -> Result<()> {
        if self.index.is_none() {
            self.index = Some(Index::open_or_create(self.workspace.index_path())?);
        }
        let mut git = GitCli::new(self.workspace.repo_path());
        let library = self.config.library.clone();
        let index = self.index_mut()?;

        let report = build(index, &mut git, reference, &library, None)
            .with_context(|| format!("build of {} failed", reference))?;
        self.last_build = Some(report);

        // The builder leaves a detached checkout behind
        let branch = self.branch.clone();
        self.workspace
            .git(&["checkout", "--quiet", &branch], None)
            .map(drop)
    }

    fn index(&self) -> Result<&Index> {
        self.index.as_ref().ok_or_else(|| anyhow!("no index built yet"))
    }

    fn index_mut(&mut self) -> Result<&mut Index> {
        self.index.as_mut().ok_or_else(|| anyhow!("no index built yet"))
    }

    fn commit(&self, label: &str) -> Result<(CommitId, i64)> {
        self.commits
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("no commit labelled {:?}", label))
    }

    fn query(&self, trace: &str) -> Result<Option<TraceReport>> {
        Ok(trace_query(self.index()?, trace, &self.config)?)
    }

    fn matched(&self, trace: &str) -> Result<TraceReport> {
        self.query(trace)?
            .ok_or_else(|| anyhow!("expected a match for:\n{}", trace))
    }

    fn check_assertion(&self, assertion: &Assertion) -> Result<()> {
        match assertion {
            Assertion::LastBuildIndexed(expected) => {
                let report = self
                    .last_build
                    .as_ref()
                    .ok_or_else(|| anyhow!("no build has run"))?;
                ensure!(
                    report.commits_indexed == *expected,
                    "expected {} commits indexed, got {}",
                    expected,
                    report.commits_indexed
                );
            }
            Assertion::IndexedCommitCount(expected) => {
                let commits = self.index()?.stats()?.commits;
                ensure!(commits == *expected, "expected {} commits, got {}", expected, commits);
            }
            Assertion::RefCount(expected) => {
                let refs = self.index()?.refs()?;
                ensure!(
                    refs.len() == *expected,
                    "expected {} refs, got {:?}",
                    expected,
                    refs.keys().collect::<Vec<_>>()
                );
            }
            Assertion::RefPointsAt { name, label } => {
                let (id, _) = self.commit(label)?;
                let refs = self.index()?.refs()?;
                ensure!(
                    refs.get(name) == Some(&id),
                    "expected {} at {}, got {:?}",
                    name,
                    label,
                    refs.get(name)
                );
            }
            Assertion::RefAbsent(name) => {
                ensure!(
                    !self.index()?.refs()?.contains_key(name),
                    "{} should not be indexed",
                    name
                );
            }
            Assertion::SubjectIs { label, subject } => {
                let (id, _) = self.commit(label)?;
                let meta = self
                    .index()?
                    .commit_meta(&id)?
                    .ok_or_else(|| anyhow!("{} has no metadata", label))?;
                ensure!(meta.subject == *subject, "subject was {:?}", meta.subject);
            }
            Assertion::QueryTags { trace, tags } => {
                let report = self.matched(trace)?;
                ensure!(report.tags == *tags, "tags were {:?}", report.tags);
            }
            Assertion::QueryBranches { trace, branches } => {
                let report = self.matched(trace)?;
                ensure!(report.branches == *branches, "branches were {:?}", report.branches);
            }
            Assertion::QueryWindow { trace, first, last } => {
                let report = self.matched(trace)?;
                let (_, start) = self.commit(first)?;
                let (_, end) = self.commit(last)?;
                ensure!(
                    (report.time_start, report.time_end) == (start, end),
                    "window was {}..{}, expected {}..{}",
                    report.time_start,
                    report.time_end,
                    start,
                    end
                );
            }
            Assertion::QueryNoMatch(trace) => {
                let result = self.query(trace)?;
                ensure!(result.is_none(), "expected no match, got {:?}", result);
            }
        }
        Ok(())
    }
}
