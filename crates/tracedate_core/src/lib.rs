//! Tracedate Core Library
//!
//! Dates Python tracebacks against the history of the library they came
//! from, providing:
//! - A per-line content index built from every commit of a reference
//! - Commit metadata and reference snapshots kept beside it
//! - Frame matching that narrows a traceback to candidate commits
//! - Lineage classification and a time window for the answer
//!
//! # Quick Start
//!
//! ```
//! use tracedate_core::{extract_frames, normalize_path};
//!
//! let trace = r#"Traceback (most recent call last):
//!   File "C:\Python36\lib\site-packages\discord\client.py", line 307, in _run_event
//!     yield from getattr(self, event)(*args, **kwargs)
//! "#;
//!
//! let frames = extract_frames(trace, "discord");
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].path, "discord/client.py");
//! assert_eq!(frames[0].line_no, 307);
//!
//! assert_eq!(normalize_path("/venv/discord/ext/commands/bot.py", "discord"), "discord/ext/commands/bot.py");
//! ```
//!
//! # Building and querying
//!
//! ```no_run
//! use tracedate_core::{build, trace_query, Config, GitCli, Index};
//!
//! # fn main() -> tracedate_core::Result<()> {
//! let config = Config::default();
//! let mut index = Index::open_or_create("tracedate.redb")?;
//! let mut git = GitCli::new("discord.py");
//!
//! build(&mut index, &mut git, "master", &config.library, None)?;
//!
//! let text = std::fs::read_to_string("traceback.txt")?;
//! if let Some(report) = trace_query(&index, &text, &config)? {
//!     println!("{}", report.to_json()?);
//! }
//! # Ok(())
//! # }
//! ```

mod ancestry;
mod builder;
mod commit_id;
mod compose;
mod config;
mod error;
mod matcher;
mod record;
mod refresh;
mod scan;
mod store;
mod types;
mod vcs;

#[cfg(test)]
mod testing;

pub use ancestry::{classify, Lineage};
pub use builder::{build, rebuild_refs, BuildProgressCallback};
pub use commit_id::CommitId;
pub use compose::{compose, trace_query};
pub use config::{
    Config, LibraryConfig, LineageConfig, MarkerSpec, StorageConfig, START_OF_REWRITE,
};
pub use error::{Result, TraceError};
pub use matcher::{extract_frames, frame_candidates, match_frames, normalize_path, strip_code_fences};
pub use record::parse_commit_record;
pub use refresh::refresh;
pub use scan::{scan_worktree, StagedCommit};
pub use store::{Index, INDEX_SCHEMA_VERSION};
pub use types::*;
pub use vcs::{is_indexed_ref, GitCli, Vcs};
