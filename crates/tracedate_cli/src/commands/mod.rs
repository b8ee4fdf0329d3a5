//! CLI commands.

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracedate_core::{Config, Index};
use tracing::debug;

pub mod build;
pub mod query;
pub mod refresh;
pub mod show;

/// Settings shared by every command.
pub struct Context {
    pub config: Config,
    pub index_path: PathBuf,
}

impl Context {
    /// Loads the config file; `--index` wins over `[storage].index_file`.
    pub fn load(config_path: &Path, index: Option<PathBuf>) -> Result<Self> {
        let config = Config::load(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        let index_path = index.unwrap_or_else(|| PathBuf::from(&config.storage.index_file));
        Ok(Self { config, index_path })
    }

    /// Opens an existing index for reading.
    ///
    /// redb locks the file for as long as the handle lives, so only one
    /// `tracedate` process can use an index at a time; a concurrent `query`
    /// fails with a storage error instead of waiting. Queries within one
    /// process can share the handle.
    pub fn open_index(&self) -> Result<Index> {
        debug!(path = %self.index_path.display(), "opening index");
        Index::open(&self.index_path)?.with_context(|| {
            format!(
                "No index at {} (run 'tracedate build <ref>' first)",
                self.index_path.display()
            )
        })
    }
}
