//! Configuration for the indexed library and lineage classification.

use crate::error::{Result, TraceError};
use crate::CommitId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// First commit of the rewrite history.
pub const START_OF_REWRITE: &str = "044b0824e68c4dacdaf26ff52a741ca1b5118c9b";

/// Comprehensive tracedate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// What part of the repository is indexed and how tracebacks name it.
    #[serde(default)]
    pub library: LibraryConfig,

    /// Ancestry boundaries used to classify candidates.
    #[serde(default)]
    pub lineage: LineageConfig,

    /// Storage-related configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Config = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| TraceError::ConfigError(format!("failed to read config: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| TraceError::ConfigError(format!("failed to parse config: {}", e)))?
        } else {
            Config::default()
        };
        config.lineage.markers()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TraceError::ConfigError(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| TraceError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }
}

/// The library whose history is indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Folder name that anchors traceback paths (default: "discord").
    /// Paths are cut to start at its last occurrence.
    pub root_name: String,

    /// Directory, relative to the repository root, that gets scanned
    /// (default: "discord").
    pub source_root: String,

    /// File extensions that are indexed, without the dot (default: ["py"]).
    pub extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root_name: "discord".to_string(),
            source_root: "discord".to_string(),
            extensions: vec!["py".to_string()],
        }
    }
}

impl LibraryConfig {
    /// Returns true if a file name carries one of the indexed extensions.
    pub fn is_source_file(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.extensions.iter().any(|e| e == ext),
            _ => false,
        }
    }
}

/// A well-known commit that stops the ancestry walk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkerSpec {
    /// Hex id of the marker commit.
    pub commit: String,
    /// Lineage tag assigned when the walk reaches it.
    pub tag: String,
}

/// Lineage classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageConfig {
    /// Tag for candidates that reach a root commit (default: "legacy").
    pub root_tag: String,

    /// Marker commits, checked before the root rule.
    pub markers: Vec<MarkerSpec>,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            root_tag: "legacy".to_string(),
            markers: vec![MarkerSpec {
                commit: START_OF_REWRITE.to_string(),
                tag: "rewrite".to_string(),
            }],
        }
    }
}

impl LineageConfig {
    /// Parsed marker commits with their tags.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a marker id is not a full commit id.
    pub fn markers(&self) -> Result<Vec<(CommitId, String)>> {
        self.markers
            .iter()
            .map(|m| {
                CommitId::from_hex(&m.commit)
                    .map(|id| (id, m.tag.clone()))
                    .map_err(|e| {
                        TraceError::ConfigError(format!("invalid marker {}: {}", m.commit, e))
                    })
            })
            .collect()
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Index database file (default: "tracedate.redb").
    pub index_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_file: "tracedate.redb".to_string(),
        }
    }
}
