//! Error types for tracedate_core operations.

use thiserror::Error;

/// Core error type for tracedate_core operations.
///
/// A query that finds no candidate commits is not an error; it is reported
/// as `Ok(None)` by [`crate::trace_query`].
#[derive(Error, Debug)]
pub enum TraceError {
    /// An external VCS invocation failed. Fatal to a build or refresh run.
    #[error("git {command} failed: {message}")]
    Vcs {
        /// The git subcommand that was run
        command: String,
        /// stderr of the failed invocation, or the spawn error
        message: String,
    },

    /// A commit record did not have the expected shape.
    #[error("malformed commit record for {commit}: {reason}")]
    MalformedCommitRecord {
        /// Hex id of the commit whose record was parsed
        commit: String,
        /// What was missing or unparseable
        reason: String,
    },

    /// Invalid hex string for CommitId parsing.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// The underlying database reported an error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error while writing a stored value.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error while reading a stored value.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Index is corrupted or was written by an incompatible version.
    #[error("index corrupted: {message}. Delete the index file and run 'tracedate build' again.")]
    IndexCorrupted {
        /// Description of the corruption
        message: String,
    },

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TraceError {
    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Vcs { .. } => Some(
                "Check that --repo points at a git working copy. Re-running 'tracedate build' resumes where it stopped.",
            ),
            Self::MalformedCommitRecord { .. } => {
                Some("The git log format was not understood. Check the installed git version.")
            }
            Self::IndexCorrupted { .. } => {
                Some("Delete the index file and rebuild it with 'tracedate build <ref>'.")
            }
            Self::Storage(_) => {
                Some("Another build or refresh may be holding the index open. Wait for it to finish.")
            }
            Self::ConfigError(_) => Some("Check the [library], [lineage] and [storage] sections of the config file."),
            _ => None,
        }
    }
}

/// Convenience Result type for tracedate_core operations.
pub type Result<T> = std::result::Result<T, TraceError>;
