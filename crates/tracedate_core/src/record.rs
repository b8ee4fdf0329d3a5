//! Parser for raw git commit records.
//!
//! Input is the output of `git log --no-walk --format=raw <id>`:
//!
//! ```text
//! commit <id>
//! tree <id>
//! parent <id>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  <signature continuation lines>
//!
//!     <subject>
//!
//!     <body>
//! ```

use crate::error::{Result, TraceError};
use crate::types::CommitMeta;
use crate::CommitId;
use std::collections::BTreeSet;
use tracing::warn;

const MESSAGE_INDENT: &str = "    ";

/// Parses the raw record of commit `expected`.
///
/// # Errors
///
/// Returns `MalformedCommitRecord` if the record names another commit, lacks
/// an author, committer or subject, or carries an unparseable timestamp.
/// Unknown header fields are logged and skipped.
pub fn parse_commit_record(expected: CommitId, record: &str) -> Result<CommitMeta> {
    let malformed = |reason: String| TraceError::MalformedCommitRecord {
        commit: expected.as_hex(),
        reason,
    };

    let lines: Vec<&str> = record.lines().collect();
    let mut parents = BTreeSet::new();
    let mut author = None;
    let mut committer = None;

    let mut pos = 0;
    while pos < lines.len() {
        let line = lines[pos];
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') {
            // continuation of a multi-line header (gpgsig, mergetag)
            pos += 1;
            continue;
        }

        let (name, content) = line.split_once(' ').unwrap_or((line, ""));
        match name {
            "commit" => {
                let id = CommitId::from_hex(content).map_err(|e| malformed(e.to_string()))?;
                if id != expected {
                    return Err(malformed(format!("record names commit {}", id)));
                }
            }
            "tree" => {}
            "parent" => {
                parents.insert(CommitId::from_hex(content).map_err(|e| malformed(e.to_string()))?);
            }
            "author" => author = Some(parse_signature(content).map_err(&malformed)?),
            "committer" => committer = Some(parse_signature(content).map_err(&malformed)?),
            "gpgsig" => {}
            other => warn!(commit = %expected.short(), field = other, "unhandled commit field"),
        }
        pos += 1;
    }

    if pos + 1 >= lines.len() {
        return Err(malformed("unexpected end of commit data".to_string()));
    }

    let (author, author_time) = author.ok_or_else(|| malformed("missing author".to_string()))?;
    let (committer, committer_time) =
        committer.ok_or_else(|| malformed("missing committer".to_string()))?;

    Ok(CommitMeta {
        parents,
        author,
        author_time,
        committer,
        committer_time,
        subject: unindent(lines[pos + 1]).to_string(),
        body: message_body(&lines[pos + 2..]),
    })
}

/// Splits `<identity> <timestamp> <timezone>`.
fn parse_signature(content: &str) -> std::result::Result<(String, i64), String> {
    let mut parts = content.rsplitn(3, ' ');
    let (Some(_tz), Some(timestamp), Some(identity)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("bad signature line: {}", content));
    };
    let time = timestamp
        .parse::<i64>()
        .map_err(|e| format!("bad timestamp {:?}: {}", timestamp, e))?;
    Ok((identity.to_string(), time))
}

fn unindent(line: &str) -> &str {
    line.strip_prefix(MESSAGE_INDENT).unwrap_or(line.trim_start())
}

/// Message lines after the subject, without the separating blank line.
fn message_body(lines: &[&str]) -> String {
    let lines = match lines.first() {
        Some(first) if first.trim().is_empty() => &lines[1..],
        _ => lines,
    };
    lines
        .iter()
        .map(|l| unindent(l))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
