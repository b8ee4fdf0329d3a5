//! Traceback parsing and frame matching against the line index.

use crate::error::Result;
use crate::store::Index;
use crate::types::{Frame, LineEntry};
use crate::CommitId;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

const FRAME_HEADER_REGEX: &str = r#"File "([^"]*)", line ([0-9]+), in"#;

fn frame_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FRAME_HEADER_REGEX).expect("frame header pattern is valid"))
}

/// Extracts frames from free text.
///
/// A frame is a `File "<path>", line <n>, in ...` header followed by the
/// source line it points at. A header directly followed by another header is
/// an intermediate duplicate and yields no frame.
///
/// # Examples
///
/// ```
/// use tracedate_core::extract_frames;
///
/// let text = r#"Traceback (most recent call last):
///   File "C:\Python36\lib\site-packages\discord\client.py", line 307, in _run_event
///     yield from getattr(self, event)(*args, **kwargs)
/// "#;
/// let frames = extract_frames(text, "discord");
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].path, "discord/client.py");
/// assert_eq!(frames[0].line_no, 307);
/// assert_eq!(frames[0].text, "yield from getattr(self, event)(*args, **kwargs)");
/// ```
pub fn extract_frames(text: &str, root_name: &str) -> Vec<Frame> {
    let re = frame_header();
    let lines: Vec<&str> = text.lines().collect();
    let mut frames = Vec::new();

    let mut pos = 0;
    while pos < lines.len() {
        let Some(caps) = re.captures(lines[pos]) else {
            pos += 1;
            continue;
        };
        match lines.get(pos + 1) {
            Some(next) if !re.is_match(next) => {
                match caps[2].parse::<u32>() {
                    Ok(line_no) => frames.push(Frame {
                        path: normalize_path(&caps[1], root_name),
                        line_no,
                        text: next.trim().to_string(),
                    }),
                    Err(e) => debug!(line = &caps[2], error = %e, "unusable frame line number"),
                }
                pos += 2;
            }
            _ => pos += 1,
        }
    }

    frames
}

/// Unifies separators to `/` and cuts the path down to start at the last
/// path component named `root_name`, if there is one.
///
/// # Examples
///
/// ```
/// use tracedate_core::normalize_path;
///
/// assert_eq!(
///     normalize_path("/usr/lib/python3/site-packages/discord/ext/commands/bot.py", "discord"),
///     "discord/ext/commands/bot.py"
/// );
/// assert_eq!(normalize_path("bot.py", "discord"), "bot.py");
/// ```
pub fn normalize_path(path: &str, root_name: &str) -> String {
    let path = path.replace('\\', "/");
    let components: Vec<&str> = path.split('/').collect();
    match components.iter().rposition(|c| *c == root_name) {
        Some(start) => components[start..].join("/"),
        None => path,
    }
}

/// Removes a trailing code fence (```` ``` ```` or `` ` ``) from every line.
///
/// Tracebacks pasted into chat are often quoted; the closing fence would
/// otherwise stick to the last source line and break matching.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.strip_suffix("```")
                .or_else(|| line.strip_suffix('`'))
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Commits whose stored text at a frame's location ends with the frame text.
///
/// Every matching stored text contributes; their commit sets are unioned.
pub fn frame_candidates(entry: &LineEntry, frame_text: &str) -> BTreeSet<CommitId> {
    entry
        .iter()
        .filter(|(content, _)| content.ends_with(frame_text))
        .flat_map(|(_, ids)| ids.iter().copied())
        .collect()
}

/// Intersects the candidate sets of all frames that matched anything.
///
/// Frames at unindexed locations, or whose text matched nothing, are left
/// out instead of emptying the result. An empty set means no match.
pub fn match_frames(index: &Index, frames: &[Frame]) -> Result<BTreeSet<CommitId>> {
    let mut common: Option<BTreeSet<CommitId>> = None;

    for frame in frames {
        let key = frame.key();
        let Some(entry) = index.line_entry(&key)? else {
            debug!(%key, "frame location not indexed");
            continue;
        };

        let matched = frame_candidates(&entry, &frame.text);
        if matched.is_empty() {
            debug!(%key, text = %frame.text, "frame text matched nothing");
            continue;
        }

        common = Some(match common {
            None => matched,
            Some(prev) => prev.intersection(&matched).copied().collect(),
        });
    }

    Ok(common.unwrap_or_default())
}
