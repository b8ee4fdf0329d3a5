//! E2E test harness for tracedate.
//!
//! This module contains test infrastructure with builders and variants that
//! not every scenario uses.

#![allow(dead_code)]

pub mod clock;
pub mod runner;

// Re-export commonly used types
pub use assertions::Assertion;
pub use scenario::Scenario;

/// Formats a traceback the way CPython prints one from an installed package.
///
/// Each frame is `(path inside the package, line number, source text)`.
pub fn traceback(frames: &[(&str, u32, &str)]) -> String {
    let mut text = String::from("Traceback (most recent call last):\n");
    for (path, line, source) in frames {
        text.push_str(&format!(
            "  File \"/home/bot/.venv/lib/python3.6/site-packages/{}\", line {}, in handler\n    {}\n",
            path, line, source
        ));
    }
    text.push_str("RuntimeError: boom\n");
    text
}
