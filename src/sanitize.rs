//! Line-break repair for registry exports
//!
//! Every record in the registry files starts with a numeric key (`id`, `inn`).
//! Free-text columns such as `full_name` occasionally carry raw line breaks,
//! which split one record over several physical lines. A line that does not
//! start with a digit is therefore a continuation and is joined back onto the
//! previous line. The header is the first line and is never touched.

use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// PATTERNS
// =============================================================================

/// Newline followed by a character that cannot start a record
static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n([^0-9\n])").unwrap());

/// Runs of blank lines
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Repaired file content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedText {
    pub text: String,
    /// Number of continuation lines joined onto a previous record
    pub joined_lines: usize,
}

/// Join continuation lines until the content is stable.
///
/// The source file is not rewritten; callers parse the returned text.
pub fn repair_line_breaks(content: &str) -> RepairedText {
    let mut text = content.replace("\r\n", "\n");
    text = BLANK_LINES_RE.replace_all(&text, "\n").into_owned();

    let mut joined_lines = 0;
    loop {
        let matches = CONTINUATION_RE.find_iter(&text).count();
        if matches == 0 {
            break;
        }
        joined_lines += matches;
        text = CONTINUATION_RE.replace_all(&text, "$1").into_owned();
    }

    RepairedText { text, joined_lines }
}
