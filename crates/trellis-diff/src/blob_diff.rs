//! Line-level diff of two file contents, rendered as unified text.
//!
//! Uses the `similar` crate (Myers diff) with three lines of context.

use std::fmt::Write;

use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 3;

/// The result of diffing two blobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDiff {
    pub hunks: Vec<DiffHunk>,
    /// Either side was not valid UTF-8 text or contained a NUL byte.
    pub binary: bool,
}

impl BlobDiff {
    /// Returns `true` if the two contents are identical.
    pub fn is_empty(&self) -> bool {
        !self.binary && self.hunks.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks.iter().flat_map(|h| &h.lines).filter(|l| pred(l)).count()
    }

    /// Render as a unified diff with `a/` and `b/` path headers.
    ///
    /// Identical contents render as an empty string.
    pub fn to_unified(&self, old_path: &str, new_path: &str) -> String {
        let mut out = String::new();
        if self.binary {
            let _ = writeln!(out, "Binary files a/{old_path} and b/{new_path} differ");
            return out;
        }
        if self.hunks.is_empty() {
            return out;
        }
        let _ = writeln!(out, "--- a/{old_path}");
        let _ = writeln!(out, "+++ b/{new_path}");
        for hunk in &self.hunks {
            let _ = writeln!(
                out,
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            );
            for line in &hunk.lines {
                let (marker, text) = match line {
                    DiffLine::Context(t) => (' ', t),
                    DiffLine::Added(t) => ('+', t),
                    DiffLine::Removed(t) => ('-', t),
                };
                let _ = writeln!(out, "{marker}{text}");
            }
        }
        out
    }
}

/// A contiguous region of changes with surrounding context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// First old line covered (1-based; 0 when the old side is empty).
    pub old_start: usize,
    pub old_count: usize,
    /// First new line covered (1-based; 0 when the new side is empty).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

fn as_text(content: &[u8]) -> Option<&str> {
    if content.contains(&0) {
        return None;
    }
    std::str::from_utf8(content).ok()
}

/// Compute a line-by-line diff between two contents.
pub fn diff_blobs(old: &[u8], new: &[u8]) -> BlobDiff {
    let (Some(old_text), Some(new_text)) = (as_text(old), as_text(new)) else {
        return BlobDiff {
            hunks: Vec::new(),
            binary: old != new,
        };
    };

    let text_diff = TextDiff::from_lines(old_text, new_text);
    let mut hunks = Vec::new();
    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches(['\n', '\r']).to_string();
                lines.push(match change.tag() {
                    ChangeTag::Equal => DiffLine::Context(text),
                    ChangeTag::Delete => DiffLine::Removed(text),
                    ChangeTag::Insert => DiffLine::Added(text),
                });
            }
        }

        hunks.push(DiffHunk {
            old_start: start_line(&old_range),
            old_count: old_range.len(),
            new_start: start_line(&new_range),
            new_count: new_range.len(),
            lines,
        });
    }

    BlobDiff {
        hunks,
        binary: false,
    }
}

fn start_line(range: &std::ops::Range<usize>) -> usize {
    if range.is_empty() {
        range.start
    } else {
        range.start + 1
    }
}
