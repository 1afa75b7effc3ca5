//! Block descriptors produced by the scanner

use serde::{Deserialize, Serialize};

/// Default maximum number of body characters shown in `collapsed_text`
pub const DEFAULT_PREVIEW_CHARS: usize = 50;

/// Marker appended to a truncated preview
pub const ELLIPSIS: &str = "...";

/// Inclusive span of 0-based line indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    /// Number of lines covered (always at least one)
    pub fn line_count(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// One detected foldable guard block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    /// Line holding `if err != nil {`
    pub start_line: usize,
    /// Line holding the matching closing brace
    pub end_line: usize,
    /// First line of the body
    pub body_start_line: usize,
    /// Leading whitespace of the header, reproduced exactly by the closer
    pub indentation: String,
    /// Normalized condition, e.g. `err != nil`
    pub condition: String,
    /// All body statements on one line, whitespace collapsed
    pub body_statement: String,
    /// One-line preview shown in place of the folded block
    pub collapsed_text: String,
    /// `[start_line, end_line]`
    pub full_range: LineRange,
}

impl BlockDescriptor {
    pub(crate) fn new(
        start_line: usize,
        end_line: usize,
        indentation: &str,
        condition: String,
        body_statement: String,
        preview_chars: usize,
    ) -> Self {
        let collapsed_text = collapsed_text(&condition, &body_statement, preview_chars);
        Self {
            start_line,
            end_line,
            body_start_line: start_line + 1,
            indentation: indentation.to_string(),
            condition,
            body_statement,
            collapsed_text,
            full_range: LineRange::new(start_line, end_line),
        }
    }

    /// Number of lines hidden when the block is folded onto its header
    pub fn hidden_lines(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, appending [`ELLIPSIS`] when
/// anything was removed. Counts chars, not bytes.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Build the folded one-liner: `if err != nil { return err }`
pub fn collapsed_text(condition: &str, body_statement: &str, max_chars: usize) -> String {
    format!(
        "if {} {{ {} }}",
        condition,
        truncate_preview(body_statement, max_chars)
    )
}
