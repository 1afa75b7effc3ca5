//! Guard block scanner
//!
//! Walks source lines top to bottom looking for `if err != nil {` headers,
//! matches each one to its closing brace by counting brace depth, and keeps
//! the blocks whose body is simple enough to fold.
//!
//! - `header`: configuration-driven header predicate
//! - `classify`: simple-body rules
//! - `block`: the descriptors handed to collaborators

pub mod block;
pub mod classify;
pub mod header;

pub use block::{BlockDescriptor, LineRange, DEFAULT_PREVIEW_CHARS, ELLIPSIS};
pub use classify::{classify_body, StatementKind};
pub use header::{HeaderMatch, HeaderMatcher};

use tracing::trace;

use crate::config::Settings;
use crate::error::Result;

/// Scanner for foldable guard blocks
///
/// Holds the compiled header matcher so configuration parsing stays out of
/// the per-scan path. Scanning is pure and never fails.
#[derive(Debug, Clone)]
pub struct BlockScanner {
    matcher: HeaderMatcher,
    preview_chars: usize,
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ERROR_VARIABLES)
            .unwrap_or_else(|_| Self::from_matcher(HeaderMatcher::never()))
    }
}

/// How the walk from a header ended
#[derive(Debug, PartialEq, Eq)]
enum Closer<'a> {
    /// Depth reached zero at `line`, aligned with the header
    Found { line: usize, trailing: &'a str },
    /// Depth reached zero at a line with different indentation
    Misaligned(usize),
    /// End of input before depth reached zero
    Unterminated,
}

impl BlockScanner {
    /// Build a scanner for the given error-variable fragments
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::from_matcher(HeaderMatcher::new(fragments)?))
    }

    /// Build a scanner from a precompiled matcher
    pub fn from_matcher(matcher: HeaderMatcher) -> Self {
        Self {
            matcher,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Build a scanner from loaded settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(&settings.detection.error_variables)?
            .with_preview_chars(settings.display.max_preview_chars))
    }

    /// Set the preview length used for `collapsed_text`
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn matcher(&self) -> &HeaderMatcher {
        &self.matcher
    }

    pub fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    /// Scan a whole document split on newlines
    pub fn scan_text(&self, text: &str) -> Vec<BlockDescriptor> {
        let lines: Vec<&str> = text.lines().collect();
        self.scan(&lines)
    }

    /// Scan ordered source lines for foldable guard blocks.
    ///
    /// Descriptors come back in ascending `start_line` order and never
    /// overlap.
    pub fn scan<S: AsRef<str>>(&self, lines: &[S]) -> Vec<BlockDescriptor> {
        let mut blocks = Vec::new();
        let mut cursor = 0;

        while cursor < lines.len() {
            let Some(header) = self.matcher.match_line(lines[cursor].as_ref()) else {
                cursor += 1;
                continue;
            };

            let (end, trailing) = match find_closer(lines, cursor, header.indentation) {
                Closer::Found { line, trailing } => (line, trailing),
                Closer::Misaligned(line) => {
                    trace!("Header at {} closes misaligned at {}", cursor, line);
                    cursor += 1;
                    continue;
                }
                Closer::Unterminated => {
                    trace!("Header at {} never closes", cursor);
                    cursor += 1;
                    continue;
                }
            };

            if else_follows(trailing, lines.get(end + 1).map(|next| next.as_ref())) {
                trace!("Header at {} has an else branch", cursor);
                cursor += 1;
                continue;
            }

            match classify_body(&lines[cursor + 1..end]) {
                Some(lines) => {
                    blocks.push(BlockDescriptor::new(
                        cursor,
                        end,
                        header.indentation,
                        header.condition(),
                        lines.join("; "),
                        self.preview_chars,
                    ));
                }
                None => trace!("Block {}..={} is not a simple body", cursor, end),
            }

            cursor = end + 1;
        }

        blocks
    }
}

/// Scan `lines` with a one-off scanner built from `fragments`.
///
/// A fragment set that fails to compile detects nothing.
pub fn scan_lines<S, I, F>(lines: &[S], fragments: I) -> Vec<BlockDescriptor>
where
    S: AsRef<str>,
    I: IntoIterator<Item = F>,
    F: AsRef<str>,
{
    BlockScanner::new(fragments)
        .map(|scanner| scanner.scan(lines))
        .unwrap_or_default()
}

/// Walk forward from the header counting braces until depth returns to zero
fn find_closer<'a, S: AsRef<str>>(lines: &'a [S], header: usize, indentation: &str) -> Closer<'a> {
    let mut depth: usize = 1;

    for (index, line) in lines.iter().enumerate().skip(header + 1) {
        let line = line.as_ref();
        for (pos, ch) in line.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return if &line[..pos] == indentation {
                            Closer::Found {
                                line: index,
                                trailing: &line[pos + 1..],
                            }
                        } else {
                            Closer::Misaligned(index)
                        };
                    }
                }
                _ => {}
            }
        }
    }

    Closer::Unterminated
}

/// `} else {` on the closing line, or `else` opening the next line
fn else_follows(trailing: &str, next_line: Option<&str>) -> bool {
    starts_with_else(trailing) || next_line.is_some_and(starts_with_else)
}

fn starts_with_else(text: &str) -> bool {
    text.trim_start()
        .strip_prefix("else")
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}
