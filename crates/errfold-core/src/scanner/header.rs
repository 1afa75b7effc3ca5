//! Guard header predicate
//!
//! Builds the `if <errVar> != nil {` matcher from the configured
//! error-variable fragments. The matcher is compiled once per fragment set
//! and reused across scans.

use regex::Regex;

use crate::error::Result;

/// A line recognised as a guard header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch<'a> {
    /// Literal leading whitespace of the header line
    pub indentation: &'a str,
    /// The error variable named in the condition (`err`, `someErr`, ...)
    pub variable: &'a str,
}

impl HeaderMatch<'_> {
    /// Normalized condition text, e.g. `err != nil`
    pub fn condition(&self) -> String {
        format!("{} != nil", self.variable)
    }
}

/// Compiled guard header predicate
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    pattern: Option<Regex>,
    fragments: Vec<String>,
}

impl HeaderMatcher {
    /// Compile a matcher for the given error-variable fragments.
    ///
    /// Fragments are matched case-insensitively as substrings of the
    /// condition variable, so `err` accepts `err`, `someErr` and
    /// `errWrapped`. Blank fragments are dropped; an empty set produces a
    /// matcher that never matches.
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments = normalize_fragments(fragments);
        if fragments.is_empty() {
            return Ok(Self::never());
        }

        let alternation = fragments
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(
            r"^(?P<indent>[ \t]*)if\s+(?P<var>\w*(?i:{alternation})\w*)\s*!=\s*nil\s*\{{\s*(?://.*)?$"
        ))?;

        Ok(Self {
            pattern: Some(pattern),
            fragments,
        })
    }

    /// A matcher that accepts no line at all
    pub fn never() -> Self {
        Self {
            pattern: None,
            fragments: Vec::new(),
        }
    }

    /// The normalized fragments this matcher was built from
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Whether rebuilding from `fragments` would produce the same matcher
    pub fn is_built_from<I, S>(&self, fragments: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        normalize_fragments(fragments) == self.fragments
    }

    /// Test a single line against the header shape
    pub fn match_line<'a>(&self, line: &'a str) -> Option<HeaderMatch<'a>> {
        let caps = self.pattern.as_ref()?.captures(line)?;
        Some(HeaderMatch {
            indentation: caps.name("indent")?.as_str(),
            variable: caps.name("var")?.as_str(),
        })
    }

    /// Shorthand for `match_line(..).is_some()`
    pub fn is_header(&self, line: &str) -> bool {
        self.match_line(line).is_some()
    }
}

/// Trim, drop blanks, sort and dedup so equal sets compare equal
fn normalize_fragments<I, S>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = fragments
        .into_iter()
        .map(|f| f.as_ref().trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    cleaned.sort();
    cleaned.dedup();
    cleaned
}
