//! Body classification
//!
//! Decides whether a guard block body is a "simple" error-handling body:
//! one to three non-comment lines, each on its own a return, a logging
//! call, a panic or a process exit, with at most one return.

use regex::Regex;
use std::sync::OnceLock;

use super::block::normalize_whitespace;

/// Most qualifying lines a simple body may contain
pub const MAX_SIMPLE_LINES: usize = 3;

/// Shape of a statement accepted in a simple body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `return`, `return err`, `return nil, err`
    Return,
    /// `log.Fatal(..)`, `fmt.Println(..)`, `logger.Errorf(..)`, `println(..)`
    Log,
    /// `panic(..)`
    Panic,
    /// `os.Exit(..)`, `syscall.Exit(..)`, `runtime.Goexit()`
    Exit,
}

impl StatementKind {
    /// Classify one body line, `None` if it has no accepted shape
    pub fn of(statement: &str) -> Option<Self> {
        static RETURN_RE: OnceLock<Regex> = OnceLock::new();
        static LOG_RE: OnceLock<Regex> = OnceLock::new();
        static PANIC_RE: OnceLock<Regex> = OnceLock::new();
        static EXIT_RE: OnceLock<Regex> = OnceLock::new();

        let return_re = RETURN_RE.get_or_init(|| Regex::new(r"(?i)^return(?:[\s(]|$)").unwrap());

        let log_re = LOG_RE.get_or_init(|| {
            // Namespaced logger calls plus the print builtins
            Regex::new(
                r"(?i)^(?:(?:\w+\.)+(?:fatal|panic|error|warn|info|debug|trace|print|fprint)\w*|print(?:ln)?)\s*\(",
            )
            .unwrap()
        });

        let panic_re = PANIC_RE.get_or_init(|| Regex::new(r"(?i)^panic\s*\(").unwrap());

        let exit_re = EXIT_RE.get_or_init(|| {
            Regex::new(r"(?i)^(?:os\.exit|syscall\.exit|runtime\.goexit)\s*\(").unwrap()
        });

        let trimmed = statement.trim();

        if return_re.is_match(trimmed) {
            Some(Self::Return)
        } else if panic_re.is_match(trimmed) {
            Some(Self::Panic)
        } else if exit_re.is_match(trimmed) {
            Some(Self::Exit)
        } else if log_re.is_match(trimmed) {
            Some(Self::Log)
        } else {
            None
        }
    }
}

/// Classify a block body.
///
/// Every qualifying line is checked on its own. Returns the normalized lines
/// when the body is simple, and `None` otherwise.
pub fn classify_body<S: AsRef<str>>(body: &[S]) -> Option<Vec<String>> {
    let lines = qualifying_lines(body);

    if lines.is_empty() || lines.len() > MAX_SIMPLE_LINES {
        return None;
    }

    let mut returns = 0;
    for line in &lines {
        match StatementKind::of(line)? {
            StatementKind::Return => returns += 1,
            StatementKind::Log | StatementKind::Panic | StatementKind::Exit => {}
        }
    }

    (returns <= 1).then_some(lines)
}

/// Body lines left after dropping blank and comment-only lines.
///
/// Block comments are cut out of the lines they touch, whitespace is
/// collapsed. A line continuing a wrapped call stays a line of its own.
pub fn qualifying_lines<S: AsRef<str>>(body: &[S]) -> Vec<String> {
    let mut comments = CommentState::default();
    body.iter()
        .filter_map(|line| comments.code_of(line.as_ref()))
        .collect()
}

/// Tracks `/* ... */` comments spanning several lines
#[derive(Debug, Default)]
struct CommentState {
    in_block: bool,
}

impl CommentState {
    /// Code content of `line`, or `None` for blank and comment-only lines
    fn code_of(&mut self, line: &str) -> Option<String> {
        let mut code = String::new();
        let mut rest = line;

        loop {
            if self.in_block {
                let Some(end) = rest.find("*/") else {
                    break;
                };
                self.in_block = false;
                rest = &rest[end + 2..];
                code.push(' ');
            } else {
                match block_comment_start(rest) {
                    Some(start) => {
                        code.push_str(&rest[..start]);
                        self.in_block = true;
                        rest = &rest[start + 2..];
                    }
                    None => {
                        code.push_str(rest);
                        break;
                    }
                }
            }
        }

        let code = normalize_whitespace(&code);
        if code.is_empty() || code.starts_with("//") {
            None
        } else {
            Some(code)
        }
    }
}

/// Byte offset of a `/*` that opens a comment, skipping string and rune
/// literals. A `//` hides the rest of the line.
fn block_comment_start(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' && q != '`' {
                    chars.next();
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' | '`' => quote = Some(ch),
                '/' => match chars.peek() {
                    Some((_, '*')) => return Some(pos),
                    Some((_, '/')) => return None,
                    _ => {}
                },
                _ => {}
            },
        }
    }

    None
}
