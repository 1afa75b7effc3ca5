//! errfold-core - foldable Go error-handling guard detection
//!
//! Finds `if err != nil { ... }` guard blocks in source text, decides which
//! ones are simple enough to collapse, and keeps per-document results
//! cached so editors can ask on every keystroke:
//! - Brace-depth block matching with a multi-rule body classifier
//! - Configurable error-variable fragments (`err`, `error` by default)
//! - Version/TTL keyed result cache with per-document debounced rescans
//! - Adapters to LSP folding ranges, decorations and a collapsed rendering
//!
//! # Example
//!
//! ```
//! use errfold_core::BlockScanner;
//!
//! let scanner = BlockScanner::default();
//! let blocks = scanner.scan(&["if err != nil {", "    return err", "}"]);
//!
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].body_statement, "return err");
//! assert_eq!(blocks[0].collapsed_text, "if err != nil { return err }");
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod folding;
pub mod scanner;

// Re-export commonly used types
pub use cache::{BlockCache, Blocks};
pub use config::Settings;
pub use error::{ErrfoldError, Result};
pub use folding::{render_collapsed, to_decorations, to_folding_ranges, Decoration};
pub use scanner::{scan_lines, BlockDescriptor, BlockScanner, HeaderMatcher, LineRange};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
