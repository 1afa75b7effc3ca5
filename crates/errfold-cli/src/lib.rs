//! errfold CLI - command-line interface library
//!
//! This library provides the CLI functionality for errfold:
//! - Scan: report foldable `if err != nil` blocks in Go sources
//! - Render: print a file with those blocks collapsed
//!
//! # Binary Usage
//!
//! ```bash
//! # Report blocks under the current directory
//! errfold scan
//!
//! # JSON for tooling, with an extra error-variable fragment
//! errfold scan ./pkg --format json -e err -e fail
//!
//! # Preview the folded view of a file
//! errfold render main.go
//!
//! # With debug logging
//! RUST_LOG=debug errfold scan
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    collect_go_files, format_reports, load_settings, render_command, render_file, run_cli,
    scan_command, scan_files, FileReport, OutputFormat,
};
