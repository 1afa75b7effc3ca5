//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::{glob, Pattern};
use tracing::{debug, warn};

use errfold_core::{render_collapsed, BlockDescriptor, BlockScanner, Settings};

/// Output format for scan reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "errfold")]
#[command(author, version, about = "Find foldable Go error-handling blocks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report foldable `if err != nil` blocks in files or directories
    Scan {
        /// Go files, or directories searched recursively for *.go
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Error-variable fragment, replaces the configured set (repeatable)
        #[arg(short = 'e', long = "error-var")]
        error_vars: Vec<String>,
    },

    /// Print a file with every foldable block collapsed to one line
    Render {
        /// Input Go file
        input: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Error-variable fragment, replaces the configured set (repeatable)
        #[arg(short = 'e', long = "error-var")]
        error_vars: Vec<String>,
    },
}

/// Foldable blocks found in one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub blocks: Vec<BlockDescriptor>,
}

/// Run the CLI
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            format,
            config,
            error_vars,
        } => {
            scan_command(&paths, format, config.as_deref(), &error_vars)?;
        }
        Commands::Render {
            input,
            config,
            error_vars,
        } => {
            render_command(&input, config.as_deref(), &error_vars)?;
        }
    }

    Ok(())
}

/// Scan files and print a report
pub fn scan_command(
    paths: &[PathBuf],
    format: OutputFormat,
    config_path: Option<&Path>,
    error_vars: &[String],
) -> Result<()> {
    let settings = load_settings(config_path, error_vars)?;
    let scanner = build_scanner(&settings)?;

    let files = collect_go_files(paths)?;
    let reports = scan_files(&files, &scanner)?;

    print!("{}", format_reports(&reports, format)?);
    Ok(())
}

/// Print a file with its blocks collapsed
pub fn render_command(
    input: &Path,
    config_path: Option<&Path>,
    error_vars: &[String],
) -> Result<()> {
    let settings = load_settings(config_path, error_vars)?;
    let scanner = build_scanner(&settings)?;

    print!("{}", render_file(input, &scanner)?);
    Ok(())
}

/// Read `input` and render it with every foldable block collapsed
pub fn render_file(input: &Path, scanner: &BlockScanner) -> Result<String> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let lines: Vec<&str> = content.lines().collect();
    let blocks = scanner.scan(&lines);

    Ok(render_collapsed(&lines, &blocks))
}

/// Scan each file, in order
pub fn scan_files(files: &[PathBuf], scanner: &BlockScanner) -> Result<Vec<FileReport>> {
    files
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            let blocks = scanner.scan_text(&content);
            debug!("{}: {} foldable blocks", path.display(), blocks.len());
            Ok(FileReport {
                path: path.clone(),
                blocks,
            })
        })
        .collect()
}

/// Render scan reports in the requested format
pub fn format_reports(reports: &[FileReport], format: OutputFormat) -> Result<String> {
    let total: usize = reports.iter().map(|r| r.blocks.len()).sum();

    match format {
        OutputFormat::Json => {
            let value: Vec<serde_json::Value> = reports
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "file": r.path.display().to_string(),
                        "blocks": r.blocks,
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&value)
                .context("Failed to serialize blocks to JSON")?;
            Ok(format!("{}\n", json))
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for report in reports {
                for block in &report.blocks {
                    // Editors count lines from 1
                    out.push_str(&format!(
                        "{}:{}-{}  {}\n",
                        report.path.display(),
                        block.start_line + 1,
                        block.end_line + 1,
                        block.collapsed_text
                    ));
                }
            }
            out.push_str(&format!(
                "Found {} foldable block{} in {} file{}\n",
                total,
                if total == 1 { "" } else { "s" },
                reports.len(),
                if reports.len() == 1 { "" } else { "s" }
            ));
            Ok(out)
        }
    }
}

/// Expand inputs to a sorted, de-duplicated list of Go files
pub fn collect_go_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            // Directory names may contain glob metacharacters
            let pattern = format!("{}/**/*.go", Pattern::escape(&path.display().to_string()));
            for entry in
                glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?
            {
                match entry {
                    Ok(file) => files.push(file),
                    Err(e) => warn!("Could not read {}", e),
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Input not found: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Load settings from a config file, the current directory, or defaults,
/// then apply command-line fragment overrides
pub fn load_settings(config_path: Option<&Path>, error_vars: &[String]) -> Result<Settings> {
    let mut settings = match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Settings::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => Settings::discover(Path::new("."))
            .context("Failed to load config from the current directory")?
            .unwrap_or_default(),
    };

    if !error_vars.is_empty() {
        settings.detection.error_variables = error_vars.to_vec();
    }

    Ok(settings)
}

fn build_scanner(settings: &Settings) -> Result<BlockScanner> {
    BlockScanner::from_settings(settings).context("Invalid error-variable fragments")
}
