//! Output adapters for folding and decoration collaborators
//!
//! Maps scan results onto what an editor needs:
//! - LSP folding ranges with a collapsed preview
//! - Dimmed ranges plus an inline summary anchored at the header line
//! - A plain-text rendering of the document with every block collapsed

use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};

use crate::scanner::{BlockDescriptor, LineRange};

/// Build LSP folding ranges, one per block
pub fn to_folding_ranges(blocks: &[BlockDescriptor]) -> Vec<FoldingRange> {
    blocks
        .iter()
        .map(|block| FoldingRange {
            start_line: block.start_line as u32,
            end_line: block.end_line as u32,
            kind: Some(FoldingRangeKind::Region),
            start_character: None,
            end_character: None,
            collapsed_text: Some(block.collapsed_text.clone()),
        })
        .collect()
}

/// Decoration for one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Lines to render dimmed
    pub dim_range: LineRange,
    /// Line the inline summary is attached to
    pub summary_line: usize,
    /// Inline summary text
    pub summary: String,
}

/// Build decorations, one per block
pub fn to_decorations(blocks: &[BlockDescriptor]) -> Vec<Decoration> {
    blocks
        .iter()
        .map(|block| Decoration {
            dim_range: block.full_range,
            summary_line: block.start_line,
            summary: block.collapsed_text.clone(),
        })
        .collect()
}

/// Render `lines` with each block replaced by its collapsed one-liner.
///
/// Blocks must be the scan result for these exact lines.
pub fn render_collapsed<S: AsRef<str>>(lines: &[S], blocks: &[BlockDescriptor]) -> String {
    let mut out = String::new();
    let mut blocks = blocks.iter().peekable();
    let mut index = 0;

    while index < lines.len() {
        match blocks.next_if(|block| block.start_line == index) {
            Some(block) => {
                out.push_str(&block.indentation);
                out.push_str(&block.collapsed_text);
                index = block.end_line + 1;
            }
            None => {
                out.push_str(lines[index].as_ref());
                index += 1;
            }
        }
        out.push('\n');
    }

    out
}
