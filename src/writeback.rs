//! Write the pipeline result back to the page.
//!
//! The composer produces a fixed block sequence:
//!
//! ```text
//! divider
//! heading_2  "✨ Refined Notes"
//! paragraph  refined notes, first 2000 characters   (if any)
//! heading_2  "📊 Architecture Diagram"
//! code       mermaid, full diagram                  (if any)
//! ```
//!
//! Notion caps a rich-text item at 2000 characters, so the refined notes are
//! cut there; the overflow is dropped, not split into more blocks. Each block
//! is a separate append call with no transaction around them: when call N
//! fails, blocks 1..N-1 stay on the page.

use crate::error::BuddyError;
use crate::notion::{AppendBlock, PageStore};
use crate::pipeline::PipelineState;
use crate::progress::ProgressCallback;
use tracing::{error, info};

/// Maximum characters Notion accepts in one rich-text item.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;

pub const REFINED_HEADING: &str = "✨ Refined Notes";
pub const DIAGRAM_HEADING: &str = "📊 Architecture Diagram";
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// First `max_chars` characters of `text` (Unicode scalar values).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Blocks to append for `state`, in order.
pub fn compose(state: &PipelineState) -> Vec<AppendBlock> {
    let mut blocks = vec![
        AppendBlock::Divider,
        AppendBlock::Heading2(REFINED_HEADING.to_string()),
    ];

    if let Some(refined) = state.refined_notes.as_deref().filter(|s| !s.is_empty()) {
        blocks.push(AppendBlock::Paragraph(
            truncate_chars(refined, MAX_RICH_TEXT_CHARS).to_string(),
        ));
    }

    blocks.push(AppendBlock::Heading2(DIAGRAM_HEADING.to_string()));

    if let Some(code) = state.diagram_code.as_deref().filter(|s| !s.is_empty()) {
        blocks.push(AppendBlock::Code {
            language: DIAGRAM_LANGUAGE.to_string(),
            text: code.to_string(),
        });
    }

    blocks
}

/// Append `blocks` to `page_id` one call at a time, stopping at the first failure.
pub async fn append_all(
    store: &dyn PageStore,
    page_id: &str,
    blocks: &[AppendBlock],
    progress: Option<&ProgressCallback>,
) -> Result<(), BuddyError> {
    let total = blocks.len();
    for (i, block) in blocks.iter().enumerate() {
        if let Err(e) = store.append_block(page_id, block).await {
            error!(
                "Error writing to Notion page {} ({} block, {}/{} appended): {}",
                page_id,
                block.kind(),
                i,
                total,
                e
            );
            return Err(BuddyError::WriteFailure {
                page_id: page_id.to_string(),
                appended: i,
                source: e,
            });
        }
        if let Some(cb) = progress {
            cb.on_block_appended(i + 1, total);
        }
    }
    info!("Successfully updated Notion page {}", page_id);
    Ok(())
}
