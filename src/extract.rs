//! Content extraction: flatten a page's blocks into text.
//!
//! Two renderings exist:
//!
//! * [`paragraph_text`]: paragraph blocks only. This is what the pipeline
//!   refines; headings and bullets are left for the model to infer.
//! * [`annotated_text`]: paragraphs, `#`-prefixed headings and `•`
//!   bullets, for inspecting a page before processing it.
//!
//! Both join the runs of one block into one line and the lines with `\n`.
//! Blocks without any text run are skipped.

use crate::error::{BuddyError, EmptySource};
use crate::notion::{ContentBlock, PageStore};
use tracing::{debug, error};

/// Render paragraph blocks, one line per block.
pub fn paragraph_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Paragraph { runs } if !runs.is_empty() => Some(runs.concat()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render paragraphs, headings and bulleted items. `None` when nothing
/// was rendered.
pub fn annotated_text(blocks: &[ContentBlock]) -> Option<String> {
    let lines: Vec<String> = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Paragraph { runs } if !runs.is_empty() => Some(runs.concat()),
            ContentBlock::Heading { level, runs } if !runs.is_empty() => Some(format!(
                "\n{} {}\n",
                "#".repeat(usize::from(*level)),
                runs.concat()
            )),
            ContentBlock::BulletedItem { runs } if !runs.is_empty() => {
                Some(format!("• {}", runs.concat()))
            }
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Fetch `page_id` and return its paragraph text, ready for the pipeline.
///
/// Whitespace-only text is reported as [`EmptySource::ParagraphText`], so a
/// successful return is never blank.
pub async fn read_raw_notes(store: &dyn PageStore, page_id: &str) -> Result<String, BuddyError> {
    let blocks = fetch(store, page_id).await?;
    let text = paragraph_text(&blocks);
    if text.trim().is_empty() {
        return Err(BuddyError::EmptyContent(EmptySource::ParagraphText));
    }
    debug!("Extracted {} characters from page {}", text.chars().count(), page_id);
    Ok(text)
}

/// Fetch `page_id` and return its annotated text.
pub async fn read_page_content(store: &dyn PageStore, page_id: &str) -> Result<String, BuddyError> {
    let blocks = fetch(store, page_id).await?;
    annotated_text(&blocks).ok_or(BuddyError::EmptyContent(EmptySource::Page))
}

async fn fetch(store: &dyn PageStore, page_id: &str) -> Result<Vec<ContentBlock>, BuddyError> {
    store.list_children(page_id).await.map_err(|e| {
        error!("Error reading Notion page {}: {}", page_id, e);
        BuddyError::ReadFailure {
            page_id: page_id.to_string(),
            source: e,
        }
    })
}
