//! Page storage: the Notion side of the pipeline.
//!
//! The rest of the crate talks to Notion only through [`PageStore`], which
//! exposes the two operations the buddy needs: list the first page of a
//! block's children, and append one block. [`NotionClient`] implements it
//! over the REST API; tests substitute an in-memory store.

mod blocks;
mod client;

pub use blocks::{AppendBlock, ContentBlock};
pub use client::NotionClient;

use crate::error::StoreError;
use async_trait::async_trait;

/// Read/append access to a page's child blocks.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// First page of child blocks of `page_id`. Further pages are ignored.
    async fn list_children(&self, page_id: &str) -> Result<Vec<ContentBlock>, StoreError>;

    /// Append a single block at the end of `page_id`.
    async fn append_block(&self, page_id: &str, block: &AppendBlock) -> Result<(), StoreError>;
}
