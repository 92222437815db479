//! The three operations every surface exposes.
//!
//! [`ResearchBuddy`] owns the page store and the model and implements
//! `process`, `read` and `combine`. It returns structured results; the
//! surfaces (MCP, HTTP, CLI) turn them into strings with [`render`] and
//! classify them with [`is_error_message`].
//!
//! A `ResearchBuddy` holds no per-request state, so one instance behind an
//! `Arc` serves any number of concurrent requests. Nothing serialises
//! requests for the same page: two concurrent `process` calls on one page
//! may interleave their appends.

use crate::config::BuddyConfig;
use crate::error::BuddyError;
use crate::extract::{read_page_content, read_raw_notes};
use crate::merge::{combine_diagrams, DiagramInput};
use crate::notion::{NotionClient, PageStore};
use crate::pipeline::llm::{resolve_model, CompletionModel};
use crate::pipeline::{run_pipeline, PipelineState};
use crate::progress::ProgressCallback;
use crate::writeback;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Status string returned by a successful `process`.
pub const PROCESS_SUCCESS: &str = "✅ Page refined and diagram added!";

/// Page store + model, shared by every surface.
#[derive(Clone)]
pub struct ResearchBuddy {
    store: Arc<dyn PageStore>,
    model: Arc<dyn CompletionModel>,
    progress: Option<ProgressCallback>,
}

impl ResearchBuddy {
    /// Assemble a buddy from explicit parts.
    pub fn new(store: Arc<dyn PageStore>, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            store,
            model,
            progress: None,
        }
    }

    /// Build the Notion client and resolve the model described by `config`.
    ///
    /// Missing credentials do not fail here; they are logged and the
    /// affected operations fail when called.
    pub fn from_config(config: &BuddyConfig) -> Result<Self, BuddyError> {
        config.warn_missing_credentials();
        let store = NotionClient::new(config)
            .map_err(|e| BuddyError::InvalidConfig(format!("Notion client: {e}")))?;
        Ok(Self {
            store: Arc::new(store),
            model: resolve_model(config),
            progress: config.progress_callback.clone(),
        })
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Read, refine, diagram and write back `page_id`, returning the final state.
    pub async fn process_page(&self, page_id: &str) -> Result<PipelineState, BuddyError> {
        let start = Instant::now();
        info!("Processing page: {}", page_id);

        let raw_notes = read_raw_notes(self.store.as_ref(), page_id).await?;
        info!("Extracted {} characters from page", raw_notes.chars().count());
        if let Some(ref cb) = self.progress {
            cb.on_extracted(page_id, raw_notes.chars().count());
        }

        let state = run_pipeline(
            self.model.as_ref(),
            PipelineState::new(page_id, raw_notes),
            self.progress.as_ref(),
        )
        .await?;

        let blocks = writeback::compose(&state);
        writeback::append_all(self.store.as_ref(), page_id, &blocks, self.progress.as_ref())
            .await?;

        if let Some(ref cb) = self.progress {
            cb.on_process_complete(page_id);
        }
        info!(
            "Processed page {} in {}ms",
            page_id,
            start.elapsed().as_millis()
        );
        Ok(state)
    }

    /// `process` operation: returns the success status string.
    pub async fn process(&self, page_id: &str) -> Result<String, BuddyError> {
        self.process_page(page_id).await?;
        Ok(PROCESS_SUCCESS.to_string())
    }

    /// `read` operation: annotated text of the page.
    pub async fn read(&self, page_id: &str) -> Result<String, BuddyError> {
        info!("Reading page: {}", page_id);
        read_page_content(self.store.as_ref(), page_id).await
    }

    /// `combine` operation: merge diagrams into one.
    pub async fn combine(
        &self,
        diagrams: &[DiagramInput],
        title: &str,
    ) -> Result<String, BuddyError> {
        combine_diagrams(self.model.as_ref(), diagrams, title).await
    }
}

/// Render an operation result as the string the surfaces return.
///
/// Successes and warnings render as their text, failures as their
/// `Error …` message.
pub fn render(result: Result<String, BuddyError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => e.to_string(),
    }
}

/// Whether a rendered result reports a failure.
pub fn is_error_message(rendered: &str) -> bool {
    rendered.starts_with("Error")
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use crate::error::ModelError;
    use crate::notion::{AppendBlock, ContentBlock};
    use crate::pipeline::testing::ScriptedModel;

    fn buddy(store: Arc<MemoryStore>, model: Arc<ScriptedModel>) -> ResearchBuddy {
        ResearchBuddy::new(store, model)
    }

    #[tokio::test]
    async fn process_writes_five_blocks() {
        let store = Arc::new(MemoryStore::with_blocks(vec![
            ContentBlock::paragraph("Hello"),
            ContentBlock::paragraph("World"),
        ]));
        let model = Arc::new(ScriptedModel::replying(&["# Hello World", "graph TD; Hello-->World"]));

        let result = buddy(store.clone(), model.clone()).process("page").await;
        assert_eq!(result.unwrap(), PROCESS_SUCCESS);

        assert!(model.prompts.lock().unwrap()[0].contains("Hello\nWorld"));
        let kinds: Vec<_> = store.appended().iter().map(AppendBlock::kind).collect();
        assert_eq!(kinds, ["divider", "heading_2", "paragraph", "heading_2", "code"]);
    }

    #[tokio::test]
    async fn empty_page_short_circuits() {
        let store = Arc::new(MemoryStore::default());
        let model = Arc::new(ScriptedModel::default());

        let rendered = render(buddy(store.clone(), model.clone()).process("page").await);
        assert_eq!(rendered, "⚠️ Page is empty or contains no paragraph text.");
        assert!(!is_error_message(&rendered));
        assert_eq!(model.calls(), 0);
        assert!(store.appended().is_empty());
    }

    #[tokio::test]
    async fn whitespace_only_page_is_empty() {
        let store = Arc::new(MemoryStore::with_blocks(vec![ContentBlock::paragraph("   ")]));
        let model = Arc::new(ScriptedModel::default());
        let err = buddy(store, model.clone()).process("page").await.unwrap_err();
        assert!(err.is_warning());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn read_failure_stops_before_model() {
        let store = Arc::new(MemoryStore {
            fail_read: true,
            ..Default::default()
        });
        let model = Arc::new(ScriptedModel::default());
        let rendered = render(buddy(store, model.clone()).process("page").await);
        assert!(rendered.starts_with("Error reading Notion: "), "{rendered}");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn model_failure_writes_nothing() {
        let store = Arc::new(MemoryStore::with_blocks(vec![ContentBlock::paragraph("x")]));
        let model = Arc::new(ScriptedModel::new(vec![Err(ModelError::Provider("bad key".into()))]));
        let rendered = render(buddy(store.clone(), model).process("page").await);
        assert_eq!(rendered, "Error running agent: bad key");
        assert!(store.appended().is_empty());
    }

    #[tokio::test]
    async fn write_failure_keeps_earlier_blocks() {
        let store = Arc::new(MemoryStore {
            blocks: vec![ContentBlock::paragraph("x")],
            fail_append_at: Some(2),
            ..Default::default()
        });
        let model = Arc::new(ScriptedModel::replying(&["refined", "graph TD; a-->b"]));
        let err = buddy(store.clone(), model).process("page").await.unwrap_err();

        assert!(matches!(err, BuddyError::WriteFailure { appended: 2, .. }));
        assert!(err.to_string().starts_with("Error writing to Notion: "));
        assert_eq!(store.appended().len(), 2);
    }

    #[tokio::test]
    async fn read_renders_rich_text() {
        let store = Arc::new(MemoryStore::with_blocks(vec![
            ContentBlock::heading(1, "Title"),
            ContentBlock::bulleted("point"),
        ]));
        let model = Arc::new(ScriptedModel::default());
        let text = buddy(store, model).read("page").await.unwrap();
        assert_eq!(text, "\n# Title\n\n• point");
    }

    #[tokio::test]
    async fn read_of_unrecognised_blocks_is_a_warning() {
        let store = Arc::new(MemoryStore::with_blocks(vec![ContentBlock::Other {
            kind: "image".into(),
        }]));
        let model = Arc::new(ScriptedModel::default());
        assert_eq!(
            render(buddy(store, model).read("page").await),
            "⚠️ Page is empty."
        );
    }

    #[test]
    fn error_detection_is_prefix_based() {
        assert!(is_error_message("Error reading Notion: x"));
        assert!(!is_error_message("⚠️ Page is empty."));
        assert!(!is_error_message("graph TD; Error-->Recovery"));
    }
}
