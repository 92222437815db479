//! Stage 2: draw a Mermaid diagram of the notes.

use super::llm::CompletionModel;
use super::postprocess::strip_code_fences;
use super::{PipelineState, StatePatch};
use crate::error::{BuddyError, ModelStep};
use crate::prompts::diagram_prompt;
use tracing::error;

/// Text the diagram is drawn from: the refined notes when the first stage
/// produced any, otherwise the raw notes.
pub fn source_text(state: &PipelineState) -> &str {
    state
        .refined_notes
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&state.raw_notes)
}

/// Ask the model for a diagram and strip any fences it added.
pub async fn run(
    model: &dyn CompletionModel,
    state: &PipelineState,
) -> Result<StatePatch, BuddyError> {
    let response = model
        .complete(&diagram_prompt(source_text(state)))
        .await
        .map_err(|e| {
            error!("Error running agent (diagram) for page {}: {}", state.page_id, e);
            BuddyError::ModelFailure {
                step: ModelStep::Diagram,
                source: e,
            }
        })?;

    Ok(StatePatch {
        diagram_code: Some(strip_code_fences(&response)),
        ..Default::default()
    })
}
