//! Stage 1: refine raw notes into structured Markdown.

use super::llm::CompletionModel;
use super::{PipelineState, StatePatch};
use crate::error::{BuddyError, ModelStep};
use crate::prompts::refine_prompt;
use tracing::error;

/// Send `raw_notes` through the refinement prompt.
///
/// The response is stored as-is in `refined_notes`; no cleanup is applied.
pub async fn run(
    model: &dyn CompletionModel,
    state: &PipelineState,
) -> Result<StatePatch, BuddyError> {
    let refined = model
        .complete(&refine_prompt(&state.raw_notes))
        .await
        .map_err(|e| {
            error!("Error running agent (refine) for page {}: {}", state.page_id, e);
            BuddyError::ModelFailure {
                step: ModelStep::Refine,
                source: e,
            }
        })?;

    Ok(StatePatch {
        refined_notes: Some(refined),
        ..Default::default()
    })
}
