//! The refine-then-diagram pipeline.
//!
//! A strict two-stage linear state machine:
//!
//! ```text
//! Start ──refine──▶ Refined ──diagram──▶ Diagrammed ──▶ Done
//! ```
//!
//! Each step receives a read-only snapshot of [`PipelineState`] and returns a
//! [`StatePatch`] holding only the fields it produced; [`run_pipeline`] merges
//! the patch before moving on. There is no branching, skipping, retry or
//! rollback: stage 2 always runs once stage 1 succeeds, and a failure in
//! either stage ends the run with the error.
//!
//! 1. [`refine`]     : raw notes → structured Markdown
//! 2. [`diagram`]    : notes → Mermaid code
//! 3. [`llm`]        : the completion seam both steps call
//! 4. [`postprocess`]: fence cleanup for model-produced Mermaid

pub mod diagram;
pub mod llm;
pub mod postprocess;
pub mod refine;

use crate::error::BuddyError;
use crate::progress::ProgressCallback;
use llm::CompletionModel;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-invocation record the pipeline builds up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub page_id: String,
    pub raw_notes: String,
    pub refined_notes: Option<String>,
    pub diagram_code: Option<String>,
}

impl PipelineState {
    pub fn new(page_id: impl Into<String>, raw_notes: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            raw_notes: raw_notes.into(),
            refined_notes: None,
            diagram_code: None,
        }
    }

    /// Merge a step's output. Fields the patch leaves `None` are kept, so a
    /// field once set is never cleared.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(refined) = patch.refined_notes {
            self.refined_notes = Some(refined);
        }
        if let Some(code) = patch.diagram_code {
            self.diagram_code = Some(code);
        }
    }
}

/// The fields a single step produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub refined_notes: Option<String>,
    pub diagram_code: Option<String>,
}

/// Position of the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Refined,
    Diagrammed,
    Done,
}

impl Stage {
    /// The stage that follows `self`; `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::Start => Stage::Refined,
            Stage::Refined => Stage::Diagrammed,
            Stage::Diagrammed | Stage::Done => Stage::Done,
        }
    }
}

/// Run refinement then diagram generation over `state`.
///
/// Returns the final state on success. On failure the partially built state
/// is dropped; callers must not write anything back.
pub async fn run_pipeline(
    model: &dyn CompletionModel,
    mut state: PipelineState,
    progress: Option<&ProgressCallback>,
) -> Result<PipelineState, BuddyError> {
    let mut stage = Stage::Start;

    while stage != Stage::Done {
        let target = stage.next();
        if let Some(cb) = progress {
            cb.on_stage_start(target);
        }

        match stage {
            Stage::Start => {
                info!("Refiner: cleaning notes for page {}", state.page_id);
                let patch = refine::run(model, &state).await?;
                state.apply(patch);
            }
            Stage::Refined => {
                info!("Architect: generating diagram for page {}", state.page_id);
                let patch = diagram::run(model, &state).await?;
                state.apply(patch);
            }
            Stage::Diagrammed | Stage::Done => {}
        }

        stage = target;
        if let Some(cb) = progress {
            cb.on_stage_complete(stage);
        }
    }

    Ok(state)
}
