//! Combine several Mermaid diagrams into one.
//!
//! Independent of the page pipeline and stateless. Zero diagrams is a
//! warning and a single diagram is returned untouched; the model is only
//! called when there is actually something to merge.

use crate::error::{BuddyError, EmptySource, ModelStep};
use crate::pipeline::llm::CompletionModel;
use crate::pipeline::postprocess::strip_code_fences;
use crate::prompts::merge_prompt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Title used when the caller does not supply one.
pub const DEFAULT_TITLE: &str = "Unified Architecture";

/// One labelled diagram to merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramInput {
    /// Name of the system the diagram describes (e.g. "PersonaPlex").
    pub label: String,
    /// Raw Mermaid code.
    #[serde(rename = "mermaid_code", alias = "diagram_code")]
    pub diagram_code: String,
}

impl DiagramInput {
    pub fn new(label: impl Into<String>, diagram_code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            diagram_code: diagram_code.into(),
        }
    }
}

/// Request body for a merge: the diagrams plus an optional title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineRequest {
    pub diagrams: Vec<DiagramInput>,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Merge `diagrams` into one diagram titled `title`.
pub async fn combine_diagrams(
    model: &dyn CompletionModel,
    diagrams: &[DiagramInput],
    title: &str,
) -> Result<String, BuddyError> {
    info!("Combining {} diagrams...", diagrams.len());

    match diagrams {
        [] => Err(BuddyError::EmptyContent(EmptySource::Diagrams)),
        [only] => Ok(only.diagram_code.clone()),
        _ => {
            let response = model
                .complete(&merge_prompt(diagrams, title))
                .await
                .map_err(|e| {
                    error!("Error combining diagrams: {}", e);
                    BuddyError::ModelFailure {
                        step: ModelStep::Merge,
                        source: e,
                    }
                })?;
            info!("Successfully combined diagrams");
            Ok(strip_code_fences(&response))
        }
    }
}
