//! Error types for the notion-research-buddy library.
//!
//! Three layers, from the outside in:
//!
//! * [`BuddyError`]: the closed set of outcomes an operation can end in
//!   other than success. Each remote boundary (Notion read, model call,
//!   Notion write) collapses every underlying cause into exactly one kind.
//!   [`BuddyError::EmptyContent`] is a warning, not a failure: the surfaces
//!   render it as a plain status string with a success code.
//!
//! * [`StoreError`]: why a Notion request failed (transport, HTTP status,
//!   decoding, missing credential). Wrapped into `ReadFailure`/`WriteFailure`.
//!
//! * [`ModelError`]: why a completion call failed. Wrapped into
//!   `ModelFailure`.
//!
//! Rendering to the user-facing string happens only at the outer surface
//! through `Display`; everything inside the crate passes the structured value.

use thiserror::Error;

/// Model-backed step that produced a [`BuddyError::ModelFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStep {
    /// Note refinement (pipeline stage 1).
    Refine,
    /// Diagram generation (pipeline stage 2).
    Diagram,
    /// Diagram merge (independent of the pipeline).
    Merge,
}

impl ModelStep {
    /// Action phrase used in the rendered error string.
    pub fn action(self) -> &'static str {
        match self {
            ModelStep::Refine | ModelStep::Diagram => "running agent",
            ModelStep::Merge => "combining diagrams",
        }
    }
}

/// What turned out to be empty when an operation found nothing to work on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySource {
    /// No paragraph text on the page (before running the pipeline).
    ParagraphText,
    /// No recognised blocks at all (page inspection).
    Page,
    /// The merge request carried no diagrams.
    Diagrams,
}

impl EmptySource {
    pub fn warning(self) -> &'static str {
        match self {
            EmptySource::ParagraphText => "⚠️ Page is empty or contains no paragraph text.",
            EmptySource::Page => "⚠️ Page is empty.",
            EmptySource::Diagrams => "⚠️ No diagrams provided to combine.",
        }
    }
}

/// Every non-success outcome of `process`, `read` and `combine`.
#[derive(Debug, Error)]
pub enum BuddyError {
    /// Fetching child blocks from Notion failed. The pipeline never started.
    #[error("Error reading Notion: {source}")]
    ReadFailure {
        page_id: String,
        #[source]
        source: StoreError,
    },

    /// A completion call failed. Nothing was written back.
    #[error("Error {}: {source}", .step.action())]
    ModelFailure {
        step: ModelStep,
        #[source]
        source: ModelError,
    },

    /// An append call failed. The first `appended` blocks stay on the page.
    #[error("Error writing to Notion: {source}")]
    WriteFailure {
        page_id: String,
        appended: usize,
        #[source]
        source: StoreError,
    },

    /// Nothing to process. Rendered as a warning, not an error.
    #[error("{}", .0.warning())]
    EmptyContent(EmptySource),

    /// Builder validation failed at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BuddyError {
    /// `true` for outcomes that surfaces report as a normal (200) result.
    pub fn is_warning(&self) -> bool {
        matches!(self, BuddyError::EmptyContent(_))
    }
}

/// A failed request against the Notion API.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No Notion credential was configured.
    #[error("NOTION_API_KEY is not set")]
    MissingCredential,

    /// The request never produced a response (DNS, TLS, timeout, …).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Notion answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// A failed completion call.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The provider could not be constructed (usually a missing API key).
    #[error("LLM provider '{provider}' is not configured. {hint}")]
    NotConfigured { provider: String, hint: String },

    /// The provider returned an error.
    #[error("{0}")]
    Provider(String),

    /// The call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_failure_display() {
        let e = BuddyError::ReadFailure {
            page_id: "abc".into(),
            source: StoreError::Status {
                status: 404,
                message: "Could not find block".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Error reading Notion: "), "got: {msg}");
        assert!(msg.contains("404"));
    }

    #[test]
    fn model_failure_display_depends_on_step() {
        let e = BuddyError::ModelFailure {
            step: ModelStep::Diagram,
            source: ModelError::Provider("quota exceeded".into()),
        };
        assert_eq!(e.to_string(), "Error running agent: quota exceeded");

        let e = BuddyError::ModelFailure {
            step: ModelStep::Merge,
            source: ModelError::Timeout { secs: 60 },
        };
        assert_eq!(
            e.to_string(),
            "Error combining diagrams: LLM call timed out after 60s"
        );
    }

    #[test]
    fn write_failure_display() {
        let e = BuddyError::WriteFailure {
            page_id: "abc".into(),
            appended: 2,
            source: StoreError::MissingCredential,
        };
        assert!(e.to_string().starts_with("Error writing to Notion: "));
    }

    #[test]
    fn empty_content_is_a_warning() {
        let e = BuddyError::EmptyContent(EmptySource::Diagrams);
        assert!(e.is_warning());
        assert!(!e.to_string().starts_with("Error"));
        assert_eq!(e.to_string(), "⚠️ No diagrams provided to combine.");
    }

    #[test]
    fn failures_are_not_warnings() {
        let e = BuddyError::InvalidConfig("temperature".into());
        assert!(!e.is_warning());
    }
}
