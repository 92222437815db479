//! # notion-research-buddy
//!
//! Turn rough notes on a Notion page into refined Markdown and a Mermaid
//! architecture diagram, written back to the same page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Notion page
//!  │
//!  ├─ 1. Extract   first page of child blocks → paragraph text
//!  ├─ 2. Refine    LLM: raw notes → structured Markdown
//!  ├─ 3. Diagram   LLM: notes → Mermaid (fences stripped)
//!  └─ 4. Write     divider, headings, refined text, mermaid code block
//! ```
//!
//! A separate, stateless operation merges several labelled Mermaid diagrams
//! into one ([`merge::combine_diagrams`]).
//!
//! ## Surfaces
//!
//! The same three operations (`process`, `read`, `combine`) are served as
//! MCP tools over stdio ([`mcp`]) and as an HTTP API ([`http`]); the
//! `research-buddy` binary runs either, or a single operation from the
//! command line.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notion_research_buddy::{render, BuddyConfig, ResearchBuddy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // NOTION_API_KEY + GEMINI_API_KEY from the environment
//!     let config = BuddyConfig::from_env();
//!     let buddy = ResearchBuddy::from_config(&config)?;
//!     println!("{}", render(buddy.process("0123456789abcdef0123456789abcdef").await));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `research-buddy` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod mcp;
pub mod merge;
pub mod notion;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;
pub mod writeback;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BuddyConfig, BuddyConfigBuilder};
pub use error::{BuddyError, EmptySource, ModelError, ModelStep, StoreError};
pub use merge::{combine_diagrams, CombineRequest, DiagramInput};
pub use notion::{AppendBlock, ContentBlock, NotionClient, PageStore};
pub use pipeline::llm::{resolve_model, CompletionModel, ProviderModel};
pub use pipeline::{run_pipeline, PipelineState, Stage, StatePatch};
pub use progress::{NoopProgressCallback, ProcessProgressCallback, ProgressCallback};
pub use service::{is_error_message, render, ResearchBuddy, PROCESS_SUCCESS};
