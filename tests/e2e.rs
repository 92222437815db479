//! End-to-end tests for notion-research-buddy.
//!
//! Notion is played by a wiremock server and the model by a scripted
//! [`CompletionModel`], so the whole read → refine → diagram → write path
//! runs over real HTTP without credentials.
//!
//! One live test talks to the real Notion API and the configured LLM
//! provider. It is gated behind `E2E_ENABLED` and `NOTION_TEST_PAGE_ID`:
//!
//!   E2E_ENABLED=1 NOTION_TEST_PAGE_ID=... cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use notion_research_buddy::{
    render, BuddyConfig, CompletionModel, DiagramInput, ModelError, NotionClient, ResearchBuddy,
    PROCESS_SUCCESS,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "page-1";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Model that replays canned responses and records every prompt.
#[derive(Default)]
struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn replying(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
            prompts: Mutex::default(),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Provider("no scripted response left".into()))
    }
}

fn paragraph(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [ { "type": "text", "plain_text": text } ] }
    })
}

async fn notion_with_page(blocks: Vec<Value>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/blocks/{PAGE}/children")))
        .and(header("Notion-Version", "2022-06-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": blocks,
            "has_more": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/blocks/{PAGE}/children")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": []
        })))
        .mount(&server)
        .await;
    server
}

fn buddy_for(server: &MockServer, model: Arc<ScriptedModel>) -> ResearchBuddy {
    let config = BuddyConfig::builder()
        .notion_base_url(server.uri())
        .notion_api_key("secret_test")
        .build()
        .unwrap();
    let client = NotionClient::new(&config).unwrap();
    ResearchBuddy::new(Arc::new(client), model)
}

/// The `children[0]` element of every PATCH the server received, in order.
async fn appended_blocks(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| {
            let body: Value = r.body_json().unwrap();
            assert_eq!(body["children"].as_array().unwrap().len(), 1);
            body["children"][0].clone()
        })
        .collect()
}

fn rich_text_content(block: &Value) -> &str {
    let kind = block["type"].as_str().unwrap();
    block[kind]["rich_text"][0]["text"]["content"]
        .as_str()
        .unwrap()
}

// ── Process ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn process_appends_five_blocks_in_order() {
    let server = notion_with_page(vec![paragraph("Hello"), paragraph("World")]).await;
    let model = ScriptedModel::replying(&["# Hello World", "```mermaid\ngraph TD; Hello-->World\n```"]);

    let result = buddy_for(&server, model.clone()).process(PAGE).await;
    assert_eq!(result.unwrap(), PROCESS_SUCCESS);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Hello\nWorld"));

    let blocks = appended_blocks(&server).await;
    let kinds: Vec<_> = blocks.iter().map(|b| b["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["divider", "heading_2", "paragraph", "heading_2", "code"]);
    assert_eq!(rich_text_content(&blocks[1]), "✨ Refined Notes");
    assert_eq!(rich_text_content(&blocks[2]), "# Hello World");
    assert_eq!(rich_text_content(&blocks[3]), "📊 Architecture Diagram");
    assert_eq!(rich_text_content(&blocks[4]), "graph TD; Hello-->World");
    assert_eq!(blocks[4]["code"]["language"], "mermaid");
}

#[tokio::test]
async fn diagram_prompt_uses_refined_notes() {
    let server = notion_with_page(vec![paragraph("raw scribbles")]).await;
    let model = ScriptedModel::replying(&["Refined architecture notes", "graph TD; a-->b"]);

    buddy_for(&server, model.clone()).process(PAGE).await.unwrap();

    let prompts = model.prompts();
    assert!(prompts[1].contains("Refined architecture notes"));
    assert!(!prompts[1].contains("raw scribbles"));
}

#[tokio::test]
async fn long_refined_notes_are_truncated() {
    let server = notion_with_page(vec![paragraph("notes")]).await;
    let long = "é".repeat(2500);
    let model = ScriptedModel::replying(&[&long, "graph TD; a-->b"]);

    buddy_for(&server, model).process(PAGE).await.unwrap();

    let blocks = appended_blocks(&server).await;
    let content = rich_text_content(&blocks[2]);
    assert_eq!(content.chars().count(), 2000);
    assert!(long.starts_with(content));
}

#[tokio::test]
async fn empty_page_writes_nothing() {
    let server = notion_with_page(vec![]).await;
    let model = ScriptedModel::replying(&[]);

    let rendered = render(buddy_for(&server, model.clone()).process(PAGE).await);
    assert_eq!(rendered, "⚠️ Page is empty or contains no paragraph text.");
    assert!(model.prompts().is_empty());
    assert!(appended_blocks(&server).await.is_empty());
}

#[tokio::test]
async fn notion_read_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find block with ID: page-1."
        })))
        .mount(&server)
        .await;
    let model = ScriptedModel::replying(&[]);

    let rendered = render(buddy_for(&server, model.clone()).process(PAGE).await);
    assert!(rendered.starts_with("Error reading Notion: "), "{rendered}");
    assert!(rendered.contains("Could not find block"), "{rendered}");
    assert!(model.prompts().is_empty());
}

// ── Read ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_returns_page_text() {
    let server = notion_with_page(vec![
        json!({
            "object": "block",
            "type": "heading_2",
            "heading_2": { "rich_text": [ { "plain_text": "Overview" } ] }
        }),
        paragraph("Body"),
    ])
    .await;
    let model = ScriptedModel::replying(&[]);

    let text = buddy_for(&server, model).read(PAGE).await.unwrap();
    assert_eq!(text, "\n## Overview\n\nBody");
}

// ── Combine ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn combine_single_diagram_is_verbatim() {
    let server = MockServer::start().await;
    let model = ScriptedModel::replying(&[]);
    let diagrams = [DiagramInput::new("A", "graph TD; a-->b")];

    let merged = buddy_for(&server, model.clone())
        .combine(&diagrams, "Unified Architecture")
        .await
        .unwrap();
    assert_eq!(merged, "graph TD; a-->b");
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn combine_several_diagrams_makes_one_call() {
    let server = MockServer::start().await;
    let model = ScriptedModel::replying(&["```mermaid\ngraph TD; a-->b; b-->c\n```"]);
    let diagrams = [
        DiagramInput::new("Ingest", "graph TD; a-->b"),
        DiagramInput::new("Serve", "graph TD; b-->c"),
    ];

    let merged = buddy_for(&server, model.clone())
        .combine(&diagrams, "Platform")
        .await
        .unwrap();
    assert_eq!(merged, "graph TD; a-->b; b-->c");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Platform"));
    assert!(prompts[0].contains("Ingest"));
    assert!(prompts[0].contains("Serve"));
}

// ── Live ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_read_page() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run live e2e tests");
        return;
    }
    let Ok(page_id) = std::env::var("NOTION_TEST_PAGE_ID") else {
        println!("SKIP: NOTION_TEST_PAGE_ID not set");
        return;
    };

    let buddy = ResearchBuddy::from_config(&BuddyConfig::from_env()).unwrap();
    let rendered = render(buddy.read(&page_id).await);
    println!("{rendered}");
    assert!(!rendered.starts_with("Error"), "{rendered}");
}
