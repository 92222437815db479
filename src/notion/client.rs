//! [`PageStore`] over the Notion REST API.
//!
//! Two endpoints are used:
//!
//! * `GET  {base}/blocks/{id}/children`: first page of child blocks
//! * `PATCH {base}/blocks/{id}/children`: append `{"children": [block]}`
//!
//! Requests are authenticated with a bearer integration token and pinned to
//! a `Notion-Version`. Failures are never retried here; the caller decides
//! how a failed read or write is reported.

use super::{AppendBlock, ContentBlock, PageStore};
use crate::config::BuddyConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// User-Agent string for Notion requests.
const USER_AGENT: &str = concat!("notion-research-buddy/", env!("CARGO_PKG_VERSION"));

/// Notion API client.
#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: String,
    version: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChildrenPage {
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
}

impl NotionClient {
    /// Build a client from the configured base URL, version, timeout and key.
    pub fn new(config: &BuddyConfig) -> Result<Self, StoreError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.notion_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.notion_base_url.trim_end_matches('/').to_string(),
            version: config.notion_version.clone(),
            api_key: config.notion_api_key.clone(),
        })
    }

    fn children_url(&self, block_id: &str) -> String {
        format!("{}/blocks/{}/children", self.base_url, block_id)
    }

    fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        let key = self.api_key.as_deref().ok_or(StoreError::MissingCredential)?;
        Ok(req
            .bearer_auth(key)
            .header("Notion-Version", &self.version))
    }
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl PageStore for NotionClient {
    async fn list_children(&self, page_id: &str) -> Result<Vec<ContentBlock>, StoreError> {
        let req = self.authorize(self.http.get(self.children_url(page_id)))?;
        let resp = check_status(req.send().await?).await?;
        let page: ChildrenPage = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if page.has_more {
            debug!(
                "Page {}: more than {} child blocks, ignoring the rest",
                page_id,
                page.results.len()
            );
        }

        page.results
            .iter()
            .map(|v| ContentBlock::from_json(v).map_err(StoreError::Decode))
            .collect()
    }

    async fn append_block(&self, page_id: &str, block: &AppendBlock) -> Result<(), StoreError> {
        let body = json!({ "children": [block.to_json()] });
        let req = self.authorize(self.http.patch(self.children_url(page_id)))?;
        check_status(req.json(&body).send().await?).await?;
        debug!("Page {}: appended {} block", page_id, block.kind());
        Ok(())
    }
}

/// Map a non-2xx response to [`StoreError::Status`], using Notion's
/// `message` field when the body is a Notion error object.
async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}
