//! Tool-invocation surface: a Model Context Protocol server over stdio.
//!
//! Messages are newline-delimited JSON-RPC 2.0. The server answers
//! `initialize`, `ping`, `tools/list` and `tools/call`, and ignores
//! notifications (messages without an `id`). Three tools map onto the
//! service operations:
//!
//! | Tool | Operation |
//! |------|-----------|
//! | `process_research_page` | [`ResearchBuddy::process`] |
//! | `get_page_content` | [`ResearchBuddy::read`] |
//! | `combine_architecture_diagrams` | [`ResearchBuddy::combine`] |
//!
//! Tool arguments are accepted either wrapped as `{"ctx": {...}}` or flat.
//! Tool results carry the rendered string; `isError` is set when it starts
//! with `Error`.

use crate::merge::CombineRequest;
use crate::service::{is_error_message, render, ResearchBuddy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "Notion Research Buddy";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    /// `None` only when the key is absent; `"id": null` is still a request.
    #[serde(default, deserialize_with = "present_id")]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Arguments of the page tools.
#[derive(Debug, Deserialize)]
struct PageContext {
    page_id: String,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// JSON-RPC error: code + message.
#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// MCP server wrapping a [`ResearchBuddy`].
pub struct McpServer {
    buddy: ResearchBuddy,
}

impl McpServer {
    pub fn new(buddy: ResearchBuddy) -> Self {
        Self { buddy }
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        info!("Starting {} MCP server on stdio", SERVER_NAME);
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve one JSON-RPC message per line from `reader`, writing replies to `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_line(&line).await {
                let mut out = reply.to_string();
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        debug!("stdin closed, MCP server exiting");
        Ok(())
    }

    /// Handle one raw message. `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("Unparsable MCP message: {}", e);
                return Some(error_response(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };
        let request: RpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(error_response(
                    Value::Null,
                    RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
                ));
            }
        };

        let Some(id) = request.id else {
            debug!("MCP notification: {}", request.method);
            return None;
        };

        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(e) => error_response(id, e),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => {
                let call: ToolCall = serde_json::from_value(params)
                    .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))?;
                let rendered = self.call_tool(&call.name, call.arguments).await?;
                Ok(json!({
                    "content": [ { "type": "text", "text": rendered } ],
                    "isError": is_error_message(&rendered)
                }))
            }
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, RpcError> {
        info!("MCP tool call: {}", name);
        let result = match name {
            "process_research_page" => {
                let ctx: PageContext = tool_args(arguments)?;
                self.buddy.process(&ctx.page_id).await
            }
            "get_page_content" => {
                let ctx: PageContext = tool_args(arguments)?;
                self.buddy.read(&ctx.page_id).await
            }
            "combine_architecture_diagrams" => {
                let req: CombineRequest = tool_args(arguments)?;
                self.buddy.combine(&req.diagrams, &req.title).await
            }
            other => {
                return Err(RpcError::new(
                    INVALID_PARAMS,
                    format!("Unknown tool: {other}"),
                ))
            }
        };
        Ok(render(result))
    }
}

/// Decode tool arguments, unwrapping an optional `ctx` envelope.
fn tool_args<T: DeserializeOwned>(arguments: Value) -> Result<T, RpcError> {
    let inner = match arguments {
        Value::Object(mut map) if map.contains_key("ctx") => map.remove("ctx").unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(inner)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid arguments: {e}")))
}

fn error_response(id: Value, err: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": err.code, "message": err.message }
    })
}

fn page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "page_id": {
                "type": "string",
                "description": "Notion Page ID (32 characters, no dashes)"
            }
        },
        "required": ["page_id"]
    })
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "process_research_page",
            "description": "Reads a Notion page, refines its notes and generates a Mermaid diagram, then appends both to the page.",
            "inputSchema": page_schema()
        },
        {
            "name": "get_page_content",
            "description": "Read and return the text content of a Notion page (paragraphs, headings, bullets).",
            "inputSchema": page_schema()
        },
        {
            "name": "combine_architecture_diagrams",
            "description": "Combine multiple Mermaid architecture diagrams into a single unified diagram.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "diagrams": {
                        "type": "array",
                        "description": "List of diagrams to combine",
                        "items": {
                            "type": "object",
                            "properties": {
                                "label": { "type": "string", "description": "Label for this diagram (e.g., 'PersonaPlex', 'MemoRAG')" },
                                "mermaid_code": { "type": "string", "description": "Raw Mermaid diagram code" }
                            },
                            "required": ["label", "mermaid_code"]
                        }
                    },
                    "title": {
                        "type": "string",
                        "description": "Title for the combined diagram",
                        "default": "Unified Architecture"
                    }
                },
                "required": ["diagrams"]
            }
        }
    ])
}
