//! Block types read from and written to a Notion page.
//!
//! Notion returns heterogeneous JSON where the block payload lives under a
//! key equal to its `type`:
//!
//! ```json
//! { "type": "heading_2", "heading_2": { "rich_text": [ { "plain_text": "Intro" } ] } }
//! ```
//!
//! [`ContentBlock`] keeps only what extraction needs: the kind and the plain
//! text of each rich-text run. Unknown kinds are preserved as
//! [`ContentBlock::Other`] so callers can still count them.

use serde::Deserialize;
use serde_json::{json, Map, Value};

/// A block read from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Paragraph { runs: Vec<String> },
    /// `level` is 1–3.
    Heading { level: u8, runs: Vec<String> },
    BulletedItem { runs: Vec<String> },
    /// Any block kind extraction does not render (e.g. `image`, `toggle`).
    Other { kind: String },
}

impl ContentBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph {
            runs: vec![text.into()],
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        ContentBlock::Heading {
            level,
            runs: vec![text.into()],
        }
    }

    pub fn bulleted(text: impl Into<String>) -> Self {
        ContentBlock::BulletedItem {
            runs: vec![text.into()],
        }
    }

    /// The text runs of a recognised block, `None` for [`ContentBlock::Other`].
    pub fn runs(&self) -> Option<&[String]> {
        match self {
            ContentBlock::Paragraph { runs }
            | ContentBlock::Heading { runs, .. }
            | ContentBlock::BulletedItem { runs } => Some(runs),
            ContentBlock::Other { .. } => None,
        }
    }

    /// Parse one element of a `results` array.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let raw: RawBlock = serde_json::from_value(value.clone())
            .map_err(|e| format!("malformed block: {e}"))?;
        let runs = plain_text_runs(raw.payload.get(&raw.kind));

        let block = match raw.kind.as_str() {
            "paragraph" => ContentBlock::Paragraph { runs },
            "heading_1" => ContentBlock::Heading { level: 1, runs },
            "heading_2" => ContentBlock::Heading { level: 2, runs },
            "heading_3" => ContentBlock::Heading { level: 3, runs },
            "bulleted_list_item" => ContentBlock::BulletedItem { runs },
            _ => ContentBlock::Other {
                kind: raw.kind.clone(),
            },
        };
        Ok(block)
    }
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

fn plain_text_runs(payload: Option<&Value>) -> Vec<String> {
    payload
        .and_then(|p| p.get("rich_text"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("plain_text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// A block appended to a page by the write-back composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendBlock {
    Divider,
    Heading2(String),
    Paragraph(String),
    Code { language: String, text: String },
}

impl AppendBlock {
    /// Notion block type name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppendBlock::Divider => "divider",
            AppendBlock::Heading2(_) => "heading_2",
            AppendBlock::Paragraph(_) => "paragraph",
            AppendBlock::Code { .. } => "code",
        }
    }

    /// JSON body element for `PATCH /blocks/{id}/children`.
    pub fn to_json(&self) -> Value {
        match self {
            AppendBlock::Divider => json!({
                "object": "block",
                "type": "divider",
                "divider": {}
            }),
            AppendBlock::Heading2(text) => json!({
                "object": "block",
                "type": "heading_2",
                "heading_2": { "rich_text": rich_text(text) }
            }),
            AppendBlock::Paragraph(text) => json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": rich_text(text) }
            }),
            AppendBlock::Code { language, text } => json!({
                "object": "block",
                "type": "code",
                "code": {
                    "rich_text": rich_text(text),
                    "language": language
                }
            }),
        }
    }
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}
