//! Document store: publish block sequences as Notion pages.
//!
//! [`DocumentStore`] is the seam the orchestrator talks to; [`NotionClient`]
//! implements it over the Notion REST API. Tokens are passed per call because
//! the HTTP surface lets each caller bring its own integration key.

use crate::config::NotionConfig;
use crate::error::ClipError;
use crate::output::{BlockKind, DocumentBlock, PageRef};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Maximum characters in one Notion rich-text segment.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Title used when the summary has none.
pub const UNTITLED_PAGE: &str = "Untitled";

/// Title reported for listed pages without a title property.
pub const UNTITLED_LISTING: &str = "(Untitled)";

/// A store that can hold summary pages.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a page under `parent_id`. Returns the new page id.
    async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
        token: &str,
    ) -> Result<String, ClipError>;

    /// List pages the token can publish under.
    async fn list_pages(&self, token: &str) -> Result<Vec<PageRef>, ClipError>;
}

/// Notion REST client.
pub struct NotionClient {
    api_base: String,
    version: String,
    page_size: u32,
    http: reqwest::Client,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, ClipError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClipError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            page_size: config.search_page_size,
            http,
        })
    }

    async fn post(&self, path: &str, token: &str, body: &Value) -> Result<Value, ClipError> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_base, path))
            .bearer_auth(token)
            .header("Notion-Version", &self.version)
            .json(body)
            .send()
            .await
            .map_err(|e| ClipError::PublishFailed {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ClipError::PublishFailed {
            status: status.as_u16(),
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(ClipError::PublishFailed {
                status: status.as_u16(),
                message: notion_error_message(&text),
            });
        }
        serde_json::from_str(&text).map_err(|e| ClipError::PublishFailed {
            status: status.as_u16(),
            message: format!("response is not JSON: {e}"),
        })
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
        token: &str,
    ) -> Result<String, ClipError> {
        info!("Publishing '{}' ({} blocks) under {}", title, blocks.len(), parent_id);
        let body = page_payload(parent_id, title, blocks);
        let created = self.post("pages", token, &body).await?;
        let id = created["id"].as_str().unwrap_or_default().to_string();
        debug!("Created page {}", id);
        Ok(id)
    }

    async fn list_pages(&self, token: &str) -> Result<Vec<PageRef>, ClipError> {
        let body = json!({ "page_size": self.page_size });
        let found = self.post("search", token, &body).await?;
        let pages = parse_search_results(&found);
        debug!("Search returned {} pages", pages.len());
        Ok(pages)
    }
}

/// Page-creation body: parent, title property and children blocks.
pub fn page_payload(parent_id: &str, title: &str, blocks: &[DocumentBlock]) -> Value {
    let title = if title.trim().is_empty() {
        UNTITLED_PAGE
    } else {
        title
    };
    json!({
        "parent": { "page_id": parent_id },
        "properties": {
            "Title": { "title": [ { "text": { "content": title } } ] }
        },
        "children": blocks.iter().map(block_json).collect::<Vec<_>>(),
    })
}

fn block_json(block: &DocumentBlock) -> Value {
    let block_type = match block.kind {
        BlockKind::Heading => "heading_2",
        BlockKind::Paragraph => "paragraph",
    };
    let rich_text: Vec<Value> = split_rich_text(&block.text)
        .into_iter()
        .map(|segment| json!({ "type": "text", "text": { "content": segment } }))
        .collect();
    json!({
        "object": "block",
        "type": block_type,
        block_type: { "rich_text": rich_text },
    })
}

/// Split `text` into segments of at most [`RICH_TEXT_LIMIT`] characters,
/// cutting on char boundaries. Empty text yields one empty segment.
pub fn split_rich_text(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![text];
    }
    let mut segments = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == RICH_TEXT_LIMIT {
            segments.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    segments.push(&text[start..]);
    segments
}

/// Turn a `/search` response into page references.
pub fn parse_search_results(body: &Value) -> Vec<PageRef> {
    let Some(results) = body["results"].as_array() else {
        return Vec::new();
    };
    results
        .iter()
        .filter(|r| r["object"] == "page")
        .map(|r| PageRef {
            id: r["id"].as_str().unwrap_or_default().replace('-', ""),
            title: page_title(r).unwrap_or_else(|| UNTITLED_LISTING.to_string()),
        })
        .collect()
}

fn page_title(page: &Value) -> Option<String> {
    page["properties"]
        .as_object()?
        .values()
        .filter(|prop| prop["type"] == "title")
        .find_map(|prop| {
            prop["title"]
                .as_array()
                .and_then(|parts| parts.first())
                .and_then(|first| first["plain_text"].as_str())
                .map(str::to_string)
        })
}

fn notion_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(300).collect())
}
