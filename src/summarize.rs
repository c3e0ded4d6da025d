//! Pipeline orchestration: Extract → Summarise → (optional) Publish.
//!
//! [`Summarizer`] owns every collaborator for the lifetime of the process and
//! keeps no per-request state, so one instance is shared behind an `Arc` by
//! the HTTP surface and used directly by the CLI.
//!
//! Failure policy differs per flow:
//!
//! * **Webpage flow** ([`Summarizer::summarize_webpage`]). Configuration
//!   errors are returned as `Err`. Anything else becomes
//!   [`WebpageOutcome::Degraded`] with a placeholder body that still carries
//!   the page title.
//! * **Ingest flow** ([`Summarizer::ingest`]). Extraction, completion and
//!   malformed output are returned as `Err`. A rejected publish is reported
//!   inside [`IngestOutcome`] instead.

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::{AppConfig, Environment};
use crate::error::ClipError;
use crate::output::{
    ExtractionRequest, IngestOutcome, PageRef, PlainText, StructuredSummary, SummaryMode,
    SummaryRequestContext, WebpageOutcome,
};
use crate::pipeline::llm::{CompletionClient, CompletionOptions};
use crate::pipeline::{blocks, extract, input, llm, response};
use crate::prompts::build_prompt;
use crate::publish::{DocumentStore, NotionClient, UNTITLED_PAGE};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Message returned when an ingest request lacks a required value.
pub const MISSING_INGEST_INPUTS: &str = "Missing URL, notionKey, or parentId";

/// Message returned when page listing has no token to use.
pub const MISSING_NOTION_TOKEN: &str = "Missing notionKey";

/// The summarisation service.
pub struct Summarizer {
    environment: Environment,
    fetch_timeout_secs: u64,
    default_token: Option<String>,
    default_parent_id: Option<String>,
    markdown: Arc<dyn CompletionClient>,
    markdown_options: CompletionOptions,
    structured: Arc<dyn CompletionClient>,
    structured_options: CompletionOptions,
    store: Arc<dyn DocumentStore>,
    clipboard: Arc<dyn Clipboard>,
    http: reqwest::Client,
}

impl Summarizer {
    /// Wire up the production collaborators described by `config`.
    ///
    /// Credentials are not checked here; a missing key surfaces on the first
    /// call that needs it.
    pub fn new(config: &AppConfig) -> Result<Self, ClipError> {
        Ok(Self {
            environment: config.environment,
            fetch_timeout_secs: config.fetch_timeout_secs,
            default_token: config.notion.token.clone(),
            default_parent_id: config.notion.default_parent_id.clone(),
            markdown: llm::client_for(&config.summarize)?,
            markdown_options: CompletionOptions::from(&config.summarize),
            structured: llm::client_for(&config.ingest)?,
            structured_options: CompletionOptions::from(&config.ingest),
            store: Arc::new(NotionClient::new(&config.notion)?),
            clipboard: Arc::new(SystemClipboard),
            http: input::fetch_client(config.fetch_timeout_secs)?,
        })
    }

    /// Replace the client used for free-form Markdown summaries.
    pub fn with_markdown_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.markdown = client;
        self
    }

    /// Replace the client used for structured extraction.
    pub fn with_structured_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.structured = client;
        self
    }

    /// Replace the document store.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the clipboard.
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    // ── Webpage flow ─────────────────────────────────────────────────────

    /// Summarise an HTML page the caller already holds.
    pub async fn summarize_webpage(
        &self,
        html: &str,
        url: Option<&str>,
        title: Option<&str>,
    ) -> Result<WebpageOutcome, ClipError> {
        info!("Summarising webpage: {}", url.unwrap_or("<no url>"));
        let request = ExtractionRequest::html(html, url.map(str::to_string));
        let result = self.markdown_summary(request, url, title).await;
        self.finish_webpage(result, title.unwrap_or_default()).await
    }

    /// Summarise a URL or local file (HTML or PDF by suffix).
    ///
    /// Used by the CLI; follows the same degradation rules as
    /// [`Self::summarize_webpage`].
    pub async fn summarize_source(
        &self,
        locator: &str,
        title: Option<&str>,
    ) -> Result<WebpageOutcome, ClipError> {
        info!("Summarising source: {}", locator);
        let url = input::is_url(locator).then_some(locator);
        let result = match self.resolve(locator).await {
            Ok(request) => self.markdown_summary(request, url, title).await,
            Err(e) => Err(e),
        };
        self.finish_webpage(result, title.unwrap_or_default()).await
    }

    async fn markdown_summary(
        &self,
        request: ExtractionRequest,
        url: Option<&str>,
        title: Option<&str>,
    ) -> Result<String, ClipError> {
        let start = Instant::now();
        let body_text = extract::extract_blocking(request).await?;
        let context = SummaryRequestContext {
            title: title.map(str::to_string),
            url: url.map(str::to_string),
            body_text,
            mode: SummaryMode::FreeformMarkdown,
        };
        let prompt = build_prompt(&context);
        let completion = self.markdown.complete(&prompt, &self.markdown_options).await?;
        let summary = response::parse_markdown(completion.raw_text);
        debug!("Markdown summary: {} chars in {:?}", summary.len(), start.elapsed());
        Ok(summary)
    }

    async fn finish_webpage(
        &self,
        result: Result<String, ClipError>,
        title: &str,
    ) -> Result<WebpageOutcome, ClipError> {
        match result {
            Ok(summary) => {
                let clipboard_copied = self.copy_to_clipboard(&summary).await;
                Ok(WebpageOutcome::Summarised {
                    summary,
                    clipboard_copied,
                })
            }
            Err(e) if e.is_configuration() => Err(e),
            Err(e) => {
                warn!("Summary degraded: {}", e);
                Ok(degraded(title, &e.to_string()))
            }
        }
    }

    async fn copy_to_clipboard(&self, summary: &str) -> bool {
        if self.environment.is_production() {
            return false;
        }
        let clipboard = Arc::clone(&self.clipboard);
        let text = summary.to_string();
        let copied = tokio::task::spawn_blocking(move || clipboard.copy(&text))
            .await
            .unwrap_or_else(|e| Err(ClipError::Internal(format!("clipboard task panicked: {e}"))));
        match copied {
            Ok(()) => true,
            Err(e) => {
                warn!("Clipboard copy failed: {}", e);
                false
            }
        }
    }

    // ── Ingest flow ──────────────────────────────────────────────────────

    /// Fetch a paper, extract structured fields and publish them as a page.
    ///
    /// `token` and `parent_id` fall back to the configured defaults. All three
    /// values are checked before any network work starts.
    pub async fn ingest(
        &self,
        url: Option<&str>,
        token: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<IngestOutcome, ClipError> {
        let url = non_blank(url);
        let token = non_blank(token).or(self.default_token.as_deref());
        let parent_id = non_blank(parent_id).or(self.default_parent_id.as_deref());
        let (Some(url), Some(token), Some(parent_id)) = (url, token, parent_id) else {
            return Err(ClipError::InvalidRequest(MISSING_INGEST_INPUTS.into()));
        };

        let total_start = Instant::now();
        info!("Ingesting: {}", url);

        // ── Step 1: Fetch and extract ────────────────────────────────────
        let request = input::fetch_source(&self.http, url, self.fetch_timeout_secs).await?;
        let body_text = extract::extract_blocking(request).await?;

        // ── Step 2: Structured completion ────────────────────────────────
        let summary = self.structured_summary(url, body_text).await?;
        let title = summary.title().unwrap_or_else(|| UNTITLED_PAGE.to_string());

        // ── Step 3: Publish ──────────────────────────────────────────────
        let page_blocks = blocks::build_blocks(&summary);
        let publish = self
            .store
            .create_page(parent_id, &title, &page_blocks, token)
            .await;
        let (published, publish_error) = match publish {
            Ok(page_id) => {
                info!("Published '{}' as page {}", title, page_id);
                (true, None)
            }
            Err(e) => {
                warn!("Publish failed for '{}': {}", title, e);
                (false, Some(e.to_string()))
            }
        };

        debug!("Ingest finished in {:?}", total_start.elapsed());
        Ok(IngestOutcome {
            title,
            summary,
            published,
            publish_error,
        })
    }

    async fn structured_summary(
        &self,
        url: &str,
        body_text: PlainText,
    ) -> Result<StructuredSummary, ClipError> {
        let context = SummaryRequestContext {
            title: None,
            url: Some(url.to_string()),
            body_text,
            mode: SummaryMode::StructuredFields,
        };
        let prompt = build_prompt(&context);
        let completion = self
            .structured
            .complete(&prompt, &self.structured_options)
            .await?;
        response::parse_structured(&completion.raw_text)
    }

    /// List pages the token (or the configured default) can publish under.
    pub async fn list_pages(&self, token: Option<&str>) -> Result<Vec<PageRef>, ClipError> {
        let Some(token) = non_blank(token).or(self.default_token.as_deref()) else {
            return Err(ClipError::InvalidRequest(MISSING_NOTION_TOKEN.into()));
        };
        self.store.list_pages(token).await
    }

    async fn resolve(&self, locator: &str) -> Result<ExtractionRequest, ClipError> {
        if input::is_url(locator) {
            input::fetch_source(&self.http, locator, self.fetch_timeout_secs).await
        } else {
            input::resolve_input(locator, self.fetch_timeout_secs).await
        }
    }
}

/// Placeholder outcome for a failed webpage summary.
pub fn degraded(title: &str, reason: &str) -> WebpageOutcome {
    WebpageOutcome::Degraded {
        error: format!("Error generating summary: {reason}"),
        summary: format!("# {title}\n\n**Error generating summary:** {reason}"),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
