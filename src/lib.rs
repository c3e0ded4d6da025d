//! # clipsum
//!
//! Summarise web clips with a language model, then copy the result to the
//! clipboard or publish it as a Notion page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML / PDF
//!  │
//!  ├─ 1. Input    page HTML from the caller, or fetch a URL / read a file
//!  ├─ 2. Extract  strip markup (scraper) or decode pages (lopdf)
//!  ├─ 3. Prompt   free-form Markdown or structured JSON fields
//!  ├─ 4. Complete OpenAI chat or Vertex SSE stream
//!  ├─ 5. Map      identity (Markdown) or JSON object parse (structured)
//!  └─ 6. Deliver  clipboard copy, or Notion page built from 12 blocks
//! ```
//!
//! Two flows sit on top of the pipeline, both on [`Summarizer`]:
//!
//! * **webpage**: a bookmarklet posts the page HTML; the caller always gets a
//!   title and a body back, degraded to a placeholder when the model fails.
//! * **ingest**: a paper URL is summarised into fixed fields and published
//!   under a parent page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clipsum::{AppConfig, Summarizer, WebpageOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // OPENAI_API_KEY, VERTEX_*, NOTION_* are read once, here.
//!     let config = AppConfig::from_env();
//!     let summarizer = Summarizer::new(&config)?;
//!     let html = "<html><body><h1>Hello</h1></body></html>";
//!     match summarizer.summarize_webpage(html, None, Some("Hello")).await? {
//!         WebpageOutcome::Summarised { summary, .. } => println!("{summary}"),
//!         WebpageOutcome::Degraded { error, .. } => eprintln!("{error}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `clipsum` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when embedding only the library:
//! ```toml
//! clipsum = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod clipboard;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod publish;
pub mod server;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use clipboard::{Clipboard, NoopClipboard, SystemClipboard};
pub use config::{
    AppConfig, CompletionConfig, CompletionConfigBuilder, CompletionProtocol, Environment,
    NotionConfig, StreamPolicy,
};
pub use error::{ClipError, ErrorKind};
pub use output::{
    BlockKind, CompletionResult, DocumentBlock, ExtractionRequest, FieldValue, IngestOutcome,
    PageRef, PlainText, SourceKind, StructuredSummary, SummaryMode, SummaryRequestContext,
    WebpageOutcome,
};
pub use pipeline::llm::{CompletionClient, CompletionOptions};
pub use publish::{DocumentStore, NotionClient};
pub use summarize::Summarizer;
