//! HTTP surface tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! completion service, document store and clipboard are replaced by fakes so
//! no test touches the network or the host clipboard.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use clipsum::prompts::Prompt;
use clipsum::server::{create_router, AppState};
use clipsum::{
    AppConfig, ClipError, Clipboard, CompletionClient, CompletionOptions, CompletionResult,
    DocumentBlock, DocumentStore, Environment, PageRef, Summarizer,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ── Fakes ────────────────────────────────────────────────────────────────

/// Completion fake: returns a fixed result and records every prompt.
struct FakeCompletion {
    reply: Box<dyn Fn() -> Result<String, ClipError> + Send + Sync>,
    prompts: Mutex<Vec<Prompt>>,
}

impl FakeCompletion {
    fn ok(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Arc::new(Self {
            reply: Box::new(move || Ok(text.clone())),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(make: fn() -> ClipError) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(move || Err(make())),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        prompt: &Prompt,
        _options: &CompletionOptions,
    ) -> Result<CompletionResult, ClipError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        (self.reply)().map(|raw_text| CompletionResult { raw_text })
    }
}

#[derive(Default)]
struct FakeClipboard {
    copies: Mutex<Vec<String>>,
}

impl Clipboard for FakeClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipError> {
        self.copies.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Store fake: records created pages, optionally rejects them.
#[derive(Default)]
struct FakeStore {
    reject: bool,
    created: Mutex<Vec<(String, String, Vec<DocumentBlock>, String)>>,
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
        token: &str,
    ) -> Result<String, ClipError> {
        if self.reject {
            return Err(ClipError::PublishFailed {
                status: 401,
                message: "API token is invalid.".into(),
            });
        }
        self.created.lock().unwrap().push((
            parent_id.to_string(),
            title.to_string(),
            blocks.to_vec(),
            token.to_string(),
        ));
        Ok("new-page".into())
    }

    async fn list_pages(&self, token: &str) -> Result<Vec<PageRef>, ClipError> {
        if self.reject {
            return Err(ClipError::PublishFailed {
                status: 401,
                message: "API token is invalid.".into(),
            });
        }
        Ok(vec![PageRef {
            id: "abc123".into(),
            title: format!("Pages for {token}"),
        }])
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    markdown: Arc<FakeCompletion>,
    structured: Arc<FakeCompletion>,
    clipboard: Arc<FakeClipboard>,
    store: Arc<FakeStore>,
    config: AppConfig,
}

impl Harness {
    fn new(markdown: Arc<FakeCompletion>) -> Self {
        Self {
            markdown,
            structured: FakeCompletion::ok("{}"),
            clipboard: Arc::new(FakeClipboard::default()),
            store: Arc::new(FakeStore::default()),
            config: AppConfig::default(),
        }
    }

    fn router(&self) -> axum::Router {
        let summarizer = Summarizer::new(&self.config)
            .unwrap()
            .with_markdown_client(self.markdown.clone())
            .with_structured_client(self.structured.clone())
            .with_store(self.store.clone())
            .with_clipboard(self.clipboard.clone());
        create_router(AppState {
            summarizer: Arc::new(summarizer),
        })
    }
}

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const PAGE: &str = "<html><body><h1>T</h1><script>bad()</script></body></html>";

// ── /api/summarize ───────────────────────────────────────────────────────

#[tokio::test]
async fn summarize_success_returns_summary_and_clipboard_flag() {
    let harness = Harness::new(FakeCompletion::ok("# Summary\n..."));
    let (status, body) = send(
        harness.router(),
        post_json(
            "/api/summarize",
            json!({ "html": PAGE, "url": "https://x", "title": "T" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "# Summary\n...");
    assert_eq!(body["clipboard_copied"], true);
    assert_eq!(
        harness.clipboard.copies.lock().unwrap().as_slice(),
        ["# Summary\n..."]
    );

    let prompts = harness.markdown.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("'T' (https://x)"));
    assert!(prompts[0].user.contains("\nT\n"));
    assert!(!prompts[0].user.contains("bad()"));
}

#[tokio::test]
async fn summarize_in_production_skips_clipboard() {
    let mut harness = Harness::new(FakeCompletion::ok("# ok"));
    harness.config.environment = Environment::Production;
    let (status, body) = send(
        harness.router(),
        post_json("/api/summarize", json!({ "html": PAGE })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clipboard_copied"], false);
    assert!(harness.clipboard.copies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn summarize_without_html_is_bad_request() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let (status, body) = send(
        harness.router(),
        post_json("/api/summarize", json!({ "url": "https://x", "title": "T" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "HTML content is required");
    assert!(harness.markdown.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn summarize_with_non_json_body_is_bad_request() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/summarize")
        .body(Body::from("html=<p>hi</p>"))
        .unwrap();
    let (status, body) = send(harness.router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn summarize_missing_credential_is_server_error() {
    // No fake: the real chat client runs with no OPENAI_API_KEY configured.
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let summarizer = Summarizer::new(&harness.config)
        .unwrap()
        .with_clipboard(harness.clipboard.clone());
    let router = create_router(AppState {
        summarizer: Arc::new(summarizer),
    });

    let (status, body) = send(
        router,
        post_json("/api/summarize", json!({ "html": PAGE, "title": "T" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "OpenAI API key is not set. Please set the OPENAI_API_KEY environment variable."
    );
    assert!(body.get("summary").is_none());
}

#[tokio::test]
async fn summarize_generic_failure_is_partial_content() {
    let harness = Harness::new(FakeCompletion::failing(|| ClipError::CompletionFailed {
        message: "connection reset".into(),
    }));
    let (status, body) = send(
        harness.router(),
        post_json(
            "/api/summarize",
            json!({ "html": PAGE, "url": "https://x", "title": "Quarterly Report" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    let error = body["error"].as_str().unwrap();
    let summary = body["summary"].as_str().unwrap();
    assert!(error.contains("Error generating summary"));
    assert!(summary.contains("Quarterly Report"));
    assert!(summary.contains("Error generating summary"));
    assert!(harness.clipboard.copies.lock().unwrap().is_empty());
}

// ── /api/ingest ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_missing_inputs_is_bad_request_before_any_work() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    for body in [
        json!({ "notionKey": "k", "notionParentId": "p" }),
        json!({ "url": "https://x/paper.pdf", "notionParentId": "p" }),
        json!({ "url": "https://x/paper.pdf", "notionKey": "k" }),
        json!({}),
    ] {
        let (status, response) = send(harness.router(), post_json("/api/ingest", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Missing URL, notionKey, or parentId");
    }
    assert!(harness.structured.prompts.lock().unwrap().is_empty());
    assert!(harness.store.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ingest_garbage_body_is_bad_request() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/ingest")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _) = send(harness.router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ingest_unreachable_source_is_server_error() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let (status, body) = send(
        harness.router(),
        post_json(
            "/api/ingest",
            json!({
                "url": "http://127.0.0.1:1/paper.pdf",
                "notionKey": "k",
                "notionParentId": "p"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("127.0.0.1:1"));
    assert!(harness.structured.prompts.lock().unwrap().is_empty());
}

// ── /api/pages ───────────────────────────────────────────────────────────

#[tokio::test]
async fn pages_lists_with_query_token() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let request = Request::builder()
        .uri("/api/pages?notionKey=secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": "abc123", "title": "Pages for secret" }]));
}

#[tokio::test]
async fn pages_fall_back_to_configured_token() {
    let mut harness = Harness::new(FakeCompletion::ok("unused"));
    harness.config.notion.token = Some("from-env".into());
    let request = Request::builder()
        .uri("/api/pages")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Pages for from-env");
}

#[tokio::test]
async fn pages_without_token_is_bad_request() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let request = Request::builder()
        .uri("/api/pages")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(harness.router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pages_store_failure_is_bad_gateway() {
    let mut harness = Harness::new(FakeCompletion::ok("unused"));
    harness.store = Arc::new(FakeStore {
        reject: true,
        ..FakeStore::default()
    });
    let request = Request::builder()
        .uri("/api/pages?notionKey=bad")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.router(), request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("API token is invalid."));
}

#[tokio::test]
async fn summarize_with_mistyped_field_names_it() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let (status, body) = send(
        harness.router(),
        post_json("/api/summarize", json!({ "html": PAGE, "url": 7 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "'url' must be a string");
    assert!(harness.markdown.prompts.lock().unwrap().is_empty());
}

// ── Home page and bookmarklet ────────────────────────────────────────────

async fn get_text(router: axum::Router, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn home_page_links_the_bookmarklet() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let (status, content_type, body) = get_text(harness.router(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert!(body.contains("/static/bookmarklet.js"));
}

#[tokio::test]
async fn bookmarklet_script_posts_to_summarize() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let (status, content_type, body) =
        get_text(harness.router(), "/static/bookmarklet.js").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("application/javascript"));
    assert!(body.contains("/api/summarize"));
    assert!(harness.markdown.prompts.lock().unwrap().is_empty());
}

// ── /health ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_version() {
    let harness = Harness::new(FakeCompletion::ok("unused"));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
