//! HTTP surface.
//!
//! Thin `axum` layer over [`Summarizer`]: parse the body, call one
//! orchestrator operation, map the outcome or [`ErrorKind`] to a status code.
//! Bodies are parsed by hand so that a missing or malformed body becomes a
//! `400 {error}` in the same shape as every other failure.

use crate::error::{ClipError, ErrorKind};
use crate::output::{PageRef, WebpageOutcome};
use crate::summarize::Summarizer;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Message returned when `/api/summarize` has no `html`.
pub const MISSING_HTML: &str = "HTML content is required";

/// Landing page with the bookmarklet link.
pub const HOME_HTML: &str = include_str!("../static/index.html");

/// Script the bookmarklet loads from this server.
pub const BOOKMARKLET_JS: &str = include_str!("../static/bookmarklet.js");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
}

// ── Wire types ───────────────────────────────────────────────────────────

/// `POST /api/summarize` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    pub html: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

/// `POST /api/ingest` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestRequest {
    pub url: Option<String>,
    #[serde(rename = "notionKey")]
    pub notion_key: Option<String>,
    #[serde(rename = "notionParentId")]
    pub notion_parent_id: Option<String>,
}

/// `GET /api/pages` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagesQuery {
    #[serde(rename = "notionKey")]
    pub notion_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub clipboard_copied: bool,
}

#[derive(Debug, Serialize)]
pub struct PartialSummaryResponse {
    pub error: String,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub title: String,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ── Router ───────────────────────────────────────────────────────────────

/// Build the router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/", get(home))
        .route("/static/bookmarklet.js", get(bookmarklet))
        .route("/health", get(health))
        .route("/api/summarize", post(summarize))
        .route("/api/ingest", post(ingest))
        .route("/api/pages", get(pages))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `listen_addr` and serve until Ctrl-C.
pub async fn serve(summarizer: Arc<Summarizer>, listen_addr: &str) -> Result<(), ClipError> {
    let addr: SocketAddr = listen_addr
        .parse()
        .map_err(|e| ClipError::InvalidConfig(format!("listen address '{listen_addr}': {e}")))?;
    let app = create_router(AppState { summarizer });

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ClipError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| ClipError::Internal(format!("HTTP server error: {e}")))
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn home() -> Html<&'static str> {
    Html(HOME_HTML)
}

pub async fn bookmarklet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        BOOKMARKLET_JS,
    )
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn summarize(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_summarize_request(&body) {
        Ok(request) => request,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    let Some(html) = request.html.as_deref() else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_HTML);
    };
    debug!("Summarize request: {} bytes of HTML", html.len());

    let outcome = state
        .summarizer
        .summarize_webpage(html, request.url.as_deref(), request.title.as_deref())
        .await;

    match outcome {
        Ok(WebpageOutcome::Summarised {
            summary,
            clipboard_copied,
        }) => (
            StatusCode::OK,
            Json(SummaryResponse {
                summary,
                clipboard_copied,
            }),
        )
            .into_response(),
        Ok(WebpageOutcome::Degraded { error, summary }) => (
            StatusCode::PARTIAL_CONTENT,
            Json(PartialSummaryResponse { error, summary }),
        )
            .into_response(),
        Err(e) => {
            error!("Summarize failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// A body that is not a JSON object is treated as missing `html`; a present
/// field that is not a string is reported by name.
fn parse_summarize_request(body: &[u8]) -> Result<SummarizeRequest, String> {
    let object = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => object,
        _ => return Err(MISSING_HTML.to_string()),
    };
    let field = |name: &str| match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("'{name}' must be a string")),
    };
    Ok(SummarizeRequest {
        html: field("html")?,
        url: field("url")?,
        title: field("title")?,
    })
}

pub async fn ingest(State(state): State<AppState>, body: Bytes) -> Response {
    let request: IngestRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!("Ingest body not usable ({}); treating as empty", e);
        IngestRequest::default()
    });

    let outcome = state
        .summarizer
        .ingest(
            request.url.as_deref(),
            request.notion_key.as_deref(),
            request.notion_parent_id.as_deref(),
        )
        .await;

    match outcome {
        Ok(outcome) => (
            StatusCode::OK,
            Json(IngestResponse {
                status: "ok",
                title: outcome.title,
                published: outcome.published,
                publish_error: outcome.publish_error,
            }),
        )
            .into_response(),
        Err(e) => {
            let status = ingest_status(e.kind());
            warn!("Ingest failed ({}): {}", status, e);
            error_response(status, e.to_string())
        }
    }
}

fn ingest_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::MalformedSummary => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn pages(State(state): State<AppState>, Query(query): Query<PagesQuery>) -> Response {
    match state.summarizer.list_pages(query.notion_key.as_deref()).await {
        Ok(pages) => (StatusCode::OK, Json::<Vec<PageRef>>(pages)).into_response(),
        Err(e) => {
            let status = match e.kind() {
                ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            warn!("Page listing failed ({}): {}", status, e);
            error_response(status, e.to_string())
        }
    }
}
