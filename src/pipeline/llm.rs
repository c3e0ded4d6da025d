//! Completion clients: send a [`Prompt`] to a language model, get text back.
//!
//! Two wire protocols are supported behind the [`CompletionClient`] trait:
//!
//! * [`ChatClient`] — OpenAI-style `chat/completions`; one synchronous
//!   response carrying one generated message.
//! * [`SseClient`] — Vertex-style `streamGenerateContent?alt=sse`; the body
//!   arrives as server-sent events, each `data:` line a JSON chunk.
//!
//! Neither client retries. A missing credential is detected at call time and
//! reported as [`ClipError::MissingCredential`] so the orchestrator can tell a
//! broken deployment apart from a flaky service.

use crate::config::{CompletionConfig, CompletionProtocol, StreamPolicy};
use crate::error::ClipError;
use crate::output::CompletionResult;
use crate::prompts::Prompt;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Per-call sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl From<&CompletionConfig> for CompletionOptions {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A text-completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate text for `prompt`.
    async fn complete(
        &self,
        prompt: &Prompt,
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ClipError>;
}

/// Instantiate the client matching `config.protocol`.
pub fn client_for(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>, ClipError> {
    let client: Arc<dyn CompletionClient> = match config.protocol {
        CompletionProtocol::Chat => Arc::new(ChatClient::new(config)?),
        CompletionProtocol::StreamSse => Arc::new(SseClient::new(config)?),
    };
    Ok(client)
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ClipError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClipError::Internal(format!("HTTP client: {e}")))
}

fn require_key<'a>(key: &'a Option<String>, name: &'static str) -> Result<&'a str, ClipError> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ClipError::MissingCredential {
            name,
            hint: credential_hint(name),
        })
}

/// Human-readable message for a missing credential.
pub fn credential_hint(name: &str) -> String {
    let service = match name {
        "OPENAI_API_KEY" => "OpenAI",
        "VERTEX_API_KEY" => "Vertex AI",
        _ => "Completion service",
    };
    format!("{service} API key is not set. Please set the {name} environment variable.")
}

fn transport_error(e: reqwest::Error, timeout_secs: u64) -> ClipError {
    if e.is_timeout() {
        ClipError::CompletionTimeout { secs: timeout_secs }
    } else {
        ClipError::CompletionFailed {
            message: e.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["message"].as_str())
                .or_else(|| v["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "unknown API error".to_string()
            } else {
                trimmed.chars().take(300).collect()
            }
        })
}

// ── 1. Chat (synchronous) ────────────────────────────────────────────────

/// OpenAI-compatible `chat/completions` client.
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
    api_key_name: &'static str,
    timeout_secs: u64,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, ClipError> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_key_name: config.api_key_name,
            timeout_secs: config.timeout_secs,
            http: http_client(config.timeout_secs)?,
        })
    }
}

/// Build the `chat/completions` request body.
pub fn chat_request_body(prompt: &Prompt, options: &CompletionOptions) -> Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &prompt.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": prompt.user}));

    let mut body = json!({
        "model": options.model,
        "messages": messages,
        "temperature": options.temperature,
    });
    if let Some(max) = options.max_tokens {
        body["max_completion_tokens"] = json!(max);
    }
    body
}

/// Extract the generated message from a `chat/completions` response.
pub fn parse_chat_response(body: &Value) -> Result<CompletionResult, ClipError> {
    match body["choices"][0]["message"]["content"].as_str() {
        Some(text) if !text.trim().is_empty() => Ok(CompletionResult {
            raw_text: text.to_string(),
        }),
        _ => Err(ClipError::EmptyCompletion),
    }
}

#[async_trait]
impl CompletionClient for ChatClient {
    async fn complete(
        &self,
        prompt: &Prompt,
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ClipError> {
        let key = require_key(&self.api_key, self.api_key_name)?;
        let url = format!("{}/chat/completions", self.base_url);
        let start = Instant::now();
        info!("Requesting chat completion from model {}", options.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&chat_request_body(prompt, options))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        if !status.is_success() {
            return Err(ClipError::CompletionStatus {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| ClipError::CompletionFailed {
            message: format!("response is not JSON: {e}"),
        })?;
        let result = parse_chat_response(&body)?;
        debug!(
            "Chat completion: {} chars in {:?}",
            result.raw_text.len(),
            start.elapsed()
        );
        Ok(result)
    }
}

// ── 2. Server-sent events (streamed) ─────────────────────────────────────

/// Vertex AI / Gemini `streamGenerateContent` client.
pub struct SseClient {
    base_url: String,
    api_key: Option<String>,
    api_key_name: &'static str,
    timeout_secs: u64,
    policy: StreamPolicy,
    http: reqwest::Client,
}

impl SseClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, ClipError> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_key_name: config.api_key_name,
            timeout_secs: config.timeout_secs,
            policy: config.stream_policy,
            http: http_client(config.timeout_secs)?,
        })
    }
}

/// Build the `streamGenerateContent` request body.
pub fn sse_request_body(prompt: &Prompt, options: &CompletionOptions) -> Value {
    let mut generation = json!({ "temperature": options.temperature });
    if let Some(max) = options.max_tokens {
        generation["maxOutputTokens"] = json!(max);
    }
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
        "generationConfig": generation,
    });
    if let Some(system) = &prompt.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

/// Concatenated text of every part of the first candidate in one event.
pub fn event_text(event: &Value) -> Option<String> {
    let parts = event["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    (!text.is_empty()).then_some(text)
}

/// Incremental splitter for a `text/event-stream` body.
///
/// Bytes arrive in arbitrary network chunks; lines may straddle chunk
/// boundaries. Only `data:` payloads are yielded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every `data:` payload completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(p) = data_payload(&line) {
                payloads.push(p);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let payload = line.strip_prefix("data:")?.trim_start();
    (!payload.is_empty() && payload != "[DONE]").then(|| payload.to_string())
}

/// Accumulates event text according to a [`StreamPolicy`].
#[derive(Debug)]
pub struct StreamCollector {
    policy: StreamPolicy,
    text: String,
    events: usize,
}

impl StreamCollector {
    pub fn new(policy: StreamPolicy) -> Self {
        Self {
            policy,
            text: String::new(),
            events: 0,
        }
    }

    /// Consume one `data:` payload. Returns `true` once no further events
    /// are wanted.
    pub fn accept(&mut self, payload: &str) -> Result<bool, ClipError> {
        let event: Value = serde_json::from_str(payload).map_err(|e| ClipError::CompletionFailed {
            message: format!("malformed stream event: {e}"),
        })?;
        if let Some(message) = event["error"]["message"].as_str() {
            return Err(ClipError::CompletionFailed {
                message: message.to_string(),
            });
        }
        self.events += 1;
        if let Some(text) = event_text(&event) {
            self.text.push_str(&text);
            if self.policy == StreamPolicy::FirstChunk {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn finish(self) -> Result<CompletionResult, ClipError> {
        debug!("Stream produced {} events", self.events);
        if self.text.trim().is_empty() {
            return Err(ClipError::EmptyCompletion);
        }
        Ok(CompletionResult {
            raw_text: self.text,
        })
    }
}

#[async_trait]
impl CompletionClient for SseClient {
    async fn complete(
        &self,
        prompt: &Prompt,
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ClipError> {
        let key = require_key(&self.api_key, self.api_key_name)?;
        let url = format!("{}:streamGenerateContent?alt=sse", self.base_url);
        let start = Instant::now();
        info!("Requesting streamed completion ({:?})", self.policy);

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&sse_request_body(prompt, options))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClipError::CompletionStatus {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let mut decoder = SseDecoder::new();
        let mut collector = StreamCollector::new(self.policy);
        let mut body = response.bytes_stream();

        let mut satisfied = false;
        'read: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| transport_error(e, self.timeout_secs))?;
            for payload in decoder.push(&chunk) {
                if collector.accept(&payload)? {
                    satisfied = true;
                    break 'read;
                }
            }
        }
        // Only flush a trailing partial line when the stream ran to its end.
        if !satisfied {
            if let Some(payload) = decoder.finish() {
                collector.accept(&payload)?;
            }
        }

        let result = collector.finish()?;
        debug!(
            "Streamed completion: {} chars in {:?}",
            result.raw_text.len(),
            start.elapsed()
        );
        Ok(result)
    }
}
