//! Configuration types for the summarisation pipeline.
//!
//! Every credential and tuning knob lives in an explicit struct built once at
//! process start ([`AppConfig::from_env`] or the builders) and handed to each
//! component's constructor. Nothing below the binary reads the environment,
//! so every component can be exercised in tests with injected values.
//!
//! Two completion profiles exist because the two flows talk to different
//! services: the webpage flow uses a synchronous chat endpoint, the ingest
//! flow a server-sent-event stream.

use crate::error::ClipError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default OpenAI-compatible endpoint for the webpage summariser.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for the webpage summariser.
pub const DEFAULT_CHAT_MODEL: &str = "o4-mini";

/// Default Vertex AI region for the ingest flow.
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";

/// Default model for the ingest flow.
pub const DEFAULT_VERTEX_MODEL: &str = "models/gemini-1.5-flash-preview-0514";

/// Default Notion REST endpoint.
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// Notion API version header sent with every request.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

// ── Enums ────────────────────────────────────────────────────────────────

/// Which wire protocol the completion service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionProtocol {
    /// `POST {base}/chat/completions`, one synchronous message back. (default)
    #[default]
    Chat,
    /// `POST {base}:streamGenerateContent?alt=sse`, server-sent events back.
    StreamSse,
}

/// What to do with a multi-event SSE response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPolicy {
    /// Concatenate the text of every `data:` event. (default)
    #[default]
    Aggregate,
    /// Keep only the first event carrying text; drop the rest of the stream.
    FirstChunk,
}

/// Deployment environment. Side effects on the host (clipboard) are skipped
/// in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse the `ENVIRONMENT` variable. Only the literal `production`
    /// (case-insensitive) selects production.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

// ── Completion profile ───────────────────────────────────────────────────

/// Settings for one completion service.
///
/// Built via [`CompletionConfig::builder()`], or via the two presets
/// [`CompletionConfig::openai_chat`] and [`CompletionConfig::vertex_stream`].
///
/// # Example
/// ```rust
/// use clipsum::config::{CompletionConfig, CompletionProtocol};
///
/// let config = CompletionConfig::builder()
///     .protocol(CompletionProtocol::Chat)
///     .base_url("http://localhost:11434/v1")
///     .model("llama3.2")
///     .temperature(0.3)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llama3.2");
/// ```
#[derive(Clone)]
pub struct CompletionConfig {
    /// Wire protocol. Default: [`CompletionProtocol::Chat`].
    pub protocol: CompletionProtocol,

    /// Endpoint root. For `Chat` this is the OpenAI-style `/v1` root; for
    /// `StreamSse` it is the full model resource URL without the `:method`
    /// suffix.
    pub base_url: String,

    /// Bearer credential. `None` is only detected at call time, where it
    /// surfaces as [`ClipError::MissingCredential`].
    pub api_key: Option<String>,

    /// Name of the variable the credential comes from, used in error hints.
    pub api_key_name: &'static str,

    /// Model identifier sent in the request body (chat protocol only).
    pub model: String,

    /// Sampling temperature. Range 0.0–2.0.
    pub temperature: f32,

    /// Upper bound on generated tokens. `None` lets the service decide.
    pub max_tokens: Option<u32>,

    /// Whole-request timeout in seconds. Default: 60.
    pub timeout_secs: u64,

    /// SSE handling. Ignored by the chat protocol.
    pub stream_policy: StreamPolicy,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self::openai_chat(None)
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("protocol", &self.protocol)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("stream_policy", &self.stream_policy)
            .finish()
    }
}

impl CompletionConfig {
    /// Create a new builder starting from the OpenAI chat preset.
    pub fn builder() -> CompletionConfigBuilder {
        CompletionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Preset for the webpage summariser: OpenAI chat, `o4-mini`,
    /// temperature 0.5, at most 1000 completion tokens.
    pub fn openai_chat(api_key: Option<String>) -> Self {
        Self {
            protocol: CompletionProtocol::Chat,
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            api_key,
            api_key_name: "OPENAI_API_KEY",
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: Some(1000),
            timeout_secs: 60,
            stream_policy: StreamPolicy::default(),
        }
    }

    /// Preset for the ingest flow: Vertex AI `streamGenerateContent`,
    /// temperature 0.2.
    pub fn vertex_stream(
        project: Option<&str>,
        location: &str,
        model: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            protocol: CompletionProtocol::StreamSse,
            base_url: vertex_model_url(project.unwrap_or_default(), location, model),
            api_key,
            api_key_name: "VERTEX_API_KEY",
            model: model.to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout_secs: 60,
            stream_policy: StreamPolicy::default(),
        }
    }
}

/// Build the Vertex AI publisher-model resource URL.
pub fn vertex_model_url(project: &str, location: &str, model: &str) -> String {
    format!(
        "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}"
    )
}

/// Builder for [`CompletionConfig`].
#[derive(Debug)]
pub struct CompletionConfigBuilder {
    config: CompletionConfig,
}

impl CompletionConfigBuilder {
    /// Also switches the credential name used in error hints.
    pub fn protocol(mut self, protocol: CompletionProtocol) -> Self {
        self.config.protocol = protocol;
        self.config.api_key_name = match protocol {
            CompletionProtocol::Chat => "OPENAI_API_KEY",
            CompletionProtocol::StreamSse => "VERTEX_API_KEY",
        };
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: Option<u32>) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn stream_policy(mut self, policy: StreamPolicy) -> Self {
        self.config.stream_policy = policy;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompletionConfig, ClipError> {
        let c = &self.config;
        if c.base_url.trim().is_empty() {
            return Err(ClipError::InvalidConfig("base_url must not be empty".into()));
        }
        if c.protocol == CompletionProtocol::Chat && c.model.trim().is_empty() {
            return Err(ClipError::InvalidConfig(
                "model must not be empty for the chat protocol".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(ClipError::InvalidConfig("timeout_secs must be ≥ 1".into()));
        }
        if c.max_tokens == Some(0) {
            return Err(ClipError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Notion ───────────────────────────────────────────────────────────────

/// Settings for the document store.
#[derive(Clone)]
pub struct NotionConfig {
    /// API root. Default: `https://api.notion.com/v1`.
    pub api_base: String,
    /// Integration token used when a request does not carry its own.
    pub token: Option<String>,
    /// Parent page used when a request does not name one.
    pub default_parent_id: Option<String>,
    /// `Notion-Version` header value.
    pub version: String,
    /// `page_size` for page listing. Default: 20.
    pub search_page_size: u32,
    /// Per-request timeout in seconds. Default: 30.
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_NOTION_API_BASE.to_string(),
            token: None,
            default_parent_id: None,
            version: DEFAULT_NOTION_VERSION.to_string(),
            search_page_size: 20,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("default_parent_id", &self.default_parent_id)
            .field("version", &self.version)
            .field("search_page_size", &self.search_page_size)
            .finish()
    }
}

// ── Application ──────────────────────────────────────────────────────────

/// Top-level configuration for the service and the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Completion profile for free-form webpage summaries.
    pub summarize: CompletionConfig,
    /// Completion profile for structured paper extraction.
    pub ingest: CompletionConfig,
    /// Document store settings.
    pub notion: NotionConfig,
    /// Deployment environment. Default: development.
    pub environment: Environment,
    /// Timeout for fetching source URLs, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,
    /// Address the HTTP surface binds to. Default: `0.0.0.0:3000`.
    pub listen_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            summarize: CompletionConfig::openai_chat(None),
            ingest: CompletionConfig::vertex_stream(
                None,
                DEFAULT_VERTEX_LOCATION,
                DEFAULT_VERTEX_MODEL,
                None,
            ),
            notion: NotionConfig::default(),
            environment: Environment::default(),
            fetch_timeout_secs: 30,
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// Call once at start-up (after loading any `.env` file) and pass the
    /// result down.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut summarize = CompletionConfig::openai_chat(get("OPENAI_API_KEY"));
        if let Some(model) = get("OPENAI_MODEL") {
            summarize.model = model;
        }
        if let Some(base) = get("OPENAI_BASE_URL") {
            summarize.base_url = base;
        }

        let location = get("VERTEX_LOCATION").unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.into());
        let model = get("VERTEX_MODEL").unwrap_or_else(|| DEFAULT_VERTEX_MODEL.into());
        let ingest = CompletionConfig::vertex_stream(
            get("VERTEX_PROJECT").as_deref(),
            &location,
            &model,
            get("VERTEX_API_KEY"),
        );

        let notion = NotionConfig {
            token: get("NOTION_TOKEN"),
            default_parent_id: get("NOTION_PARENT_ID"),
            ..NotionConfig::default()
        };

        let environment = get("ENVIRONMENT")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        let port = get("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Self {
            summarize,
            ingest,
            notion,
            environment,
            fetch_timeout_secs: 30,
            listen_addr: format!("0.0.0.0:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn openai_preset_matches_webpage_defaults() {
        let c = CompletionConfig::openai_chat(None);
        assert_eq!(c.protocol, CompletionProtocol::Chat);
        assert_eq!(c.model, "o4-mini");
        assert_eq!(c.temperature, 0.5);
        assert_eq!(c.max_tokens, Some(1000));
        assert!(c.api_key.is_none());
    }

    #[test]
    fn vertex_preset_builds_resource_url() {
        let c = CompletionConfig::vertex_stream(Some("proj"), "europe-west4", "gemini-pro", None);
        assert_eq!(c.protocol, CompletionProtocol::StreamSse);
        assert_eq!(
            c.base_url,
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/proj/locations/europe-west4/publishers/google/models/gemini-pro"
        );
        assert_eq!(c.temperature, 0.2);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = CompletionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = CompletionConfig::builder().timeout_secs(0).build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = CompletionConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn from_lookup_reads_every_setting() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("VERTEX_PROJECT", "p"),
            ("VERTEX_API_KEY", "v-1"),
            ("NOTION_TOKEN", "secret_n"),
            ("NOTION_PARENT_ID", "abc"),
            ("ENVIRONMENT", "Production"),
            ("PORT", "8080"),
        ]));
        assert_eq!(cfg.summarize.api_key.as_deref(), Some("sk-1"));
        assert_eq!(cfg.summarize.model, "gpt-4.1-mini");
        assert_eq!(cfg.ingest.api_key.as_deref(), Some("v-1"));
        assert!(cfg.ingest.base_url.contains("/projects/p/"));
        assert_eq!(cfg.notion.token.as_deref(), Some("secret_n"));
        assert_eq!(cfg.notion.default_parent_id.as_deref(), Some("abc"));
        assert!(cfg.environment.is_production());
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
    }

    #[test]
    fn from_lookup_treats_empty_as_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  "), ("ENVIRONMENT", "")]));
        assert!(cfg.summarize.api_key.is_none());
        assert_eq!(cfg.environment, Environment::Development);
    }

    #[test]
    fn only_literal_production_is_production() {
        assert!(Environment::parse("production").is_production());
        assert!(!Environment::parse("prod").is_production());
        assert!(!Environment::parse("development").is_production());
    }
}
