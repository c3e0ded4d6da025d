//! Data model shared by the pipeline stages and the orchestrator.
//!
//! Every value here lives for exactly one request: it is created by one stage,
//! consumed by the next, and dropped when the response is written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Extraction ───────────────────────────────────────────────────────────

/// Declared format of a raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Html,
    Pdf,
}

impl SourceKind {
    /// Infer the kind from a URL or path suffix: `.pdf` (any case) is PDF,
    /// everything else is HTML. The body is never inspected.
    pub fn from_locator(locator: &str) -> Self {
        if locator.to_ascii_lowercase().ends_with(".pdf") {
            SourceKind::Pdf
        } else {
            SourceKind::Html
        }
    }
}

/// A raw document awaiting extraction.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub raw_document: Vec<u8>,
    pub source_kind: SourceKind,
    pub source_url: Option<String>,
}

impl ExtractionRequest {
    /// Wrap an HTML string supplied directly by the caller.
    pub fn html(html: impl Into<String>, source_url: Option<String>) -> Self {
        Self {
            raw_document: html.into().into_bytes(),
            source_kind: SourceKind::Html,
            source_url,
        }
    }

    /// Wrap PDF bytes.
    pub fn pdf(bytes: Vec<u8>, source_url: Option<String>) -> Self {
        Self {
            raw_document: bytes,
            source_kind: SourceKind::Pdf,
            source_url,
        }
    }
}

/// Readable text produced by the extractor.
///
/// Contains no script or style content; every line is trimmed and no line
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlainText(String);

impl PlainText {
    /// Build from lines, trimming each and dropping the empty ones.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .filter_map(|l| {
                let t = l.as_ref().trim();
                (!t.is_empty()).then(|| t.to_string())
            })
            .collect::<Vec<_>>()
            .join("\n");
        PlainText(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for PlainText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Prompting ────────────────────────────────────────────────────────────

/// Output contract requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Concise Markdown with headings and bullets.
    FreeformMarkdown,
    /// A JSON object with the seven [`SUMMARY_KEYS`].
    StructuredFields,
}

/// Everything the prompt builder needs for one request.
#[derive(Debug, Clone)]
pub struct SummaryRequestContext {
    pub title: Option<String>,
    pub url: Option<String>,
    pub body_text: PlainText,
    pub mode: SummaryMode,
}

/// Raw text generated by the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub raw_text: String,
}

// ── Structured summary ───────────────────────────────────────────────────

/// The recognised keys of a [`StructuredSummary`], in block order after
/// `title`.
pub const SUMMARY_KEYS: [&str; 7] = [
    "title",
    "authors",
    "abstract",
    "summary",
    "methodology",
    "conclusion",
    "tags",
];

/// A single field of a structured summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Convert an arbitrary JSON value. Strings and arrays map directly;
    /// scalars are rendered as text; `null` is treated as absent.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Array(items) => Some(FieldValue::List(
                items
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            other => Some(FieldValue::Text(other.to_string())),
        }
    }

    /// Flatten to display text: lists are joined with `", "`.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

/// Model output for structured mode.
///
/// Absent keys stay absent; the `"N/A"` fallback is applied only when blocks
/// are built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredSummary {
    fields: BTreeMap<String, FieldValue>,
}

impl StructuredSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `title` field rendered as text, if present and non-blank.
    pub fn title(&self) -> Option<String> {
        self.get("title")
            .map(FieldValue::render)
            .filter(|t| !t.trim().is_empty())
    }
}

// ── Document blocks ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
}

/// One block of a published page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl DocumentBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
        }
    }
}

// ── Orchestrator outcomes ────────────────────────────────────────────────

/// Result of the webpage flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebpageOutcome {
    /// The model produced a summary.
    Summarised {
        summary: String,
        clipboard_copied: bool,
    },
    /// Something other than configuration failed; `summary` is a placeholder
    /// that still carries the page title.
    Degraded { error: String, summary: String },
}

/// Result of the ingest flow.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub title: String,
    pub summary: StructuredSummary,
    pub published: bool,
    pub publish_error: Option<String>,
}

/// A page the caller can publish under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_from_suffix_is_case_insensitive() {
        assert_eq!(SourceKind::from_locator("https://x/paper.PDF"), SourceKind::Pdf);
        assert_eq!(SourceKind::from_locator("https://x/paper.pdf"), SourceKind::Pdf);
        assert_eq!(SourceKind::from_locator("https://x/pdf"), SourceKind::Html);
        assert_eq!(SourceKind::from_locator("https://x/a.pdf?dl=1"), SourceKind::Html);
    }

    #[test]
    fn plain_text_drops_blank_lines_and_trims() {
        let t = PlainText::from_lines(["  a ", "", "\t", "b"]);
        assert_eq!(t.as_str(), "a\nb");
    }

    #[test]
    fn field_value_from_json() {
        assert_eq!(
            FieldValue::from_json(json!("x")),
            Some(FieldValue::Text("x".into()))
        );
        assert_eq!(
            FieldValue::from_json(json!(["a", 1, null])),
            Some(FieldValue::List(vec!["a".into(), "1".into()]))
        );
        assert_eq!(FieldValue::from_json(json!(2024)), Some(FieldValue::Text("2024".into())));
        assert_eq!(FieldValue::from_json(json!(null)), None);
    }

    #[test]
    fn list_renders_comma_joined() {
        let v = FieldValue::List(vec!["Ada".into(), "Grace".into()]);
        assert_eq!(v.render(), "Ada, Grace");
    }

    #[test]
    fn blank_title_is_none() {
        let s = StructuredSummary::new().with("title", FieldValue::Text("  ".into()));
        assert_eq!(s.title(), None);
    }

    #[test]
    fn structured_summary_serialises_as_plain_object() {
        let s = StructuredSummary::new()
            .with("title", FieldValue::Text("T".into()))
            .with("tags", FieldValue::List(vec!["x".into()]));
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({"title": "T", "tags": ["x"]})
        );
    }
}
