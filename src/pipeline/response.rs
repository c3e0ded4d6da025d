//! Response mapping: raw model text → summary value.
//!
//! The mode chosen when the prompt was built decides the parse path. Markdown
//! is passed through untouched. Structured output must be a JSON object; no
//! key is required and no fallback is inserted here, so a caller holding the
//! [`StructuredSummary`] still sees absent keys as absent.

use crate::error::ClipError;
use crate::output::{CompletionResult, FieldValue, StructuredSummary, SummaryMode};
use serde_json::Value;
use tracing::warn;

/// A mapped model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutput {
    Markdown(String),
    Structured(StructuredSummary),
}

/// Map `result` according to `mode`.
pub fn map_response(mode: SummaryMode, result: CompletionResult) -> Result<SummaryOutput, ClipError> {
    match mode {
        SummaryMode::FreeformMarkdown => Ok(SummaryOutput::Markdown(parse_markdown(result.raw_text))),
        SummaryMode::StructuredFields => parse_structured(&result.raw_text).map(SummaryOutput::Structured),
    }
}

/// Free-form mode: identity.
pub fn parse_markdown(raw_text: String) -> String {
    raw_text
}

/// Structured mode: parse `raw_text` as a JSON object.
pub fn parse_structured(raw_text: &str) -> Result<StructuredSummary, ClipError> {
    let value: Value = serde_json::from_str(raw_text).map_err(|e| {
        warn!("Model output is not JSON ({} chars): {}", raw_text.len(), e);
        ClipError::MalformedSummary {
            detail: e.to_string(),
        }
    })?;

    let Value::Object(map) = value else {
        return Err(ClipError::MalformedSummary {
            detail: format!("expected a JSON object, got {}", json_type(&value)),
        });
    };

    let mut summary = StructuredSummary::new();
    for (key, value) in map {
        if let Some(field) = FieldValue::from_json(value) {
            summary.insert(key, field);
        }
    }
    Ok(summary)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
