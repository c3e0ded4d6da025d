//! Error types for the clipsum library.
//!
//! A single fatal error type, [`ClipError`], covers every stage of the
//! summarisation pipeline. Callers rarely care about the exact variant; they
//! care about *which class* of failure happened, because each class maps to a
//! different externally visible outcome:
//!
//! * [`ErrorKind::Configuration`] — the deployment itself is broken (missing
//!   credential). Never downgraded into a partial response.
//! * [`ErrorKind::Extraction`] / [`ErrorKind::Completion`] — the source or the
//!   model service misbehaved. The webpage flow degrades gracefully.
//! * [`ErrorKind::MalformedSummary`] — the model answered but ignored the
//!   output contract. Distinct from transport failures on purpose.
//! * [`ErrorKind::Publish`] — the document store rejected the page. Reported
//!   as `published: false`, not as a request failure.
//!
//! Use [`ClipError::kind`] to branch; never match on message text.

use thiserror::Error;

/// Coarse classification of a [`ClipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    InvalidRequest,
    Extraction,
    Completion,
    MalformedSummary,
    Publish,
    Internal,
}

/// All fatal errors returned by the clipsum library.
#[derive(Debug, Error)]
pub enum ClipError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// A credential required by the called component is absent.
    #[error("{hint}")]
    MissingCredential { name: &'static str, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Request errors ────────────────────────────────────────────────────
    /// The inbound request is missing a required value.
    #[error("{0}")]
    InvalidRequest(String),

    // ── Source / extraction errors ────────────────────────────────────────
    /// Fetching the source URL failed (connection error or non-2xx status).
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Fetching the source URL exceeded the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s")]
    FetchTimeout { url: String, secs: u64 },

    /// The source was declared as PDF but does not start with `%PDF`.
    #[error("Source '{url}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { url: String, magic: Vec<u8> },

    /// The markup could not be turned into text.
    #[error("HTML extraction failed: {0}")]
    HtmlParse(String),

    /// The PDF byte stream could not be decoded.
    #[error("PDF extraction failed: {0}")]
    PdfParse(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The completion service was unreachable or the transport failed.
    #[error("Completion request failed: {message}")]
    CompletionFailed { message: String },

    /// The completion service answered with a non-success status.
    #[error("Completion API error [{status}]: {message}")]
    CompletionStatus { status: u16, message: String },

    /// The completion call exceeded the configured timeout.
    #[error("Completion request timed out after {secs}s")]
    CompletionTimeout { secs: u64 },

    /// The completion service answered successfully but generated nothing.
    #[error("Completion response contained no generated content")]
    EmptyCompletion,

    /// The model output did not parse as the requested structure.
    #[error("Model output is not a valid JSON object: {detail}")]
    MalformedSummary { detail: String },

    // ── Publish errors ────────────────────────────────────────────────────
    /// The document store rejected or failed a request.
    #[error("Document store error [{status}]: {message}")]
    PublishFailed { status: u16, message: String },

    // ── Host errors ───────────────────────────────────────────────────────
    /// No clipboard tool accepted the text.
    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClipError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClipError::MissingCredential { .. } | ClipError::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            ClipError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ClipError::FetchFailed { .. }
            | ClipError::FetchTimeout { .. }
            | ClipError::NotAPdf { .. }
            | ClipError::HtmlParse(_)
            | ClipError::PdfParse(_) => ErrorKind::Extraction,
            ClipError::CompletionFailed { .. }
            | ClipError::CompletionStatus { .. }
            | ClipError::CompletionTimeout { .. }
            | ClipError::EmptyCompletion => ErrorKind::Completion,
            ClipError::MalformedSummary { .. } => ErrorKind::MalformedSummary,
            ClipError::PublishFailed { .. } => ErrorKind::Publish,
            ClipError::Clipboard(_) | ClipError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` for errors that indicate a broken deployment rather than a
    /// misbehaving source or service.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_displays_hint_verbatim() {
        let e = ClipError::MissingCredential {
            name: "OPENAI_API_KEY",
            hint: "OpenAI API key is not set".into(),
        };
        assert_eq!(e.to_string(), "OpenAI API key is not set");
        assert!(e.is_configuration());
    }

    #[test]
    fn malformed_summary_is_not_a_completion_error() {
        let e = ClipError::MalformedSummary {
            detail: "expected value at line 1 column 1".into(),
        };
        assert_eq!(e.kind(), ErrorKind::MalformedSummary);
        assert_ne!(e.kind(), ErrorKind::Completion);
    }

    #[test]
    fn fetch_errors_are_extraction_errors() {
        let e = ClipError::FetchTimeout {
            url: "https://example.com/a.pdf".into(),
            secs: 30,
        };
        assert_eq!(e.kind(), ErrorKind::Extraction);
        assert!(e.to_string().contains("30s"));

        let e = ClipError::NotAPdf {
            url: "https://example.com/a.pdf".into(),
            magic: b"<htm".to_vec(),
        };
        assert_eq!(e.kind(), ErrorKind::Extraction);
    }

    #[test]
    fn completion_status_display() {
        let e = ClipError::CompletionStatus {
            status: 503,
            message: "overloaded".into(),
        };
        assert!(e.to_string().contains("503"));
        assert!(e.to_string().contains("overloaded"));
        assert_eq!(e.kind(), ErrorKind::Completion);
    }

    #[test]
    fn publish_failed_kind() {
        let e = ClipError::PublishFailed {
            status: 401,
            message: "API token is invalid.".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Publish);
        assert!(!e.is_configuration());
    }
}
