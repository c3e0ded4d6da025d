//! Input resolution: turn a URL or local path into an [`ExtractionRequest`].
//!
//! The document kind is inferred from the locator suffix (`.pdf` → PDF,
//! anything else → HTML). This is a heuristic, not content sniffing; the only
//! content check is that a PDF must start with the `%PDF` signature so that
//! callers get a meaningful error instead of a parser failure.

use crate::error::ClipError;
use crate::output::{ExtractionRequest, SourceKind};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a URL (fetched over HTTP) or a local file path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ExtractionRequest, ClipError> {
    if is_url(input) {
        let client = fetch_client(timeout_secs)?;
        fetch_source(&client, input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Build the HTTP client used for source fetches.
pub fn fetch_client(timeout_secs: u64) -> Result<reqwest::Client, ClipError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("clipsum/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ClipError::Internal(format!("HTTP client: {e}")))
}

/// Download `url` and wrap the body for extraction.
pub async fn fetch_source(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<ExtractionRequest, ClipError> {
    info!("Fetching source: {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ClipError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ClipError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ClipError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ClipError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ClipError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);

    wrap(url, bytes.to_vec())
}

/// Read a local file and wrap it for extraction.
async fn read_local(path_str: &str) -> Result<ExtractionRequest, ClipError> {
    let path = PathBuf::from(path_str);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ClipError::FetchFailed {
            url: path.display().to_string(),
            reason: e.to_string(),
        })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    wrap(path_str, bytes)
}

fn wrap(locator: &str, bytes: Vec<u8>) -> Result<ExtractionRequest, ClipError> {
    let kind = SourceKind::from_locator(locator);
    if kind == SourceKind::Pdf && !bytes.starts_with(PDF_MAGIC) {
        return Err(ClipError::NotAPdf {
            url: locator.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(ExtractionRequest {
        raw_document: bytes,
        source_kind: kind,
        source_url: Some(locator.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/page"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.html"));
        assert!(!is_url(""));
    }

    #[test]
    fn wrap_rejects_pdf_without_signature() {
        let err = wrap("https://x/paper.pdf", b"<html>".to_vec()).unwrap_err();
        match err {
            ClipError::NotAPdf { magic, .. } => assert_eq!(magic, b"<htm".to_vec()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn wrap_accepts_html_without_inspection() {
        let req = wrap("https://x/page", b"%PDF-looking".to_vec()).unwrap();
        assert_eq!(req.source_kind, SourceKind::Html);
        assert_eq!(req.source_url.as_deref(), Some("https://x/page"));
    }

    #[tokio::test]
    async fn local_html_file_resolves() {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        file.write_all(b"<p>local</p>").unwrap();
        let req = resolve_input(file.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(req.source_kind, SourceKind::Html);
        assert_eq!(req.raw_document, b"<p>local</p>");
    }

    #[tokio::test]
    async fn missing_local_file_is_extraction_error() {
        let err = resolve_input("/definitely/not/here.html", 5).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
    }
}
