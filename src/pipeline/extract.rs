//! Text extraction: raw HTML or PDF bytes → [`PlainText`].
//!
//! HTML is parsed with `scraper` (html5ever), so malformed markup is repaired
//! the way a browser would rather than rejected. `script` and `style`
//! subtrees are dropped whole; every remaining text node becomes one trimmed
//! line with internal whitespace runs collapsed.
//!
//! PDF is decoded with `lopdf` and read page by page in page order. Decoding
//! is CPU-bound, so async callers go through [`extract_blocking`].

use crate::error::ClipError;
use crate::output::{ExtractionRequest, PlainText, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use tracing::{debug, warn};

/// Elements whose entire subtree (text included) never reaches the output.
const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extract readable text from `request` according to its declared kind.
pub fn extract(request: &ExtractionRequest) -> Result<PlainText, ClipError> {
    let text = match request.source_kind {
        SourceKind::Html => {
            let html = String::from_utf8_lossy(&request.raw_document);
            extract_html(&html)
        }
        SourceKind::Pdf => extract_pdf(&request.raw_document)?,
    };
    debug!(
        "Extracted {} chars of text from {:?} source {}",
        text.len(),
        request.source_kind,
        request.source_url.as_deref().unwrap_or("<inline>")
    );
    Ok(text)
}

/// Run [`extract`] on the blocking pool.
pub async fn extract_blocking(request: ExtractionRequest) -> Result<PlainText, ClipError> {
    tokio::task::spawn_blocking(move || extract(&request))
        .await
        .map_err(|e| ClipError::Internal(format!("extraction task panicked: {e}")))?
}

/// Extract text nodes from an HTML document, in document order.
pub fn extract_html(html: &str) -> PlainText {
    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                let collapsed = RE_WHITESPACE.replace_all(&text[..], " ");
                lines.push(collapsed.into_owned());
            }
            Node::Element(element) if SKIPPED_ELEMENTS.contains(&element.name()) => continue,
            _ => {}
        }
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    PlainText::from_lines(lines)
}

/// Extract per-page text from a PDF byte stream, pages joined by newline.
pub fn extract_pdf(bytes: &[u8]) -> Result<PlainText, ClipError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| ClipError::PdfParse(e.to_string()))?;
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(ClipError::PdfParse("document has no pages".into()));
    }

    let mut page_texts = Vec::with_capacity(pages.len());
    let mut last_err = None;
    for page_num in pages.keys() {
        match document.extract_text(&[*page_num]) {
            Ok(text) => page_texts.push(text),
            Err(e) => {
                warn!("PDF page {}: text extraction failed — {}", page_num, e);
                last_err = Some(e.to_string());
            }
        }
    }

    if page_texts.is_empty() {
        return Err(ClipError::PdfParse(
            last_err.unwrap_or_else(|| "no extractable text".into()),
        ));
    }

    let joined = page_texts.join("\n");
    Ok(PlainText::from_lines(joined.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a minimal PDF with one line of Courier text per page.
    fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Test Title</title>
            <style>.ignored { display: none; }</style>
        </head>
        <body>
            <h1>Main Heading</h1>
            <p>This is a    paragraph
               spanning lines.</p>
            <script>console.log('This should be ignored');</script>
            <div><span>nested</span> <b>text</b></div>
        </body>
        </html>
    "#;

    #[test]
    fn html_drops_script_and_style_text() {
        let text = extract_html(PAGE);
        assert!(text.as_str().contains("Main Heading"));
        assert!(text.as_str().contains("This is a paragraph spanning lines."));
        assert!(!text.as_str().contains("This should be ignored"));
        assert!(!text.as_str().contains(".ignored"));
        assert!(!text.as_str().contains("console.log"));
    }

    #[test]
    fn html_emits_one_trimmed_line_per_text_node_in_order() {
        let text = extract_html(PAGE);
        let lines: Vec<&str> = text.as_str().lines().collect();
        assert_eq!(
            lines,
            vec![
                "Test Title",
                "Main Heading",
                "This is a paragraph spanning lines.",
                "nested",
                "text"
            ]
        );
    }

    #[test]
    fn html_script_in_body_with_markup_like_text() {
        let text =
            extract_html("<html><body><h1>T</h1><script>bad()</script></body></html>");
        assert_eq!(text.as_str(), "T");
    }

    #[test]
    fn html_empty_document_is_empty_text() {
        assert!(extract_html("").is_empty());
        assert!(extract_html("<script>only()</script>").is_empty());
    }

    #[test]
    fn extract_dispatches_on_kind() {
        let req = ExtractionRequest::html("<p>hello</p>", None);
        assert_eq!(extract(&req).unwrap().as_str(), "hello");
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let req = ExtractionRequest::pdf(b"%PDF-1.4 garbage".to_vec(), None);
        let err = extract(&req).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
    }

    #[test]
    fn pdf_pages_are_joined_in_order() {
        let bytes = sample_pdf(&["First page", "Second page"]);
        let text = extract_pdf(&bytes).unwrap();
        let first = text.as_str().find("First page").expect("page 1 text");
        let second = text.as_str().find("Second page").expect("page 2 text");
        assert!(first < second);
    }

    #[tokio::test]
    async fn extract_blocking_matches_sync() {
        let req = ExtractionRequest::html("<div> a </div><style>b</style>", None);
        let text = extract_blocking(req).await.unwrap();
        assert_eq!(text.as_str(), "a");
    }
}
