//! Structured summary → document blocks.
//!
//! Output order is fixed by [`BLOCK_KEYS`], never by the order the model
//! emitted its keys. `title` is not part of the body; the orchestrator maps it
//! to the page title property instead.

use crate::output::{DocumentBlock, FieldValue, StructuredSummary};

/// Keys rendered into the page body, in order.
pub const BLOCK_KEYS: [&str; 6] = [
    "authors",
    "abstract",
    "summary",
    "methodology",
    "conclusion",
    "tags",
];

/// Paragraph text used for absent or empty fields.
pub const MISSING_FIELD: &str = "N/A";

/// Build a heading + paragraph pair for every key in [`BLOCK_KEYS`].
pub fn build_blocks(summary: &StructuredSummary) -> Vec<DocumentBlock> {
    let mut blocks = Vec::with_capacity(BLOCK_KEYS.len() * 2);
    for key in BLOCK_KEYS {
        blocks.push(DocumentBlock::heading(capitalize(key)));
        blocks.push(DocumentBlock::paragraph(resolve(summary.get(key))));
    }
    blocks
}

fn resolve(value: Option<&FieldValue>) -> String {
    match value.map(FieldValue::render) {
        Some(text) if !text.is_empty() => text,
        _ => MISSING_FIELD.to_string(),
    }
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
