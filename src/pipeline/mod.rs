//! Pipeline stages for web-clip summarisation.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own. Only [`input`] and [`llm`] perform network I/O.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (prompt) ──▶ llm ──▶ response ──▶ blocks
//! (URL/path) (HTML/PDF)             (chat/SSE) (parse)    (Notion body)
//! ```
//!
//! 1. [`input`]    — fetch a URL or read a local file; infer HTML vs PDF
//!    from the suffix
//! 2. [`extract`]  — reduce the document to plain text; runs in
//!    `spawn_blocking` because parsing is CPU-bound
//! 3. [`llm`]      — send the prompt built by [`crate::prompts`] to a
//!    completion service
//! 4. [`response`] — map raw model text to Markdown or a structured summary
//! 5. [`blocks`]   — lay a structured summary out as heading/paragraph pairs

pub mod blocks;
pub mod extract;
pub mod input;
pub mod llm;
pub mod response;
