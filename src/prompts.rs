//! Prompts for the two summary modes.
//!
//! Every instruction the model sees is defined here so that prompt
//! regressions can be caught by plain unit tests without a live model.
//!
//! The structured prompt is load-bearing: the completion clients do not ask
//! the service for a JSON response format, so the only thing keeping the
//! output parseable is the model obeying the "return ONLY a JSON object"
//! instruction below.

use crate::output::{SummaryMode, SummaryRequestContext};

/// System message for free-form webpage summaries.
pub const MARKDOWN_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes web content into concise markdown summaries. Your summaries are clear, well-organized, and capture the key points from the source material.";

/// Instruction prefix for structured extraction. The document text follows
/// after a blank line.
pub const STRUCTURED_INSTRUCTION: &str = "Extract the following fields from this academic paper: \
title (string), authors (array), abstract (string), summary (string), methodology (string), \
conclusion (string), tags (array of keywords). \
Return ONLY a valid JSON object with these keys and no extra text.";

/// A rendered prompt: an optional system message plus the user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

/// Render the prompt for `context`. Pure: identical input, identical output.
pub fn build_prompt(context: &SummaryRequestContext) -> Prompt {
    match context.mode {
        SummaryMode::StructuredFields => Prompt {
            system: None,
            user: format!("{}\n\n{}", STRUCTURED_INSTRUCTION, context.body_text),
        },
        SummaryMode::FreeformMarkdown => Prompt {
            system: Some(MARKDOWN_SYSTEM_PROMPT.to_string()),
            user: markdown_user_message(
                context.title.as_deref().unwrap_or_default(),
                context.url.as_deref().unwrap_or_default(),
                context.body_text.as_str(),
            ),
        },
    }
}

fn markdown_user_message(title: &str, url: &str, content: &str) -> String {
    format!(
        "Please summarize the following web content from '{title}' ({url}).\n\n\
Content:\n{content}\n\n\
Create a concise, well-structured markdown summary with appropriate headings and bullet points where needed. \
Focus on the most important information."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{PlainText, SUMMARY_KEYS};

    fn ctx(mode: SummaryMode) -> SummaryRequestContext {
        SummaryRequestContext {
            title: Some("Test Title".into()),
            url: Some("https://example.com".into()),
            body_text: PlainText::from_lines(["This is test content"]),
            mode,
        }
    }

    #[test]
    fn markdown_prompt_frames_title_and_url() {
        let p = build_prompt(&ctx(SummaryMode::FreeformMarkdown));
        assert_eq!(p.system.as_deref(), Some(MARKDOWN_SYSTEM_PROMPT));
        assert!(p.user.contains("'Test Title' (https://example.com)"));
        assert!(p.user.contains("This is test content"));
        assert!(p.user.to_lowercase().contains("summarize"));
        assert!(p.user.contains("headings and bullet points"));
    }

    #[test]
    fn structured_prompt_names_every_key_and_demands_json_only() {
        let p = build_prompt(&ctx(SummaryMode::StructuredFields));
        assert!(p.system.is_none());
        for key in SUMMARY_KEYS {
            assert!(p.user.contains(key), "missing key {key}");
        }
        assert!(p.user.contains("authors (array)"));
        assert!(p.user.contains("tags (array of keywords)"));
        assert!(p.user.contains("Return ONLY a valid JSON object"));
        assert!(p.user.ends_with("This is test content"));
    }

    #[test]
    fn prompts_are_deterministic() {
        for mode in [SummaryMode::FreeformMarkdown, SummaryMode::StructuredFields] {
            assert_eq!(build_prompt(&ctx(mode)), build_prompt(&ctx(mode)));
        }
    }

    #[test]
    fn missing_title_and_url_render_empty() {
        let mut c = ctx(SummaryMode::FreeformMarkdown);
        c.title = None;
        c.url = None;
        let p = build_prompt(&c);
        assert!(p.user.contains("from '' ()"));
    }
}
