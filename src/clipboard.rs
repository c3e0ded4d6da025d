//! Host clipboard access.
//!
//! No native clipboard binding is linked; [`SystemClipboard`] pipes the text
//! into whichever platform tool is installed. Callers treat a failure as a
//! `false` flag, never as a request failure.

use crate::error::ClipError;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Something that can receive a copy of the summary.
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), ClipError>;
}

/// Platform clipboard tools, tried in order.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("clip", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Clipboard backed by the first working platform tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipError> {
        let mut failures = Vec::new();
        for (program, args) in CLIPBOARD_TOOLS {
            match pipe_into(program, args, text) {
                Ok(()) => {
                    debug!("Copied {} chars via {}", text.len(), program);
                    return Ok(());
                }
                Err(reason) => failures.push(format!("{program}: {reason}")),
            }
        }
        Err(ClipError::Clipboard(failures.join("; ")))
    }
}

fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<(), String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| e.to_string())?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()) {
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.to_string());
        }
    }

    let status = child.wait().map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("exited with {status}"))
    }
}

/// Clipboard that accepts nothing. Used by servers without a desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClipboard;

impl Clipboard for NoopClipboard {
    fn copy(&self, _text: &str) -> Result<(), ClipError> {
        Err(ClipError::Clipboard("clipboard disabled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_never_copies() {
        let err = NoopClipboard.copy("text").unwrap_err();
        assert!(matches!(err, ClipError::Clipboard(_)));
    }

    #[test]
    fn missing_program_is_reported() {
        let err = pipe_into("clipsum-no-such-clipboard-tool", &[], "x").unwrap_err();
        assert!(!err.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn tool_that_closes_stdin_early_is_reaped_and_reported() {
        // Larger than any pipe buffer, so the write outlives `true`.
        let text = "x".repeat(4 * 1024 * 1024);
        let err = pipe_into("true", &[], &text).unwrap_err();
        assert!(err.to_lowercase().contains("broken pipe"), "{err}");
    }
}
