//! Rich-text rendering seam.
//!
//! Rendering is a pure text-in, text-out transformation applied to
//! configured rich-text fields after coercion. It is deliberately a trait:
//! the pipeline does not care which markup engine sits behind it, and a
//! render failure is never fatal -- the payload builder falls back to the
//! unrendered text.

use thiserror::Error;

/// Failure of a markup renderer. Non-fatal for the node: the original text
/// is kept instead.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("markup rendering failed: {message}")]
pub struct MarkupError {
    pub message: String,
}

/// A pure text transformation for rich-text fields.
pub trait MarkupRenderer {
    fn render(&self, text: &str) -> Result<String, MarkupError>;
}

/// No-op renderer: text passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl MarkupRenderer for PlainText {
    fn render(&self, text: &str) -> Result<String, MarkupError> {
        Ok(text.to_owned())
    }
}

/// Minimal HTML renderer: escapes markup characters, turns blank-line
/// separated blocks into paragraphs and single newlines into `<br>`.
///
/// This is not a markdown engine; a real one can implement
/// [`MarkupRenderer`] and slot in unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicHtml;

impl MarkupRenderer for BasicHtml {
    fn render(&self, text: &str) -> Result<String, MarkupError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let paragraphs: Vec<String> = text
            .split("\n\n")
            .filter(|block| !block.trim().is_empty())
            .map(|block| {
                let escaped = escape_html(block.trim_end());
                format!("<p>{}</p>", escaped.replace('\n', "<br>"))
            })
            .collect();

        Ok(paragraphs.join("\n"))
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
