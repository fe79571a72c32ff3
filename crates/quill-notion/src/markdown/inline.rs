//! Rich text runs to inline markdown.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::types::RichText;

/// Characters that would end or split a markdown link destination.
const LINK_TARGET: &AsciiSet = &CONTROLS.add(b' ').add(b'(').add(b')').add(b'<').add(b'>');

/// Render runs as inline markdown, concatenated in order.
#[must_use]
pub fn render_rich_text(runs: &[RichText]) -> String {
    runs.iter().map(render_run).collect()
}

/// Escape a URL for use as a markdown link or image destination.
#[must_use]
pub fn escape_link_target(url: &str) -> String {
    utf8_percent_encode(url, LINK_TARGET).to_string()
}

/// Escape text used as link or image label.
pub(crate) fn escape_label(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn render_run(run: &RichText) -> String {
    if let Some(expression) = run.equation_source() {
        let expression = expression.trim();
        return if expression.is_empty() {
            String::new()
        } else {
            format!("${expression}$")
        };
    }

    let text = run.plain_text.as_str();
    let core = text.trim();
    if core.is_empty() {
        return text.to_owned();
    }
    // Emphasis markers must hug non-whitespace, so surrounding spaces stay outside.
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let annotations = &run.annotations;
    let href = run.href.as_deref().filter(|h| !h.is_empty());
    let mut out = if annotations.code {
        code_span(core)
    } else if href.is_some() {
        escape_label(core)
    } else {
        core.to_owned()
    };
    if annotations.strikethrough {
        out = format!("~~{out}~~");
    }
    if annotations.italic {
        out = format!("*{out}*");
    }
    if annotations.bold {
        out = format!("**{out}**");
    }
    if let Some(href) = href {
        out = format!("[{out}]({})", escape_link_target(href));
    }

    format!("{lead}{out}{trail}")
}

/// Wrap text in a code span with a fence longer than any backtick run inside.
fn code_span(text: &str) -> String {
    let longest = longest_run(text, '`');
    if longest == 0 {
        return format!("`{text}`");
    }
    let fence = "`".repeat(longest + 1);
    format!("{fence} {text} {fence}")
}

/// Length of the longest run of `ch` in `text`.
pub(crate) fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
