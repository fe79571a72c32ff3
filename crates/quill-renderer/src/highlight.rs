//! Syntax highlighting with class-based spans.

use std::fmt::Write;
use std::sync::LazyLock;

use syntect::html::{ClassStyle, line_tokens_to_classed_spans};
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::{debug, warn};

use crate::tree::escape_html;

/// Class prefix for highlighted tokens.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "token " };

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Highlight `source` line by line.
///
/// Each returned string is the HTML for one source line, including its line
/// ending, with every open token span closed at the end of the line. Unknown
/// or missing languages produce escaped plain lines.
pub(crate) fn highlight_lines(language: Option<&str>, source: &str) -> Vec<String> {
    let Some(syntax) = language.and_then(find_syntax) else {
        if let Some(language) = language {
            debug!("No syntax for language '{language}', emitting plain code");
        }
        return plain_lines(source);
    };

    match highlight_with(syntax, source) {
        Ok(lines) => lines,
        Err(e) => {
            warn!("Highlighting failed for '{}': {e}", syntax.name);
            plain_lines(source)
        }
    }
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    SYNTAX_SET
        .find_syntax_by_token(language)
        .or_else(|| SYNTAX_SET.find_syntax_by_token(&language.to_lowercase()))
}

fn highlight_with(
    syntax: &SyntaxReference,
    source: &str,
) -> Result<Vec<String>, syntect::Error> {
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut lines = Vec::new();

    for line in LinesWithEndings::from(source) {
        // Reopen scopes carried over from the previous line.
        let mut html = String::new();
        let carried = stack.as_slice().len();
        for scope in stack.as_slice() {
            write!(html, r#"<span class="{}">"#, scope_classes(&scope.build_string())).unwrap();
        }

        let ops = state.parse_line(line, &SYNTAX_SET)?;
        let (spans, delta) = line_tokens_to_classed_spans(line, &ops, CLASS_STYLE, &mut stack)?;
        html.push_str(&spans);

        let open = isize::try_from(carried).unwrap_or(isize::MAX) + delta;
        for _ in 0..open.max(0) {
            html.push_str("</span>");
        }
        lines.push(html);
    }

    Ok(lines)
}

/// Class attribute for a scope, in the same form syntect emits.
fn scope_classes(scope: &str) -> String {
    scope
        .split('.')
        .map(|atom| format!("token {atom}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn plain_lines(source: &str) -> Vec<String> {
    LinesWithEndings::from(source).map(escape_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_language_escaped() {
        let lines = highlight_lines(Some("fooLang"), "a < b\nc\n");
        assert_eq!(lines, vec!["a &lt; b\n".to_owned(), "c\n".to_owned()]);
    }

    #[test]
    fn test_no_language() {
        assert_eq!(highlight_lines(None, "x"), vec!["x".to_owned()]);
    }

    #[test]
    fn test_rust_highlighted_with_token_classes() {
        let lines = highlight_lines(Some("rust"), "fn main() {}\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#"class="token "#));
        assert!(lines[0].contains("main"));
    }

    #[test]
    fn test_spans_balanced_per_line() {
        let source = "/* multi\nline */\nlet x = 1;\n";
        for line in highlight_lines(Some("rust"), source) {
            assert_eq!(line.matches("<span").count(), line.matches("</span>").count());
        }
    }

    #[test]
    fn test_scope_classes() {
        assert_eq!(
            scope_classes("comment.block.rust"),
            "token comment token block token rust"
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(highlight_lines(Some("rust"), "").is_empty());
    }
}
