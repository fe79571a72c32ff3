//! Code blocks: fence info parsing, titles and final markup.

use std::fmt::Write;

use crate::highlight::highlight_lines;
use crate::tree::{CodeBlock, escape_html};

/// Parse a fence info string into language and title.
///
/// Accepted forms: `lang`, `lang:title` and `lang title="some title"`
/// (single quotes also work). Other `key=value` attributes are ignored.
pub(crate) fn parse_fence_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    let (head, rest) = info
        .split_once(char::is_whitespace)
        .unwrap_or((info, ""));

    let (language, mut title) = match head.split_once(':') {
        Some((lang, title)) => (lang, non_empty(title)),
        None => (head, None),
    };

    if title.is_none() {
        title = attribute(rest, "title");
    }

    (non_empty(language), title)
}

/// Find `name=value` in an attribute list, honoring quotes.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs.trim_start();
    while !rest.is_empty() {
        let (key, after_key) = rest.split_once('=')?;
        let key = key.trim();
        let after_key = after_key.trim_start();

        let (value, remaining) = match after_key.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after_key[1..];
                match body.find(quote) {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                }
            }
            _ => after_key
                .split_once(char::is_whitespace)
                .unwrap_or((after_key, "")),
        };

        // Keys may be preceded by bare words; the key is the last word.
        if key.rsplit(char::is_whitespace).next() == Some(name) {
            return non_empty(value);
        }
        rest = remaining.trim_start();
    }
    None
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

/// Render a code block with its optional title.
///
/// Produces `<div class="code-title">` (when titled) followed by
/// `<pre class="language-x"><code class="language-x code-highlight">`.
pub(crate) fn render_code_block(code: &CodeBlock, line_numbers: bool) -> String {
    let mut out = String::new();

    if let Some(title) = &code.title {
        write!(out, r#"<div class="code-title">{}</div>"#, escape_html(title)).unwrap();
    }

    let class = code
        .language
        .as_deref()
        .map(|lang| format!("language-{}", escape_html(&lang.to_lowercase())));
    match &class {
        Some(class) => write!(
            out,
            r#"<pre class="{class}"><code class="{class} code-highlight">"#
        )
        .unwrap(),
        None => out.push_str(r#"<pre><code class="code-highlight">"#),
    }

    let lines = highlight_lines(code.language.as_deref(), &code.source);
    for (index, line) in lines.iter().enumerate() {
        if line_numbers {
            write!(
                out,
                r#"<span class="code-line line-number" line="{}">{line}</span>"#,
                index + 1
            )
            .unwrap();
        } else {
            out.push_str(line);
        }
    }

    out.push_str("</code></pre>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info(s: &str) -> (Option<String>, Option<String>) {
        parse_fence_info(s)
    }

    #[test]
    fn test_parse_fence_info_language_only() {
        assert_eq!(info("rust"), (Some("rust".to_owned()), None));
    }

    #[test]
    fn test_parse_fence_info_empty() {
        assert_eq!(info("   "), (None, None));
    }

    #[test]
    fn test_parse_fence_info_colon_title() {
        assert_eq!(
            info("python:hello.py"),
            (Some("python".to_owned()), Some("hello.py".to_owned()))
        );
    }

    #[test]
    fn test_parse_fence_info_quoted_title_with_spaces() {
        assert_eq!(
            info(r#"text title="My Notes" highlight=2"#),
            (Some("text".to_owned()), Some("My Notes".to_owned()))
        );
    }

    #[test]
    fn test_parse_fence_info_single_quoted() {
        assert_eq!(
            info("sh title='run it'"),
            (Some("sh".to_owned()), Some("run it".to_owned()))
        );
    }

    #[test]
    fn test_parse_fence_info_ignores_other_attrs() {
        assert_eq!(info("rust linenos=true"), (Some("rust".to_owned()), None));
    }

    #[test]
    fn test_render_title_before_pre() {
        let code = CodeBlock {
            language: Some("fooLang".to_owned()),
            title: Some("a <b>".to_owned()),
            source: "x\n".to_owned(),
        };
        let html = render_code_block(&code, false);
        assert!(html.starts_with(r#"<div class="code-title">a &lt;b&gt;</div><pre class="language-foolang">"#));
        assert!(html.ends_with("</code></pre>"));
    }

    #[test]
    fn test_render_line_numbers() {
        let code = CodeBlock {
            language: None,
            title: None,
            source: "one\ntwo\n".to_owned(),
        };
        let html = render_code_block(&code, true);
        assert_eq!(
            html,
            concat!(
                r#"<pre><code class="code-highlight">"#,
                r#"<span class="code-line line-number" line="1">one"#,
                "\n</span>",
                r#"<span class="code-line line-number" line="2">two"#,
                "\n</span></code></pre>"
            )
        );
    }
}
