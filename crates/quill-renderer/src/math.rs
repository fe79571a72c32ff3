//! TeX math to MathML via pulldown-latex.

use pulldown_latex::config::{DisplayMode, RenderConfig};
use pulldown_latex::mathml::push_mathml;
use pulldown_latex::{Parser, Storage};

use crate::tree::escape_html;

/// Fallback markup and message for an expression that failed to render.
#[derive(Debug)]
pub(crate) struct MathError {
    pub html: String,
    pub message: String,
}

/// Render TeX to a wrapped MathML fragment.
///
/// Display math is wrapped in `<div class="math math-display">`, inline math
/// in `<span class="math math-inline">`. On failure returns a `math-error`
/// element of the same kind holding the escaped source, with the error
/// message.
pub(crate) fn render_math(source: &str, display: bool) -> Result<String, MathError> {
    let storage = Storage::new();
    let parser = Parser::new(source, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err().map(ToString::to_string))
        .collect();
    if !errors.is_empty() {
        return Err(MathError {
            html: error_html(source, display),
            message: errors.join("; "),
        });
    }

    let mut mathml = String::new();
    if let Err(e) = push_mathml(&mut mathml, events.into_iter(), config) {
        return Err(MathError {
            html: error_html(source, display),
            message: e.to_string(),
        });
    }

    Ok(if display {
        format!(r#"<div class="math math-display">{mathml}</div>"#)
    } else {
        format!(r#"<span class="math math-inline">{mathml}</span>"#)
    })
}

fn error_html(source: &str, display: bool) -> String {
    let (tag, delimiter) = if display { ("div", "$$") } else { ("span", "$") };
    format!(
        r#"<{tag} class="math math-error">{}</{tag}>"#,
        escape_html(&format!("{delimiter}{source}{delimiter}"))
    )
}
