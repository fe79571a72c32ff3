//! Staged markdown to HTML pipeline.

use pulldown_cmark::{Options, Parser};
use tracing::{debug, warn};

use crate::code::render_code_block;
use crate::convert::TreeBuilder;
use crate::fragment::expand_fragments;
use crate::math::render_math;
use crate::tree::{Node, rewrite, serialize};

/// Trust level of the markdown being rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Raw HTML is escaped and code blocks have no line numbers.
    #[default]
    Strict,
    /// Raw HTML passes through and code lines are numbered.
    ///
    /// Only for markdown from a trusted source.
    Permissive,
}

impl RenderMode {
    /// Whether raw HTML from the source is emitted.
    #[must_use]
    pub fn allows_raw_html(self) -> bool {
        self == Self::Permissive
    }
}

/// Result of rendering markdown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Degraded conversions (e.g. math that failed to render).
    pub warnings: Vec<String>,
}

/// Markdown to HTML pipeline.
///
/// Stages run in a fixed order: parse, build tree, expand raw HTML fragments
/// (permissive only), render math, render code blocks, serialize. Rendering
/// is pure: the same input in the same mode yields the same output.
///
/// # Example
///
/// ```
/// use quill_renderer::{MarkdownPipeline, RenderMode};
///
/// let result = MarkdownPipeline::new(RenderMode::Strict).render("Hello $x^2$ world");
/// assert!(result.html.contains("math-inline"));
/// ```
#[derive(Clone, Debug)]
pub struct MarkdownPipeline {
    mode: RenderMode,
    line_numbers: bool,
}

impl MarkdownPipeline {
    /// Create a pipeline for the given mode.
    ///
    /// Line numbers follow the mode: on in permissive mode, off in strict mode.
    #[must_use]
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            line_numbers: mode == RenderMode::Permissive,
        }
    }

    /// Override whether code lines are wrapped with line numbers.
    #[must_use]
    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.line_numbers = enabled;
        self
    }

    /// The configured mode.
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Parser options: GFM tables, strikethrough, task lists and math.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_MATH
    }

    /// Render markdown to HTML.
    #[must_use]
    pub fn render(&self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, Self::parser_options());
        let mut nodes = TreeBuilder::new(self.mode.allows_raw_html()).build(parser);

        if self.mode.allows_raw_html() {
            expand_fragments(&mut nodes);
        }

        let mut warnings = Vec::new();
        unwrap_display_math(&mut nodes);
        render_math_nodes(&mut nodes, &mut warnings);
        render_code_nodes(&mut nodes, self.line_numbers);

        let html = serialize(&nodes);
        debug!(
            "Rendered {} bytes of markdown in {:?} mode ({} warnings)",
            markdown.len(),
            self.mode,
            warnings.len()
        );
        RenderResult { html, warnings }
    }
}

impl Default for MarkdownPipeline {
    fn default() -> Self {
        Self::new(RenderMode::default())
    }
}

/// Replace paragraphs holding only display math with the math itself.
fn unwrap_display_math(nodes: &mut Vec<Node>) {
    rewrite(nodes, &mut |list| {
        for node in list.iter_mut() {
            let Node::Element(element) = node else {
                continue;
            };
            if element.tag != "p" {
                continue;
            }
            let mut significant = element.children.iter().filter(|c| !c.is_blank_text());
            let math = match (significant.next(), significant.next()) {
                (Some(math @ Node::Math { display: true, .. }), None) => math.clone(),
                _ => continue,
            };
            *node = math;
        }
    });
}

fn render_math_nodes(nodes: &mut Vec<Node>, warnings: &mut Vec<String>) {
    rewrite(nodes, &mut |list| {
        for node in list.iter_mut() {
            let Node::Math { source, display } = node else {
                continue;
            };
            let markup = match render_math(source, *display) {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to render math '{source}': {}", e.message);
                    warnings.push(format!("Failed to render math `{source}`: {}", e.message));
                    e.html
                }
            };
            *node = Node::Markup(markup);
        }
    });
}

fn render_code_nodes(nodes: &mut Vec<Node>, line_numbers: bool) {
    rewrite(nodes, &mut |list| {
        for node in list.iter_mut() {
            if let Node::Code(code) = node {
                *node = Node::Markup(render_code_block(code, line_numbers));
            }
        }
    });
}
