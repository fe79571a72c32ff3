//! Staged markdown to HTML pipeline.
//!
//! [`MarkdownPipeline`] turns a markdown document into HTML through fixed
//! stages over an intermediate HTML tree:
//!
//! 1. Parse with pulldown-cmark (GFM tables, strikethrough, task lists, math)
//! 2. Build the tree; raw HTML is kept only in [`RenderMode::Permissive`]
//! 3. Re-parse raw HTML fragments so their math and code blocks are enriched
//! 4. Render TeX math to MathML with pulldown-latex
//! 5. Render code blocks with titles and syntect highlighting
//! 6. Serialize
//!
//! Math that fails to render degrades to its escaped source and is reported in
//! [`RenderResult::warnings`].
//!
//! # Example
//!
//! ```
//! use quill_renderer::{MarkdownPipeline, RenderMode};
//!
//! let markdown = "# Hello\n\n```rust:main.rs\nfn main() {}\n```";
//! let result = MarkdownPipeline::new(RenderMode::Permissive).render(markdown);
//! assert!(result.html.contains(r#"<div class="code-title">main.rs</div>"#));
//! ```

mod code;
mod convert;
mod fragment;
mod highlight;
mod math;
mod pipeline;
mod tree;

pub use pipeline::{MarkdownPipeline, RenderMode, RenderResult};
pub use tree::escape_html;
