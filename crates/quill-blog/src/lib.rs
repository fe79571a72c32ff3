//! Notion-backed blog.
//!
//! [`Blog`] ties the pieces together: the post catalog lists documents, the
//! block fetcher materializes a document's block tree, the markdown converter
//! flattens it, and the markdown pipeline produces HTML.
//!
//! The facade exposes two operations:
//! - [`Blog::list_published_documents`]: published posts, newest first
//! - [`Blog::render_document`]: one post rendered to HTML, by slug

mod blog;
mod error;

pub use blog::{Blog, RenderedPost};
pub use error::BlogError;
pub use quill_notion::PostMetadata;
pub use quill_renderer::RenderMode;
