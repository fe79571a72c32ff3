//! Blog facade over the catalog, fetcher, converter and pipeline.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use quill_config::{Config, PropertyNames, RenderModeSetting};
use quill_notion::{
    BlockFetcher, DEFAULT_MAX_PAGES, MarkdownConverter, NotionApi, NotionClient, PostCatalog,
    PostMetadata,
};
use quill_renderer::{MarkdownPipeline, RenderMode};

use crate::error::BlogError;

/// A post rendered to HTML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedPost {
    /// Catalog metadata of the post.
    pub metadata: PostMetadata,
    /// Rendered body.
    pub html: String,
    /// Degraded conversions encountered while rendering.
    pub warnings: Vec<String>,
}

/// Read-only blog backed by a Notion database.
///
/// # Example
///
/// ```ignore
/// use quill_blog::Blog;
/// use quill_config::Config;
///
/// let blog = Blog::from_config(&Config::load(None)?)?;
/// for post in blog.list_published_documents()? {
///     println!("{} {}", post.slug, post.title);
/// }
/// let post = blog.render_document("hello-world")?;
/// ```
pub struct Blog {
    api: Arc<dyn NotionApi>,
    database_id: String,
    properties: PropertyNames,
    max_pages: u32,
    pipeline: MarkdownPipeline,
}

impl Blog {
    /// Create a blog over `database_id` with default settings.
    #[must_use]
    pub fn new(api: Arc<dyn NotionApi>, database_id: impl Into<String>) -> Self {
        Self {
            api,
            database_id: database_id.into(),
            properties: PropertyNames::default(),
            max_pages: DEFAULT_MAX_PAGES,
            pipeline: MarkdownPipeline::default(),
        }
    }

    /// Create a blog with an HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::Config`] if the `[notion]` section is missing or
    /// invalid.
    pub fn from_config(config: &Config) -> Result<Self, BlogError> {
        let notion = config.require_notion()?;
        let client = NotionClient::from_config(notion);

        Ok(Self::new(Arc::new(client), notion.database_id.clone())
            .with_property_names(config.properties.clone())
            .with_max_pages(notion.max_pages)
            .with_render_mode(render_mode(config.render.mode)))
    }

    /// Use custom property names.
    #[must_use]
    pub fn with_property_names(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }

    /// Cap the number of pages fetched per listing.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the rendering mode.
    #[must_use]
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.pipeline = MarkdownPipeline::new(mode);
        self
    }

    fn catalog(&self) -> PostCatalog<'_, dyn NotionApi> {
        PostCatalog::new(self.api.as_ref(), self.database_id.as_str())
            .with_property_names(self.properties.clone())
            .with_max_pages(self.max_pages)
    }

    /// List published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::RemoteUnavailable`] if the store query fails.
    pub fn list_published_documents(&self) -> Result<Vec<PostMetadata>, BlogError> {
        Ok(self.catalog().list_published()?)
    }

    /// Fetch a post's block tree and convert it to markdown.
    ///
    /// Toggles are emitted as `<details>` HTML only when the render mode
    /// passes raw HTML through.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::NotFound`] if the store does not know the
    /// document, or [`BlogError::RemoteUnavailable`] on other store errors.
    pub fn document_markdown(&self, metadata: &PostMetadata) -> Result<String, BlogError> {
        let blocks = BlockFetcher::new(self.api.as_ref())
            .with_max_pages(self.max_pages)
            .fetch_block_tree(&metadata.id)
            .map_err(|e| BlogError::from_notion(e, &metadata.slug))?;
        Ok(MarkdownConverter::new()
            .with_raw_html(self.pipeline.mode().allows_raw_html())
            .to_markdown(&blocks))
    }

    /// Render the published post with the given slug.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::NotFound`] if no published post has this slug,
    /// or [`BlogError::RemoteUnavailable`] if the store fails.
    pub fn render_document(&self, slug: &str) -> Result<RenderedPost, BlogError> {
        let metadata = self
            .catalog()
            .find_by_slug(slug)?
            .ok_or_else(|| BlogError::NotFound(slug.to_owned()))?;

        let markdown = self.document_markdown(&metadata)?;
        let result = self.pipeline.render(&markdown);

        info!(
            "Rendered post '{}' ({} bytes, {} warnings)",
            slug,
            result.html.len(),
            result.warnings.len()
        );

        Ok(RenderedPost {
            metadata,
            html: result.html,
            warnings: result.warnings,
        })
    }
}

fn render_mode(setting: RenderModeSetting) -> RenderMode {
    match setting {
        RenderModeSetting::Strict => RenderMode::Strict,
        RenderModeSetting::Permissive => RenderMode::Permissive,
    }
}
