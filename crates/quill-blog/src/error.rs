//! Error types for the blog facade.

use quill_config::ConfigError;
use quill_notion::NotionError;

/// Error returned by [`Blog`](crate::Blog) operations.
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// The content store could not be reached or answered with an error.
    #[error("Content store unavailable: {0}")]
    RemoteUnavailable(#[source] NotionError),
    /// No published post matches the requested slug.
    #[error("Post not found: {0}")]
    NotFound(String),
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BlogError {
    /// Map a store error for the document identified by `slug`.
    ///
    /// A store "not found" becomes [`BlogError::NotFound`].
    pub(crate) fn from_notion(error: NotionError, slug: &str) -> Self {
        if error.is_not_found() {
            Self::NotFound(slug.to_owned())
        } else {
            Self::RemoteUnavailable(error)
        }
    }
}

impl From<NotionError> for BlogError {
    fn from(error: NotionError) -> Self {
        Self::RemoteUnavailable(error)
    }
}
