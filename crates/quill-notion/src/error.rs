//! Error types for Notion integration.

/// Error from Notion API operations.
#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl NotionError {
    /// Whether the store reported that the requested object does not exist.
    ///
    /// Notion answers unknown or inaccessible ids with `404 object_not_found`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpResponse { status: 404, .. })
    }
}
