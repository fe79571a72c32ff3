//! Remote store seam.

use crate::error::NotionError;
use crate::types::{DatabaseQuery, Page, PaginatedList, RawBlock};

/// Read-only access to the Notion API.
///
/// [`NotionClient`](crate::NotionClient) implements this over HTTP. Each call
/// fetches exactly one page of results; callers drive pagination.
pub trait NotionApi: Send + Sync {
    /// List one page of children of a block or page.
    ///
    /// # Errors
    ///
    /// Returns [`NotionError`] on transport failure or an error status.
    fn block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<RawBlock>, NotionError>;

    /// Run one page of a database query.
    ///
    /// # Errors
    ///
    /// Returns [`NotionError`] on transport failure or an error status.
    fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<Page>, NotionError>;
}
