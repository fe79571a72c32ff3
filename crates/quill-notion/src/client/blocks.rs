//! Block operations for the Notion API.

use tracing::info;

use super::NotionClient;
use crate::error::NotionError;
use crate::types::{PaginatedList, RawBlock};

impl NotionClient {
    /// Get one page of children of a block or page.
    pub(crate) fn get_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<RawBlock>, NotionError> {
        let url = format!("{}/blocks/{}/children", self.api_url(), block_id);

        info!(
            "Getting children of block {} (cursor: {:?})",
            block_id, start_cursor
        );

        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .header("Notion-Version", &self.version)
            .header("Accept", "application/json")
            .query("page_size", self.page_size.to_string());
        if let Some(cursor) = start_cursor {
            request = request.query("start_cursor", cursor);
        }

        let list: PaginatedList<RawBlock> = Self::read_response(request.call()?)?;
        info!("Found {} children of block {}", list.results.len(), block_id);
        Ok(list)
    }
}
