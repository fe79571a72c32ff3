//! Block tree retrieval.
//!
//! Provides [`BlockFetcher`] for materializing a page's full block tree:
//! every list of children is paged through to exhaustion, and every container
//! block is expanded recursively before the tree is returned.

use tracing::{info, warn};

use crate::api::NotionApi;
use crate::error::NotionError;
use crate::pagination::{DEFAULT_MAX_PAGES, collect_pages};
use crate::types::Block;

/// Fetches complete block trees from a [`NotionApi`].
///
/// Failures are surfaced as-is; there is no retry. The one exception is a
/// nested block the integration cannot see (404 on its children): it keeps
/// an empty child list so the rest of the document still renders. Children
/// keep the order the store returns them in.
pub struct BlockFetcher<'a, A: NotionApi + ?Sized> {
    api: &'a A,
    max_pages: u32,
}

impl<'a, A: NotionApi + ?Sized> BlockFetcher<'a, A> {
    /// Create a fetcher with the default page cap.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Cap the number of pages fetched per parent.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Fetch the top-level blocks of a page with all descendants resolved.
    ///
    /// # Errors
    ///
    /// Returns [`NotionError`] if any children request fails; a 404 on the
    /// root id means the document does not exist. A 404 below the root is
    /// logged and leaves that block without children.
    pub fn fetch_block_tree(&self, document_id: &str) -> Result<Vec<Block>, NotionError> {
        let blocks = self.fetch_children(document_id)?;
        info!(
            "Fetched {} top-level blocks for {}",
            blocks.len(),
            document_id
        );
        Ok(blocks)
    }

    fn fetch_children(&self, parent_id: &str) -> Result<Vec<Block>, NotionError> {
        let raw = collect_pages(parent_id, self.max_pages, |cursor| {
            self.api.block_children(parent_id, cursor)
        })?;

        raw.into_iter()
            .map(|raw| {
                let mut block = Block::from(raw);
                if block.should_descend() {
                    block.children = match self.fetch_children(&block.id) {
                        Ok(children) => children,
                        Err(e) if e.is_not_found() => {
                            warn!("Children of block {} not accessible, skipping: {}", block.id, e);
                            Vec::new()
                        }
                        Err(e) => return Err(e),
                    };
                }
                Ok(block)
            })
            .collect()
    }
}
