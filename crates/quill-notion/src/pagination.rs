//! Cursor-driven pagination loop.

use tracing::{debug, warn};

use crate::error::NotionError;
use crate::types::PaginatedList;

/// Default cap on pages fetched for a single list.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Collect every item of a paginated list.
///
/// Calls `fetch_page` with the cursor from the previous page until the store
/// stops returning one. Stops after `max_pages` calls even if a cursor is still
/// present, logging a warning; the items gathered so far are returned.
pub(crate) fn collect_pages<T, F>(
    what: &str,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<Vec<T>, NotionError>
where
    F: FnMut(Option<&str>) -> Result<PaginatedList<T>, NotionError>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    for page in 1..=max_pages {
        let list = fetch_page(cursor.as_deref())?;
        let next = list.continuation().map(str::to_owned);
        debug!("{}: page {} returned {} items", what, page, list.results.len());
        items.extend(list.results);

        match next {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }

    warn!(
        "{}: stopped after {} pages with a continuation cursor still present",
        what, max_pages
    );
    Ok(items)
}
