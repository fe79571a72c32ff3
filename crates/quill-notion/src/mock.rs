//! Mock Notion backend for testing.
//!
//! Provides [`MockNotion`] for unit testing without network access.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::NotionApi;
use crate::error::NotionError;
use crate::types::{DatabaseQuery, Page, PaginatedList, RawBlock};

/// Key of a canned response: parent id and start cursor.
type PageKey = (String, Option<String>);

/// Canned page: raw JSON results and next cursor.
type CannedPage = (Vec<Value>, Option<String>);

/// Mock Notion API.
///
/// Responses are keyed by parent id and start cursor. Requests without a
/// canned response answer `404 object_not_found`, like the real API does for
/// unknown ids. All calls are recorded for assertions.
///
/// # Example
///
/// ```ignore
/// use quill_notion::{BlockFetcher, MockNotion};
/// use serde_json::json;
///
/// let api = MockNotion::new().with_children(
///     "page-id",
///     None,
///     vec![json!({"id": "b1", "type": "divider", "divider": {}})],
///     None,
/// );
/// let blocks = BlockFetcher::new(&api).fetch_block_tree("page-id").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockNotion {
    children: RwLock<HashMap<PageKey, CannedPage>>,
    queries: RwLock<HashMap<PageKey, CannedPage>>,
    failures: RwLock<HashMap<String, u16>>,
    children_calls: RwLock<Vec<PageKey>>,
    query_calls: RwLock<Vec<(String, DatabaseQuery, Option<String>)>>,
}

impl MockNotion {
    /// Create a new empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one page of children for `parent_id` requested with `cursor`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_children(
        self,
        parent_id: &str,
        cursor: Option<&str>,
        blocks: Vec<Value>,
        next_cursor: Option<&str>,
    ) -> Self {
        self.children.write().unwrap().insert(
            (parent_id.to_owned(), cursor.map(str::to_owned)),
            (blocks, next_cursor.map(str::to_owned)),
        );
        self
    }

    /// Add one page of query results for `database_id` requested with `cursor`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_query_page(
        self,
        database_id: &str,
        cursor: Option<&str>,
        pages: Vec<Value>,
        next_cursor: Option<&str>,
    ) -> Self {
        self.queries.write().unwrap().insert(
            (database_id.to_owned(), cursor.map(str::to_owned)),
            (pages, next_cursor.map(str::to_owned)),
        );
        self
    }

    /// Make every request for `id` fail with the given HTTP status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, id: &str, status: u16) -> Self {
        self.failures.write().unwrap().insert(id.to_owned(), status);
        self
    }

    /// Recorded children requests, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn children_calls(&self) -> Vec<(String, Option<String>)> {
        self.children_calls.read().unwrap().clone()
    }

    /// Recorded database queries, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn query_calls(&self) -> Vec<(String, DatabaseQuery, Option<String>)> {
        self.query_calls.read().unwrap().clone()
    }

    fn respond<T: DeserializeOwned>(
        &self,
        store: &RwLock<HashMap<PageKey, CannedPage>>,
        key: &PageKey,
    ) -> Result<PaginatedList<T>, NotionError> {
        if let Some(status) = self.failures.read().unwrap().get(&key.0) {
            return Err(NotionError::HttpResponse {
                status: *status,
                body: "mock failure".to_owned(),
            });
        }

        let store = store.read().unwrap();
        let Some((values, next_cursor)) = store.get(key) else {
            return Err(NotionError::HttpResponse {
                status: 404,
                body: format!(
                    r#"{{"object":"error","status":404,"code":"object_not_found","message":"Could not find {}"}}"#,
                    key.0
                ),
            });
        };

        let results = values
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(PaginatedList::new(results, next_cursor.clone()))
    }
}

impl NotionApi for MockNotion {
    fn block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<RawBlock>, NotionError> {
        let key = (block_id.to_owned(), start_cursor.map(str::to_owned));
        self.children_calls.write().unwrap().push(key.clone());
        self.respond(&self.children, &key)
    }

    fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<Page>, NotionError> {
        self.query_calls.write().unwrap().push((
            database_id.to_owned(),
            query.clone(),
            start_cursor.map(str::to_owned),
        ));
        let key = (database_id.to_owned(), start_cursor.map(str::to_owned));
        self.respond(&self.queries, &key)
    }
}
