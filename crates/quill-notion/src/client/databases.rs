//! Database operations for the Notion API.

use serde::Serialize;
use tracing::info;

use super::NotionClient;
use crate::error::NotionError;
use crate::types::{DatabaseQuery, Page, PaginatedList};

/// Query body with pagination fields.
#[derive(Serialize)]
struct QueryBody<'a> {
    #[serde(flatten)]
    query: &'a DatabaseQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
    page_size: u32,
}

impl NotionClient {
    /// Run one page of a database query.
    pub(crate) fn post_database_query(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<Page>, NotionError> {
        let url = format!("{}/databases/{}/query", self.api_url(), database_id);

        info!(
            "Querying database {} (cursor: {:?})",
            database_id, start_cursor
        );

        let body = QueryBody {
            query,
            start_cursor,
            page_size: self.page_size,
        };

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .header("Notion-Version", &self.version)
            .header("Accept", "application/json")
            .send_json(&body)?;

        let list: PaginatedList<Page> = Self::read_response(response)?;
        info!("Found {} entries in database {}", list.results.len(), database_id);
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortDirection;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_body_flattens_query() {
        let query = DatabaseQuery::default()
            .checkbox_equals("Published", true)
            .sorted_by("Date", SortDirection::Descending);
        let body = QueryBody {
            query: &query,
            start_cursor: Some("cursor-1"),
            page_size: 50,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "filter": {"property": "Published", "checkbox": {"equals": true}},
                "sorts": [{"property": "Date", "direction": "descending"}],
                "start_cursor": "cursor-1",
                "page_size": 50
            })
        );
    }

    #[test]
    fn test_query_body_without_cursor() {
        let query = DatabaseQuery::default();
        let body = QueryBody {
            query: &query,
            start_cursor: None,
            page_size: 100,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"page_size": 100})
        );
    }
}
