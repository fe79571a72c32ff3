//! Notion REST API client.
//!
//! Provides a sync HTTP client for the public Notion API authenticated with
//! an internal integration token.

mod blocks;
mod databases;

use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;
use ureq::http::Response;

use quill_config::NotionConfig;

use crate::api::NotionApi;
use crate::error::NotionError;
use crate::types::{DatabaseQuery, Page, PaginatedList, RawBlock};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Default `Notion-Version` header value.
const DEFAULT_VERSION: &str = "2022-06-28";

/// Largest page size accepted by list endpoints.
const MAX_PAGE_SIZE: u32 = 100;

/// Notion REST API client.
pub struct NotionClient {
    agent: Agent,
    base_url: String,
    api_key: String,
    version: String,
    page_size: u32,
}

impl NotionClient {
    /// Create a client with default version, page size and timeout.
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g. `https://api.notion.com`)
    /// * `api_key` - integration token
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::build(
            base_url,
            api_key,
            DEFAULT_VERSION,
            MAX_PAGE_SIZE,
            Duration::from_secs(DEFAULT_TIMEOUT),
        )
    }

    /// Create client from config values.
    #[must_use]
    pub fn from_config(config: &NotionConfig) -> Self {
        Self::build(
            &config.base_url,
            &config.api_key,
            &config.version,
            config.page_size,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn build(
        base_url: &str,
        api_key: &str,
        version: &str,
        page_size: u32,
        timeout: Duration,
    ) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            version: version.to_owned(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    /// Value of the `Authorization` header.
    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Check the status and decode a JSON body.
    fn read_response<T: DeserializeOwned>(
        response: Response<ureq::Body>,
    ) -> Result<T, NotionError> {
        let status = response.status().as_u16();
        let mut body_reader = response.into_body();

        if status >= 400 {
            let error_body = body_reader
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(NotionError::HttpResponse {
                status,
                body: error_body,
            });
        }

        Ok(body_reader.read_json()?)
    }
}

impl NotionApi for NotionClient {
    fn block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<RawBlock>, NotionError> {
        self.get_block_children(block_id, start_cursor)
    }

    fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<Page>, NotionError> {
        self.post_database_query(database_id, query, start_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = NotionClient::new("https://api.notion.com/", "secret");
        assert_eq!(client.api_url(), "https://api.notion.com/v1");
    }

    #[test]
    fn test_bearer_header() {
        let client = NotionClient::new("https://api.notion.com", "secret_abc");
        assert_eq!(client.bearer(), "Bearer secret_abc");
    }

    #[test]
    fn test_page_size_clamped() {
        let config: NotionConfig =
            serde_json::from_str(r#"{"api_key": "k", "database_id": "d", "page_size": 500}"#)
                .unwrap();
        let client = NotionClient::from_config(&config);
        assert_eq!(client.page_size, 100);
        assert_eq!(client.version, "2022-06-28");
    }
}
