//! Notion integration for the Quill blog pipeline.
//!
//! This crate talks to the Notion REST API and turns what it returns into
//! inputs for the renderer:
//!
//! - [`BlockFetcher`]: Retrieves a page's full block tree, following pagination
//!   cursors and descending into blocks with children
//! - [`MarkdownConverter`]: Converts a block tree to a markdown document
//! - [`PostCatalog`]: Lists published posts from the posts database
//!
//! All network access goes through the [`NotionApi`] trait. [`NotionClient`]
//! is the HTTP implementation; `MockNotion` (behind the `mock` feature) serves
//! canned responses for tests.
//!
//! # Example
//!
//! ```ignore
//! use quill_notion::{BlockFetcher, MarkdownConverter, NotionClient};
//!
//! let client = NotionClient::new("https://api.notion.com", "secret_xxx");
//! let blocks = BlockFetcher::new(&client).fetch_block_tree("page-id")?;
//! let markdown = MarkdownConverter::new().to_markdown(&blocks);
//! ```

mod api;
mod catalog;
mod client;
mod error;
mod fetcher;
mod markdown;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod pagination;
pub mod types;

pub use api::NotionApi;
pub use catalog::{PostCatalog, PostMetadata};
pub use client::NotionClient;
pub use error::NotionError;
pub use fetcher::BlockFetcher;
pub use markdown::{MarkdownConverter, escape_link_target, render_rich_text};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockNotion;
pub use pagination::DEFAULT_MAX_PAGES;
