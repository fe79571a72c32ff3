//! Published post listing.
//!
//! [`PostCatalog`] queries the blog database for published entries and
//! extracts display metadata from their typed properties. Missing or malformed
//! properties resolve to empty values rather than failing the listing.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use quill_config::PropertyNames;

use crate::api::NotionApi;
use crate::error::NotionError;
use crate::pagination::{DEFAULT_MAX_PAGES, collect_pages};
use crate::types::{DatabaseQuery, MediaBlock, Page, PropertyValue, SortDirection, plain_text};

/// Display metadata of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostMetadata {
    /// Page ID.
    pub id: String,
    /// Post title (empty if missing).
    pub title: String,
    /// URL slug (empty if missing).
    pub slug: String,
    /// ISO-8601 publication date.
    pub date: Option<String>,
    /// Tag names in property order.
    pub tags: Vec<String>,
    /// Short summary (empty if missing).
    pub excerpt: String,
    /// Cover image URL.
    pub cover_image_url: Option<String>,
    /// Published flag.
    pub published: bool,
}

impl PostMetadata {
    /// Extract metadata from a database page.
    ///
    /// The cover falls back to the page cover when the image property is empty.
    #[must_use]
    pub fn from_page(page: &Page, names: &PropertyNames) -> Self {
        let cover_image_url = image_url(page, &names.image)
            .or_else(|| page.cover.as_ref().and_then(MediaBlock::url).map(str::to_owned));

        Self {
            id: page.id.clone(),
            title: title(page, &names.title),
            slug: rich_text(page, &names.slug),
            date: date(page, &names.date),
            tags: tags(page, &names.tags),
            excerpt: rich_text(page, &names.excerpt),
            cover_image_url,
            published: checkbox(page, &names.published),
        }
    }
}

fn mismatch(page: &Page, name: &str, expected: &str) {
    warn!(
        "Property {:?} on page {} is not of type {}",
        name, page.id, expected
    );
}

fn title(page: &Page, name: &str) -> String {
    match page.property(name) {
        Some(PropertyValue::Title { title }) => plain_text(&title),
        Some(_) => {
            mismatch(page, name, "title");
            String::new()
        }
        None => String::new(),
    }
}

fn rich_text(page: &Page, name: &str) -> String {
    match page.property(name) {
        Some(PropertyValue::RichText { rich_text }) => plain_text(&rich_text),
        Some(_) => {
            mismatch(page, name, "rich_text");
            String::new()
        }
        None => String::new(),
    }
}

fn date(page: &Page, name: &str) -> Option<String> {
    match page.property(name) {
        Some(PropertyValue::Date { date }) => date.map(|d| d.start).filter(|s| !s.is_empty()),
        Some(_) => {
            mismatch(page, name, "date");
            None
        }
        None => None,
    }
}

fn tags(page: &Page, name: &str) -> Vec<String> {
    match page.property(name) {
        Some(PropertyValue::MultiSelect { multi_select }) => {
            multi_select.into_iter().map(|option| option.name).collect()
        }
        Some(_) => {
            mismatch(page, name, "multi_select");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn image_url(page: &Page, name: &str) -> Option<String> {
    match page.property(name) {
        Some(PropertyValue::Url { url }) => url.filter(|u| !u.is_empty()),
        Some(PropertyValue::Files { files }) => {
            files.iter().find_map(|f| f.url().map(str::to_owned))
        }
        Some(_) => {
            mismatch(page, name, "url");
            None
        }
        None => None,
    }
}

fn checkbox(page: &Page, name: &str) -> bool {
    match page.property(name) {
        Some(PropertyValue::Checkbox { checkbox }) => checkbox,
        Some(_) => {
            mismatch(page, name, "checkbox");
            false
        }
        None => false,
    }
}

/// Instant a post date sorts by.
///
/// Datetimes are compared in UTC; a date without time counts as midnight UTC.
/// Unparsable dates sort like undated posts.
fn date_key(post: &PostMetadata) -> Option<DateTime<Utc>> {
    let date = post.date.as_deref()?.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(date) {
        return Some(instant.with_timezone(&Utc));
    }
    let key = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc());
    if key.is_none() {
        warn!("Post {} has unparsable date '{}'", post.id, date);
    }
    key
}

/// Lists published posts from a Notion database.
pub struct PostCatalog<'a, A: NotionApi + ?Sized> {
    api: &'a A,
    database_id: String,
    names: PropertyNames,
    max_pages: u32,
}

impl<'a, A: NotionApi + ?Sized> PostCatalog<'a, A> {
    /// Create a catalog over `database_id` with default property names.
    #[must_use]
    pub fn new(api: &'a A, database_id: impl Into<String>) -> Self {
        Self {
            api,
            database_id: database_id.into(),
            names: PropertyNames::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Use custom property names.
    #[must_use]
    pub fn with_property_names(mut self, names: PropertyNames) -> Self {
        self.names = names;
        self
    }

    /// Cap the number of result pages fetched.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Query built for listing published posts.
    fn published_query(&self) -> DatabaseQuery {
        DatabaseQuery::default()
            .checkbox_equals(self.names.published.clone(), true)
            .sorted_by(self.names.date.clone(), SortDirection::Descending)
    }

    /// List published posts, newest first.
    ///
    /// The store is asked to filter and sort; the result is filtered and
    /// stable-sorted again so the ordering holds whatever the store returns.
    ///
    /// # Errors
    ///
    /// Returns [`NotionError`] if any query page fails.
    pub fn list_published(&self) -> Result<Vec<PostMetadata>, NotionError> {
        let query = self.published_query();
        let pages = collect_pages(&self.database_id, self.max_pages, |cursor| {
            self.api.query_database(&self.database_id, &query, cursor)
        })?;

        let mut posts: Vec<PostMetadata> = pages
            .iter()
            .filter(|page| !page.archived)
            .map(|page| PostMetadata::from_page(page, &self.names))
            .filter(|post| post.published)
            .collect();
        // Newest first, undated last; the sort is stable so ties keep store order.
        posts.sort_by_cached_key(|post| Reverse(date_key(post)));

        info!(
            "Listed {} published posts from database {}",
            posts.len(),
            self.database_id
        );
        Ok(posts)
    }

    /// Find a published post by slug.
    ///
    /// # Errors
    ///
    /// Returns [`NotionError`] if the listing fails.
    pub fn find_by_slug(&self, slug: &str) -> Result<Option<PostMetadata>, NotionError> {
        if slug.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list_published()?
            .into_iter()
            .find(|post| post.slug == slug))
    }
}
