//! Paginated list responses and database queries.

use serde::{Deserialize, Serialize};

/// One page of a paginated list endpoint.
///
/// `next_cursor` is an opaque token; a missing or empty cursor means the list
/// is exhausted.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedList<T> {
    /// Items on this page, in store order.
    pub results: Vec<T>,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Whether the store reports further pages.
    #[serde(default)]
    pub has_more: bool,
}

impl<T> PaginatedList<T> {
    /// Build a page (used by tests and mock backends).
    #[must_use]
    pub fn new(results: Vec<T>, next_cursor: Option<String>) -> Self {
        let has_more = next_cursor.is_some();
        Self {
            results,
            next_cursor,
            has_more,
        }
    }

    /// Continuation cursor, with empty tokens treated as absent.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

/// Body of a database query (without pagination fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseQuery {
    /// Property filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<PropertyFilter>,
    /// Sort criteria, applied in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
}

/// Checkbox property filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyFilter {
    /// Property name.
    pub property: String,
    /// Checkbox condition.
    pub checkbox: CheckboxCondition,
}

/// `equals` condition on a checkbox property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckboxCondition {
    pub equals: bool,
}

/// Sort on a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    /// Property name.
    pub property: String,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl DatabaseQuery {
    /// Entries whose checkbox `property` equals `value`.
    #[must_use]
    pub fn checkbox_equals(mut self, property: impl Into<String>, value: bool) -> Self {
        self.filter = Some(PropertyFilter {
            property: property.into(),
            checkbox: CheckboxCondition { equals: value },
        });
        self
    }

    /// Append a sort criterion.
    #[must_use]
    pub fn sorted_by(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(Sort {
            property: property.into(),
            direction,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_serialization() {
        let query = DatabaseQuery::default()
            .checkbox_equals("Published", true)
            .sorted_by("Date", SortDirection::Descending);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filter": {"property": "Published", "checkbox": {"equals": true}},
                "sorts": [{"property": "Date", "direction": "descending"}]
            })
        );
    }

    #[test]
    fn test_empty_query_serializes_to_empty_object() {
        let json = serde_json::to_value(DatabaseQuery::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_empty_cursor_is_not_a_continuation() {
        let list: PaginatedList<u32> =
            serde_json::from_str(r#"{"results": [1], "next_cursor": "", "has_more": false}"#)
                .unwrap();
        assert_eq!(list.continuation(), None);

        let list: PaginatedList<u32> =
            serde_json::from_str(r#"{"results": [], "next_cursor": null}"#).unwrap();
        assert_eq!(list.continuation(), None);
        assert!(!list.has_more);
    }

    #[test]
    fn test_continuation_cursor() {
        let list = PaginatedList::new(vec![1, 2], Some("abc".to_owned()));
        assert_eq!(list.continuation(), Some("abc"));
        assert!(list.has_more);
    }
}
