//! Notion page and property types.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::block::{FileUrl, MediaBlock};
use super::rich_text::RichText;

/// Notion page (a database entry).
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// Whether the page is archived.
    #[serde(default)]
    pub archived: bool,
    /// Page cover image.
    #[serde(default)]
    pub cover: Option<MediaBlock>,
    /// Property values keyed by property name, decoded on access.
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

/// Typed property value.
///
/// Every property carries a `type` discriminator naming the populated field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Files {
        #[serde(default)]
        files: Vec<FileProperty>,
    },
    #[serde(other)]
    Other,
}

/// Date property payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DateValue {
    /// ISO-8601 start date or datetime.
    pub start: String,
    /// Optional ISO-8601 end.
    pub end: Option<String>,
}

/// Option of a select or multi-select property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    pub name: String,
}

/// Entry of a files property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileProperty {
    pub name: String,
    pub external: Option<FileUrl>,
    pub file: Option<FileUrl>,
}

impl FileProperty {
    /// Resolved URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.external
            .as_ref()
            .or(self.file.as_ref())
            .map(|f| f.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

impl Page {
    /// Decode a property by name.
    ///
    /// Returns `None` when the property is absent or its payload cannot be
    /// decoded. Malformed payloads are logged and never fail the page.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        let value = self.properties.get(name)?;
        match serde_json::from_value(value.clone()) {
            Ok(property) => Some(property),
            Err(err) => {
                warn!("Malformed property {:?} on page {}: {}", name, self.id, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page() -> Page {
        serde_json::from_str(
            r#"{
            "object": "page",
            "id": "page-1",
            "archived": false,
            "cover": {"type": "external", "external": {"url": "https://example.com/cover.png"}},
            "properties": {
                "Title": {"id": "title", "type": "title",
                          "title": [{"type": "text", "plain_text": "Hello"}]},
                "Date": {"id": "d", "type": "date", "date": {"start": "2024-03-01", "end": null}},
                "Tags": {"id": "t", "type": "multi_select",
                         "multi_select": [{"id": "1", "name": "rust", "color": "red"}]},
                "Image": {"id": "i", "type": "url", "url": null},
                "Published": {"id": "p", "type": "checkbox", "checkbox": true},
                "Broken": {"id": "b", "type": "rich_text", "rich_text": "oops"},
                "Status": {"id": "s", "type": "status", "status": {"name": "Done"}}
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_title() {
        let PropertyValue::Title { title } = page().property("Title").unwrap() else {
            panic!("expected title");
        };
        assert_eq!(title[0].plain_text, "Hello");
    }

    #[test]
    fn test_decode_date() {
        assert_eq!(
            page().property("Date"),
            Some(PropertyValue::Date {
                date: Some(DateValue {
                    start: "2024-03-01".to_owned(),
                    end: None,
                })
            })
        );
    }

    #[test]
    fn test_decode_multi_select() {
        let PropertyValue::MultiSelect { multi_select } = page().property("Tags").unwrap() else {
            panic!("expected multi_select");
        };
        assert_eq!(multi_select[0].name, "rust");
    }

    #[test]
    fn test_decode_null_url() {
        assert_eq!(
            page().property("Image"),
            Some(PropertyValue::Url { url: None })
        );
    }

    #[test]
    fn test_checkbox_and_unknown_types() {
        let page = page();
        assert_eq!(
            page.property("Published"),
            Some(PropertyValue::Checkbox { checkbox: true })
        );
        assert_eq!(page.property("Status"), Some(PropertyValue::Other));
    }

    #[test]
    fn test_malformed_and_missing_properties() {
        let page = page();
        assert_eq!(page.property("Broken"), None);
        assert_eq!(page.property("Nope"), None);
    }

    #[test]
    fn test_cover_url() {
        let page = page();
        assert_eq!(
            page.cover.as_ref().and_then(MediaBlock::url),
            Some("https://example.com/cover.png")
        );
    }
}
