//! Notion block types.
//!
//! The API returns every block as an object with a `type` discriminator and a
//! payload stored under the key of the same name:
//!
//! ```json
//! {"id": "...", "type": "paragraph", "has_children": false,
//!  "paragraph": {"rich_text": [...], "color": "default"}}
//! ```
//!
//! [`RawBlock`] mirrors that wire shape. [`Block`] is the typed tree node
//! produced from it; payloads that cannot be decoded degrade to
//! [`BlockKind::Unsupported`] instead of failing the whole document.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::rich_text::RichText;

/// Block as returned by the children endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    /// Block ID.
    pub id: String,
    /// Type discriminator.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Whether the block has nested children.
    #[serde(default)]
    pub has_children: bool,
    /// Remaining fields, including the typed payload.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Typed block with its materialized children.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block ID.
    pub id: String,
    /// Whether the store reported nested children.
    pub has_children: bool,
    /// Typed payload.
    pub kind: BlockKind,
    /// Child blocks in store order.
    pub children: Vec<Block>,
}

/// Typed block payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextBlock),
    Heading { level: u8, content: TextBlock },
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    ToDo(ToDoBlock),
    Toggle(TextBlock),
    Quote(TextBlock),
    Callout(CalloutBlock),
    Code(CodeBlock),
    Equation(EquationBlock),
    Image(MediaBlock),
    Video(MediaBlock),
    File(MediaBlock),
    Pdf(MediaBlock),
    Bookmark(LinkBlock),
    Embed(LinkBlock),
    LinkPreview(LinkBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    Divider,
    ColumnList,
    Column,
    SyncedBlock,
    ChildPage(ChildPageBlock),
    ChildDatabase(ChildPageBlock),
    /// Block type this crate does not render (or whose payload was malformed).
    Unsupported { block_type: String },
}

/// Payload of text-carrying blocks (paragraph, headings, list items, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextBlock {
    pub rich_text: Vec<RichText>,
}

/// To-do payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToDoBlock {
    pub rich_text: Vec<RichText>,
    pub checked: bool,
}

/// Callout payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CalloutBlock {
    pub rich_text: Vec<RichText>,
    pub icon: Option<Icon>,
}

/// Page or callout icon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { external: FileUrl },
    File { file: FileUrl },
    #[serde(other)]
    Other,
}

/// Code payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodeBlock {
    pub rich_text: Vec<RichText>,
    pub caption: Vec<RichText>,
    pub language: String,
}

/// Block equation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EquationBlock {
    pub expression: String,
}

/// Hosted or external file reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileUrl {
    pub url: String,
}

/// Image, video, file and PDF payload.
///
/// Notion-hosted files carry a signed URL under `file` that expires; external
/// files carry a permanent URL under `external`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaBlock {
    pub caption: Vec<RichText>,
    pub external: Option<FileUrl>,
    pub file: Option<FileUrl>,
    pub name: Option<String>,
}

impl MediaBlock {
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

/// Bookmark, embed and link preview payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkBlock {
    pub url: String,
    pub caption: Vec<RichText>,
}

/// Table payload. Rows arrive as `table_row` children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableBlock {
    pub table_width: usize,
    pub has_column_header: bool,
    pub has_row_header: bool,
}

/// Table row payload: one rich text array per cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableRowBlock {
    pub cells: Vec<Vec<RichText>>,
}

/// Child page / child database payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChildPageBlock {
    pub title: String,
}

impl Block {
    /// Create a leaf block.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
            children: Vec::new(),
        }
    }

    /// Attach children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// Whether the fetcher should descend into this block.
    ///
    /// Child pages and databases are separate documents.
    #[must_use]
    pub fn should_descend(&self) -> bool {
        self.has_children
            && !matches!(
                self.kind,
                BlockKind::ChildPage(_) | BlockKind::ChildDatabase(_)
            )
    }
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let RawBlock {
            id,
            block_type,
            has_children,
            mut payload,
        } = raw;

        let value = payload
            .remove(&block_type)
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| Value::Object(Map::new()));

        let kind = decode_kind(&block_type, value).unwrap_or_else(|err| {
            warn!("Malformed {} block {}: {}", block_type, id, err);
            BlockKind::Unsupported {
                block_type: block_type.clone(),
            }
        });

        Self {
            id,
            has_children,
            kind,
            children: Vec::new(),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

fn decode_kind(block_type: &str, value: Value) -> Result<BlockKind, serde_json::Error> {
    let kind = match block_type {
        "paragraph" => BlockKind::Paragraph(decode(value)?),
        "heading_1" => BlockKind::Heading {
            level: 1,
            content: decode(value)?,
        },
        "heading_2" => BlockKind::Heading {
            level: 2,
            content: decode(value)?,
        },
        "heading_3" => BlockKind::Heading {
            level: 3,
            content: decode(value)?,
        },
        "bulleted_list_item" => BlockKind::BulletedListItem(decode(value)?),
        "numbered_list_item" => BlockKind::NumberedListItem(decode(value)?),
        "to_do" => BlockKind::ToDo(decode(value)?),
        "toggle" => BlockKind::Toggle(decode(value)?),
        "quote" => BlockKind::Quote(decode(value)?),
        "callout" => BlockKind::Callout(decode(value)?),
        "code" => BlockKind::Code(decode(value)?),
        "equation" => BlockKind::Equation(decode(value)?),
        "image" => BlockKind::Image(decode(value)?),
        "video" => BlockKind::Video(decode(value)?),
        "file" => BlockKind::File(decode(value)?),
        "pdf" => BlockKind::Pdf(decode(value)?),
        "bookmark" => BlockKind::Bookmark(decode(value)?),
        "embed" => BlockKind::Embed(decode(value)?),
        "link_preview" => BlockKind::LinkPreview(decode(value)?),
        "table" => BlockKind::Table(decode(value)?),
        "table_row" => BlockKind::TableRow(decode(value)?),
        "divider" => BlockKind::Divider,
        "column_list" => BlockKind::ColumnList,
        "column" => BlockKind::Column,
        "synced_block" => BlockKind::SyncedBlock,
        "child_page" => BlockKind::ChildPage(decode(value)?),
        "child_database" => BlockKind::ChildDatabase(decode(value)?),
        other => BlockKind::Unsupported {
            block_type: other.to_owned(),
        },
    };
    Ok(kind)
}
