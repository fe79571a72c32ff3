//! Block tree to markdown conversion.
//!
//! [`MarkdownConverter`] maps every block type to a markdown fragment and
//! joins top-level fragments with exactly one blank line. Consecutive list
//! items form a single fragment so they render as one list. Nested blocks are
//! indented under list items and prefixed under quotes.
//!
//! Conversion never fails: unsupported blocks produce no output and malformed
//! tables degrade to paragraphs.

mod inline;
mod table;

use std::fmt::Write;

use tracing::debug;

use crate::types::{Block, BlockKind, CodeBlock, Icon, LinkBlock, MediaBlock, RichText, plain_text};

pub use inline::{escape_link_target, render_rich_text};
use inline::{escape_label, longest_run};

/// Converts Notion block trees to markdown.
///
/// Toggles become `<details>` HTML by default. That markup only survives a
/// pipeline that passes raw HTML through; for one that escapes it, disable
/// raw HTML with [`MarkdownConverter::with_raw_html`] and toggles render as a
/// bold summary followed by their content.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownConverter {
    raw_html: bool,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// List family used to group consecutive items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bulleted,
    Numbered,
}

impl MarkdownConverter {
    /// Create a new converter.
    #[must_use]
    pub fn new() -> Self {
        Self { raw_html: true }
    }

    /// Whether the output may contain raw HTML.
    #[must_use]
    pub fn with_raw_html(mut self, raw_html: bool) -> Self {
        self.raw_html = raw_html;
        self
    }

    /// Convert blocks to a markdown document.
    ///
    /// Fragments are separated by one blank line and the document ends with a
    /// newline. An empty tree yields an empty string.
    #[must_use]
    pub fn to_markdown(&self, blocks: &[Block]) -> String {
        let mut markdown = self.render_blocks(blocks);
        if !markdown.is_empty() {
            markdown.push('\n');
        }
        markdown
    }

    /// Render a sibling sequence: non-empty fragments joined by a blank line.
    fn render_blocks(&self, blocks: &[Block]) -> String {
        self.fragments(blocks).join("\n\n")
    }

    fn fragments(&self, blocks: &[Block]) -> Vec<String> {
        let mut fragments = Vec::new();
        let mut index = 0;

        while index < blocks.len() {
            let block = &blocks[index];

            if let Some(kind) = list_kind(block) {
                let run_len = blocks[index..]
                    .iter()
                    .take_while(|b| list_kind(b) == Some(kind))
                    .count();
                fragments.push(self.render_list(&blocks[index..index + run_len], kind));
                index += run_len;
                continue;
            }

            match &block.kind {
                // Layout containers contribute their children as siblings.
                BlockKind::ColumnList | BlockKind::Column | BlockKind::SyncedBlock => {
                    fragments.extend(self.fragments(&block.children));
                }
                BlockKind::Paragraph(_) | BlockKind::Heading { .. } => {
                    fragments.push(self.render_block(block));
                    fragments.extend(self.fragments(&block.children));
                }
                _ => fragments.push(self.render_block(block)),
            }
            index += 1;
        }

        // Stray newlines at either end would widen the blank line between fragments.
        fragments
            .into_iter()
            .map(|fragment| fragment.trim_matches('\n').to_owned())
            .filter(|fragment| !fragment.trim().is_empty())
            .collect()
    }

    fn render_block(&self, block: &Block) -> String {
        match &block.kind {
            BlockKind::Paragraph(text) => render_rich_text(&text.rich_text),
            BlockKind::Heading { level, content } => {
                let text = render_rich_text(&content.rich_text);
                if text.trim().is_empty() {
                    String::new()
                } else {
                    format!("{} {}", "#".repeat(usize::from(*level)), text.trim())
                }
            }
            BlockKind::Quote(text) => {
                self.render_quote(&render_rich_text(&text.rich_text), &block.children)
            }
            BlockKind::Callout(callout) => {
                let mut text = render_rich_text(&callout.rich_text);
                if let Some(Icon::Emoji { emoji }) = &callout.icon {
                    text = format!("{emoji} {text}");
                }
                self.render_quote(&text, &block.children)
            }
            BlockKind::Toggle(text) => self.render_toggle(&text.rich_text, &block.children),
            BlockKind::Code(code) => render_code(code),
            BlockKind::Equation(equation) => {
                let expression = equation.expression.trim();
                if expression.is_empty() {
                    String::new()
                } else {
                    format!("$$\n{expression}\n$$")
                }
            }
            BlockKind::Image(media) => render_image(media),
            BlockKind::Video(media) | BlockKind::File(media) | BlockKind::Pdf(media) => {
                render_media_link(media)
            }
            BlockKind::Bookmark(link) | BlockKind::Embed(link) | BlockKind::LinkPreview(link) => {
                render_link_block(link)
            }
            BlockKind::Table(_) => table::render_table(block),
            BlockKind::Divider => "---".to_owned(),
            BlockKind::ChildPage(page) | BlockKind::ChildDatabase(page) => {
                if page.title.trim().is_empty() {
                    String::new()
                } else {
                    format!("**{}**", page.title.trim())
                }
            }
            BlockKind::Unsupported { block_type } => {
                debug!("Skipping unsupported block {} ({})", block.id, block_type);
                String::new()
            }
            // Handled by the list and container paths, or only valid inside a table.
            BlockKind::BulletedListItem(_)
            | BlockKind::NumberedListItem(_)
            | BlockKind::ToDo(_)
            | BlockKind::TableRow(_)
            | BlockKind::ColumnList
            | BlockKind::Column
            | BlockKind::SyncedBlock => {
                debug!("Skipping misplaced block {}", block.id);
                String::new()
            }
        }
    }

    fn render_list(&self, items: &[Block], kind: ListKind) -> String {
        let mut lines = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let (marker, runs) = match &item.kind {
                BlockKind::NumberedListItem(text) => {
                    (format!("{}. ", position + 1), text.rich_text.as_slice())
                }
                BlockKind::ToDo(todo) => {
                    let check = if todo.checked { 'x' } else { ' ' };
                    (format!("- [{check}] "), todo.rich_text.as_slice())
                }
                BlockKind::BulletedListItem(text) => ("- ".to_owned(), text.rich_text.as_slice()),
                _ => continue,
            };
            debug_assert_eq!(list_kind(item), Some(kind));

            // Continuation lines align with the item text.
            let width = if kind == ListKind::Bulleted { 2 } else { marker.len() };
            let mut entry = format!("{marker}{}", indent(&render_rich_text(runs), width).trim_start());

            let children = self.fragments(&item.children);
            if !children.is_empty() {
                let separator = if children.len() == 1 && all_list_items(&item.children) {
                    "\n"
                } else {
                    "\n\n"
                };
                entry.push_str(separator);
                entry.push_str(&indent(&children.join("\n\n"), width));
            }
            lines.push(entry);
        }
        lines.join("\n")
    }

    fn render_quote(&self, text: &str, children: &[Block]) -> String {
        let mut body = text.trim().to_owned();
        let nested = self.render_blocks(children);
        if !nested.is_empty() {
            if !body.is_empty() {
                body.push_str("\n\n");
            }
            body.push_str(&nested);
        }
        if body.is_empty() {
            return String::new();
        }
        body.lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_owned()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_toggle(&self, summary: &[RichText], children: &[Block]) -> String {
        if !self.raw_html {
            let summary = plain_text(summary);
            let mut out = if summary.trim().is_empty() {
                String::new()
            } else {
                format!("**{}**", summary.trim())
            };
            let nested = self.render_blocks(children);
            if !nested.is_empty() {
                if !out.is_empty() {
                    out.push_str("\n\n");
                }
                out.push_str(&nested);
            }
            return out;
        }

        let mut out = String::from("<details>\n");
        let _ = writeln!(
            out,
            "<summary>{}</summary>",
            escape_html(plain_text(summary).trim())
        );
        let nested = self.render_blocks(children);
        if !nested.is_empty() {
            out.push('\n');
            out.push_str(&nested);
            out.push('\n');
        }
        out.push_str("\n</details>");
        out
    }
}

fn list_kind(block: &Block) -> Option<ListKind> {
    match block.kind {
        BlockKind::BulletedListItem(_) | BlockKind::ToDo(_) => Some(ListKind::Bulleted),
        BlockKind::NumberedListItem(_) => Some(ListKind::Numbered),
        _ => None,
    }
}

fn all_list_items(children: &[Block]) -> bool {
    children.iter().all(|child| list_kind(child).is_some())
}

/// Indent every non-empty line by `width` spaces.
fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Map a Notion language name to a fence info language.
fn fence_language(language: &str) -> String {
    match language.trim().to_lowercase().as_str() {
        "" | "plain text" => "text".to_owned(),
        other => other.replace(' ', "-"),
    }
}

fn render_code(code: &CodeBlock) -> String {
    let source = plain_text(&code.rich_text);
    let fence = "`".repeat(longest_run(&source, '`').max(2) + 1);
    let language = fence_language(&code.language);

    let caption = plain_text(&code.caption).replace('\n', " ");
    let caption = caption.trim();
    let info = if caption.is_empty() {
        language
    } else if caption.contains(char::is_whitespace) {
        format!(r#"{language} title="{}""#, caption.replace('"', "'"))
    } else {
        format!("{language}:{caption}")
    };

    let mut out = format!("{fence}{info}\n{source}");
    if !source.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
    out
}

fn render_image(media: &MediaBlock) -> String {
    let alt = escape_label(plain_text(&media.caption).trim());
    let src = media.url().map(escape_link_target).unwrap_or_default();
    if media.url().is_none() {
        debug!("Image without a resolvable URL, rendering empty src");
    }
    format!("![{alt}]({src})")
}

fn render_media_link(media: &MediaBlock) -> String {
    let Some(url) = media.url() else {
        return String::new();
    };
    let caption = plain_text(&media.caption);
    let label = [caption.trim(), media.name.as_deref().unwrap_or("").trim(), url]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(url);
    format!("[{}]({})", escape_label(label), escape_link_target(url))
}

fn render_link_block(link: &LinkBlock) -> String {
    let url = link.url.trim();
    if url.is_empty() {
        return String::new();
    }
    let caption = plain_text(&link.caption);
    let label = if caption.trim().is_empty() {
        url
    } else {
        caption.trim()
    };
    format!("[{}]({})", escape_label(label), escape_link_target(url))
}

/// Minimal escaping for text placed inside raw HTML.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CalloutBlock, ChildPageBlock, EquationBlock, FileUrl, TableBlock, TableRowBlock,
        TextBlock, ToDoBlock,
    };
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> TextBlock {
        TextBlock {
            rich_text: vec![RichText::plain(s)],
        }
    }

    fn paragraph(s: &str) -> Block {
        Block::new("p", BlockKind::Paragraph(text(s)))
    }

    fn bullet(s: &str) -> Block {
        Block::new("b", BlockKind::BulletedListItem(text(s)))
    }

    fn numbered(s: &str) -> Block {
        Block::new("n", BlockKind::NumberedListItem(text(s)))
    }

    fn convert(blocks: &[Block]) -> String {
        MarkdownConverter::new().to_markdown(blocks)
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(convert(&[]), "");
    }

    #[test]
    fn test_blocks_separated_by_one_blank_line() {
        let blocks = vec![
            Block::new(
                "h",
                BlockKind::Heading {
                    level: 1,
                    content: text("Title"),
                },
            ),
            paragraph("First paragraph."),
            Block::new("d", BlockKind::Divider),
            paragraph("Second paragraph."),
        ];
        assert_eq!(
            convert(&blocks),
            "# Title\n\nFirst paragraph.\n\n---\n\nSecond paragraph.\n"
        );
    }

    #[test]
    fn test_empty_and_unsupported_blocks_skipped() {
        let blocks = vec![
            paragraph("a"),
            paragraph(""),
            Block::new(
                "u",
                BlockKind::Unsupported {
                    block_type: "breadcrumb".to_owned(),
                },
            ),
            paragraph("b"),
        ];
        let md = convert(&blocks);
        assert_eq!(md, "a\n\nb\n");
        assert!(!md.contains("\n\n\n"));
    }

    #[test]
    fn test_heading_levels() {
        let blocks: Vec<Block> = (1..=3)
            .map(|level| {
                Block::new(
                    "h",
                    BlockKind::Heading {
                        level,
                        content: text("H"),
                    },
                )
            })
            .collect();
        assert_eq!(convert(&blocks), "# H\n\n## H\n\n### H\n");
    }

    #[test]
    fn test_consecutive_list_items_form_one_list() {
        let blocks = vec![bullet("one"), bullet("two"), paragraph("after")];
        assert_eq!(convert(&blocks), "- one\n- two\n\nafter\n");
    }

    #[test]
    fn test_numbered_list_counts_per_run() {
        let blocks = vec![
            numbered("a"),
            numbered("b"),
            paragraph("break"),
            numbered("c"),
        ];
        assert_eq!(convert(&blocks), "1. a\n2. b\n\nbreak\n\n1. c\n");
    }

    #[test]
    fn test_nested_list_indentation() {
        let blocks = vec![
            bullet("parent").with_children(vec![
                bullet("child").with_children(vec![numbered("grandchild")]),
            ]),
            bullet("sibling"),
        ];
        assert_eq!(
            convert(&blocks),
            "- parent\n  - child\n    1. grandchild\n- sibling\n"
        );
    }

    #[test]
    fn test_list_item_with_paragraph_child() {
        let blocks = vec![numbered("step").with_children(vec![paragraph("details")])];
        assert_eq!(convert(&blocks), "1. step\n\n   details\n");
    }

    #[test]
    fn test_todo_items() {
        let blocks = vec![
            Block::new(
                "t1",
                BlockKind::ToDo(ToDoBlock {
                    rich_text: vec![RichText::plain("done")],
                    checked: true,
                }),
            ),
            Block::new(
                "t2",
                BlockKind::ToDo(ToDoBlock {
                    rich_text: vec![RichText::plain("open")],
                    checked: false,
                }),
            ),
        ];
        assert_eq!(convert(&blocks), "- [x] done\n- [ ] open\n");
    }

    #[test]
    fn test_quote_with_children() {
        let blocks = vec![
            Block::new("q", BlockKind::Quote(text("Quoted"))).with_children(vec![paragraph("nested")]),
        ];
        assert_eq!(convert(&blocks), "> Quoted\n>\n> nested\n");
    }

    #[test]
    fn test_callout_with_emoji() {
        let blocks = vec![Block::new(
            "c",
            BlockKind::Callout(CalloutBlock {
                rich_text: vec![RichText::plain("Heads up")],
                icon: Some(Icon::Emoji {
                    emoji: "💡".to_owned(),
                }),
            }),
        )];
        assert_eq!(convert(&blocks), "> 💡 Heads up\n");
    }

    #[test]
    fn test_toggle_wraps_children_in_details() {
        let blocks = vec![
            Block::new("t", BlockKind::Toggle(text("More <info>")))
                .with_children(vec![paragraph("hidden")]),
        ];
        assert_eq!(
            convert(&blocks),
            "<details>\n<summary>More &lt;info&gt;</summary>\n\nhidden\n\n</details>\n"
        );
    }

    #[test]
    fn test_toggle_without_raw_html() {
        let blocks = vec![
            Block::new("t", BlockKind::Toggle(text("More <info>")))
                .with_children(vec![paragraph("hidden")]),
            paragraph("after"),
        ];
        let md = MarkdownConverter::new()
            .with_raw_html(false)
            .to_markdown(&blocks);
        assert_eq!(md, "**More <info>**\n\nhidden\n\nafter\n");
        assert!(!md.contains("<details>"));
    }

    #[test]
    fn test_trailing_line_break_keeps_single_blank_line() {
        let blocks = vec![paragraph("first\n"), paragraph("\nsecond")];
        let md = convert(&blocks);
        assert_eq!(md, "first\n\nsecond\n");
        assert!(!md.contains("\n\n\n"));
    }

    #[test]
    fn test_code_block() {
        let code = CodeBlock {
            rich_text: vec![RichText::plain("fn main() {}")],
            caption: Vec::new(),
            language: "rust".to_owned(),
        };
        assert_eq!(
            convert(&[Block::new("c", BlockKind::Code(code))]),
            "```rust\nfn main() {}\n```\n"
        );
    }

    #[test]
    fn test_code_block_caption_becomes_title() {
        let code = CodeBlock {
            rich_text: vec![RichText::plain("print(1)\n")],
            caption: vec![RichText::plain("hello.py")],
            language: "python".to_owned(),
        };
        assert_eq!(
            convert(&[Block::new("c", BlockKind::Code(code))]),
            "```python:hello.py\nprint(1)\n```\n"
        );

        let code = CodeBlock {
            rich_text: vec![RichText::plain("x")],
            caption: vec![RichText::plain("my \"file\"")],
            language: "plain text".to_owned(),
        };
        assert_eq!(
            convert(&[Block::new("c", BlockKind::Code(code))]),
            "```text title=\"my 'file'\"\nx\n```\n"
        );
    }

    #[test]
    fn test_code_block_with_fence_inside() {
        let code = CodeBlock {
            rich_text: vec![RichText::plain("```\ninner\n```")],
            caption: Vec::new(),
            language: "markdown".to_owned(),
        };
        assert_eq!(
            convert(&[Block::new("c", BlockKind::Code(code))]),
            "````markdown\n```\ninner\n```\n````\n"
        );
    }

    #[test]
    fn test_equation_block() {
        let blocks = vec![Block::new(
            "e",
            BlockKind::Equation(EquationBlock {
                expression: "\\int_0^1 x\\,dx".to_owned(),
            }),
        )];
        assert_eq!(convert(&blocks), "$$\n\\int_0^1 x\\,dx\n$$\n");
    }

    #[test]
    fn test_image_block() {
        let media = MediaBlock {
            caption: vec![RichText::plain("A cat")],
            external: Some(FileUrl {
                url: "https://example.com/cat image.png".to_owned(),
            }),
            ..MediaBlock::default()
        };
        assert_eq!(
            convert(&[Block::new("i", BlockKind::Image(media))]),
            "![A cat](https://example.com/cat%20image.png)\n"
        );
    }

    #[test]
    fn test_image_without_url_has_empty_src() {
        let media = MediaBlock {
            caption: vec![RichText::plain("gone")],
            ..MediaBlock::default()
        };
        assert_eq!(
            convert(&[Block::new("i", BlockKind::Image(media))]),
            "![gone]()\n"
        );
    }

    #[test]
    fn test_bookmark_block() {
        let link = LinkBlock {
            url: "https://www.rust-lang.org".to_owned(),
            caption: Vec::new(),
        };
        assert_eq!(
            convert(&[Block::new("b", BlockKind::Bookmark(link))]),
            "[https://www.rust-lang.org](https://www.rust-lang.org)\n"
        );
    }

    #[test]
    fn test_file_block_uses_name() {
        let media = MediaBlock {
            file: Some(FileUrl {
                url: "https://files.example.com/report.pdf".to_owned(),
            }),
            name: Some("report.pdf".to_owned()),
            ..MediaBlock::default()
        };
        assert_eq!(
            convert(&[Block::new("f", BlockKind::File(media))]),
            "[report.pdf](https://files.example.com/report.pdf)\n"
        );
    }

    #[test]
    fn test_columns_flatten_into_siblings() {
        let blocks = vec![
            Block::new("cl", BlockKind::ColumnList).with_children(vec![
                Block::new("c1", BlockKind::Column).with_children(vec![paragraph("left")]),
                Block::new("c2", BlockKind::Column).with_children(vec![paragraph("right")]),
            ]),
        ];
        assert_eq!(convert(&blocks), "left\n\nright\n");
    }

    #[test]
    fn test_child_page_title() {
        let blocks = vec![Block::new(
            "cp",
            BlockKind::ChildPage(ChildPageBlock {
                title: "Appendix".to_owned(),
            }),
        )];
        assert_eq!(convert(&blocks), "**Appendix**\n");
    }

    #[test]
    fn test_malformed_table_falls_back() {
        let row = |cells: &[&str]| {
            Block::new(
                "r",
                BlockKind::TableRow(TableRowBlock {
                    cells: cells.iter().map(|c| vec![RichText::plain(*c)]).collect(),
                }),
            )
        };
        let blocks = vec![
            paragraph("before"),
            Block::new("t", BlockKind::Table(TableBlock::default()))
                .with_children(vec![row(&["a", "b"]), row(&["c"])]),
        ];
        assert_eq!(convert(&blocks), "before\n\na b\nc\n");
    }

    #[test]
    fn test_deep_tree_terminates() {
        let mut block = bullet("leaf");
        for depth in 0..50 {
            block = bullet(&format!("level {depth}")).with_children(vec![block]);
        }
        let md = convert(&[block, paragraph("end")]);
        assert!(md.ends_with("\n\nend\n"));
        assert_eq!(md.matches("- ").count(), 51);
    }

    #[test]
    fn test_deterministic() {
        let blocks = vec![paragraph("x"), bullet("y")];
        assert_eq!(convert(&blocks), convert(&blocks));
    }
}
