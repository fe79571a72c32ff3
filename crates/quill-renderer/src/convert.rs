//! Markdown events to HTML tree.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Tag, TagEnd};

use crate::code::parse_fence_info;
use crate::tree::{CodeBlock, Element, Node};

/// Builds a [`Node`] tree from pulldown-cmark events.
///
/// Raw HTML becomes [`Node::RawHtml`] when `raw_html` is set and escaped text
/// otherwise. The lines of one HTML block are merged into a single node so
/// the fragment stage sees whole fragments.
pub(crate) struct TreeBuilder {
    raw_html: bool,
    root: Vec<Node>,
    stack: Vec<Element>,
    code: Option<CodeBlock>,
    html_block: Option<String>,
    /// Pending image element and its collected alt text.
    image: Option<(Element, String)>,
    table: TableState,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

impl TableState {
    fn cell_style(&self) -> Option<&'static str> {
        match self.alignments.get(self.cell) {
            Some(Alignment::Left) => Some("text-align: left"),
            Some(Alignment::Center) => Some("text-align: center"),
            Some(Alignment::Right) => Some("text-align: right"),
            Some(Alignment::None) | None => None,
        }
    }
}

impl TreeBuilder {
    pub(crate) fn new(raw_html: bool) -> Self {
        Self {
            raw_html,
            root: Vec::new(),
            stack: Vec::new(),
            code: None,
            html_block: None,
            image: None,
            table: TableState::default(),
        }
    }

    /// Consume events and return the top-level nodes.
    pub(crate) fn build<'a, I>(mut self, events: I) -> Vec<Node>
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        // Close anything left open by a truncated event stream.
        while let Some(element) = self.stack.pop() {
            self.push(Node::Element(element));
        }
        self.root
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) if self.image.is_some() => self.text(&code),
            Event::Code(code) => {
                let mut element = Element::new("code");
                element.children.push(Node::Text(code.to_string()));
                self.push(Node::Element(element));
            }
            Event::InlineMath(source) => self.push(Node::Math {
                source: source.to_string(),
                display: false,
            }),
            Event::DisplayMath(source) => self.push(Node::Math {
                source: source.to_string(),
                display: true,
            }),
            Event::Html(html) => {
                if let Some(block) = &mut self.html_block {
                    block.push_str(&html);
                } else {
                    self.raw_html(html.to_string());
                }
            }
            Event::InlineHtml(html) => self.raw_html(html.to_string()),
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => self.push(Node::Element(Element::new("br"))),
            Event::Rule => self.push(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input = input.with_attr("checked", "");
                }
                self.push(Node::Element(input));
            }
            Event::FootnoteReference(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        // Formatting inside image alt text is flattened to plain text.
        if self.image.is_some() {
            return;
        }
        match tag {
            Tag::Paragraph => self.open("p"),
            Tag::Heading { level, .. } => self.open(heading_tag(level)),
            Tag::BlockQuote(_) => self.open("blockquote"),
            Tag::CodeBlock(kind) => {
                let (language, title) = match kind {
                    CodeBlockKind::Fenced(info) => parse_fence_info(&info),
                    CodeBlockKind::Indented => (None, None),
                };
                self.code = Some(CodeBlock {
                    language,
                    title,
                    source: String::new(),
                });
            }
            Tag::HtmlBlock => self.html_block = Some(String::new()),
            Tag::List(start) => match start {
                Some(1) => self.open("ol"),
                Some(n) => self
                    .stack
                    .push(Element::new("ol").with_attr("start", n.to_string())),
                None => self.open("ul"),
            },
            Tag::Item => self.open("li"),
            Tag::FootnoteDefinition(_) | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.open("dl"),
            Tag::DefinitionListTitle => self.open("dt"),
            Tag::DefinitionListDefinition => self.open("dd"),
            Tag::Table(alignments) => {
                self.table = TableState {
                    alignments,
                    ..TableState::default()
                };
                self.open("table");
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell = 0;
                self.open("thead");
                self.open("tr");
            }
            Tag::TableRow => {
                self.table.cell = 0;
                self.open("tr");
            }
            Tag::TableCell => {
                let mut cell = Element::new(if self.table.in_head { "th" } else { "td" });
                if let Some(style) = self.table.cell_style() {
                    cell = cell.with_attr("style", style);
                }
                self.stack.push(cell);
            }
            Tag::Emphasis => self.open("em"),
            Tag::Strong => self.open("strong"),
            Tag::Strikethrough => self.open("s"),
            Tag::Superscript => self.open("sup"),
            Tag::Subscript => self.open("sub"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = Element::new("a").with_attr("href", dest_url.to_string());
                if !title.is_empty() {
                    link = link.with_attr("title", title.to_string());
                }
                self.stack.push(link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut image = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    image = image.with_attr("title", title.to_string());
                }
                self.image = Some((image, String::new()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if self.image.is_some() && tag != TagEnd::Image {
            return;
        }
        match tag {
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.push(Node::Code(code));
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(html) = self.html_block.take() {
                    self.raw_html(html);
                }
            }
            TagEnd::Image => {
                if let Some((image, alt)) = self.image.take() {
                    let mut image = image;
                    // Alt goes before title to keep attribute order stable.
                    image.attrs.insert(1, ("alt".to_owned(), alt));
                    self.push(Node::Element(image));
                }
            }
            TagEnd::FootnoteDefinition | TagEnd::MetadataBlock(_) => {}
            TagEnd::TableHead => {
                self.close(); // tr
                self.close(); // thead
                self.table.in_head = false;
                self.open("tbody");
            }
            TagEnd::Table => {
                if self.stack.last().is_some_and(|e| e.tag == "tbody") {
                    self.close();
                }
                self.close();
            }
            TagEnd::TableCell => {
                self.close();
                self.table.cell += 1;
            }
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::TableRow
            | TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::Link => self.close(),
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = &mut self.code {
            code.source.push_str(text);
        } else if let Some((_, alt)) = &mut self.image {
            alt.push_str(text);
        } else if let Some(Node::Text(last)) = self.current_children().last_mut() {
            last.push_str(text);
        } else {
            self.push(Node::Text(text.to_owned()));
        }
    }

    fn raw_html(&mut self, html: String) {
        if self.raw_html {
            self.push(Node::RawHtml(html));
        } else {
            self.text(&html);
        }
    }

    fn open(&mut self, tag: &str) {
        self.stack.push(Element::new(tag));
    }

    fn close(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.push(Node::Element(element));
        }
    }

    fn push(&mut self, node: Node) {
        if let (Some((_, alt)), Node::Text(text)) = (&mut self.image, &node) {
            alt.push_str(text);
            return;
        }
        self.current_children().push(node);
    }

    fn current_children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::serialize;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser};

    fn build(markdown: &str, raw_html: bool) -> Vec<Node> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_MATH;
        TreeBuilder::new(raw_html).build(Parser::new_ext(markdown, options))
    }

    fn html(markdown: &str) -> String {
        serialize(&build(markdown, false))
    }

    #[test]
    fn test_paragraph_and_inline() {
        assert_eq!(
            html("Some **bold** and *em* and `code` and ~~gone~~."),
            "<p>Some <strong>bold</strong> and <em>em</em> and <code>code</code> and <s>gone</s>.</p>"
        );
    }

    #[test]
    fn test_heading() {
        assert_eq!(html("## Section"), "<h2>Section</h2>");
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            html("1. a\n2. b"),
            "<ol><li>a</li><li>b</li></ol>"
        );
        assert_eq!(html("3. c"), r#"<ol start="3"><li>c</li></ol>"#);
        assert_eq!(html("- x"), "<ul><li>x</li></ul>");
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            html("- [x] done"),
            r#"<ul><li><input type="checkbox" disabled="" checked="">done</li></ul>"#
        );
    }

    #[test]
    fn test_table_with_alignment() {
        assert_eq!(
            html("| A | B |\n|:--|--:|\n| 1 | 2 |"),
            concat!(
                "<table><thead><tr>",
                r#"<th style="text-align: left">A</th><th style="text-align: right">B</th>"#,
                "</tr></thead><tbody><tr>",
                r#"<td style="text-align: left">1</td><td style="text-align: right">2</td>"#,
                "</tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            html(r#"[docs](https://x.dev "Docs") ![a *cat*](cat.png)"#),
            r#"<p><a href="https://x.dev" title="Docs">docs</a> <img src="cat.png" alt="a cat"></p>"#
        );
    }

    #[test]
    fn test_code_block_node() {
        let nodes = build("```rust:main.rs\nfn main() {}\n```", false);
        assert_eq!(
            nodes,
            vec![Node::Code(CodeBlock {
                language: Some("rust".to_owned()),
                title: Some("main.rs".to_owned()),
                source: "fn main() {}\n".to_owned(),
            })]
        );
    }

    #[test]
    fn test_math_nodes() {
        let nodes = build("Hello $x^2$ world", false);
        let Node::Element(p) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            p.children[1],
            Node::Math {
                source: "x^2".to_owned(),
                display: false
            }
        );
    }

    #[test]
    fn test_html_block_merged_in_raw_mode() {
        let nodes = build("<div>\n<p>one</p>\n</div>\n", true);
        assert_eq!(
            nodes,
            vec![Node::RawHtml("<div>\n<p>one</p>\n</div>\n".to_owned())]
        );
    }

    #[test]
    fn test_html_escaped_in_strict_mode() {
        assert_eq!(
            html("<div class=\"note\">hi</div>\n"),
            "&lt;div class=&quot;note&quot;&gt;hi&lt;/div&gt;\n"
        );
        assert_eq!(html("a <b>b</b>"), "<p>a &lt;b&gt;b&lt;/b&gt;</p>");
    }
}
