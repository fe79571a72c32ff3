//! HTML tree shared by all pipeline stages.

/// Elements serialized without a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node of the intermediate HTML tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Raw HTML from the source document, emitted unchanged.
    RawHtml(String),
    /// HTML generated by a pipeline stage, emitted unchanged.
    Markup(String),
    /// TeX source awaiting the math stage.
    Math { source: String, display: bool },
    /// Code block awaiting the code stage.
    Code(CodeBlock),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A fenced or `<pre><code>` code block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CodeBlock {
    pub language: Option<String>,
    pub title: Option<String>,
    pub source: String,
}

impl Element {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub(crate) fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

impl Node {
    /// Whether this node is text consisting only of whitespace.
    pub(crate) fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

/// Apply `f` to every node list in the tree, children before parents.
pub(crate) fn rewrite(nodes: &mut Vec<Node>, f: &mut impl FnMut(&mut Vec<Node>)) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            rewrite(&mut element.children, f);
        }
    }
    f(nodes);
}

/// Serialize nodes to an HTML string.
pub(crate) fn serialize(nodes: &[Node]) -> String {
    let mut out = String::with_capacity(4096);
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
            out.push('>');
            if element.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        Node::Text(text) => out.push_str(&escape_html(text)),
        Node::RawHtml(html) | Node::Markup(html) => out.push_str(html),
        // Stages replace these before serialization; fall back to source text.
        Node::Math { source, display } => {
            let delimiter = if *display { "$$" } else { "$" };
            out.push_str(&escape_html(&format!("{delimiter}{source}{delimiter}")));
        }
        Node::Code(code) => {
            out.push_str("<pre><code>");
            out.push_str(&escape_html(&code.source));
            out.push_str("</code></pre>");
        }
    }
}

/// Escape HTML special characters in text and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
