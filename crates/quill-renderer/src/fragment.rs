//! Raw HTML fragments re-parsed into the tree.
//!
//! A fragment is parsed with quick-xml in lenient mode: HTML void elements
//! need no closing tag and attributes may be unquoted or valueless. Anything
//! else that is not well formed (unbalanced tags, stray end tags, doctype or
//! processing instructions) leaves the fragment opaque.
//!
//! Parsed fragments get the same enrichment as markdown content: `$…$` in text
//! becomes math and `<pre><code class="language-x">` becomes a code block.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::tree::{CodeBlock, Element, Node, VOID_ELEMENTS, rewrite};

/// Elements whose text is never scanned for math.
const LITERAL_ELEMENTS: &[&str] = &["code", "pre", "script", "style", "kbd", "samp"];

/// Replace every parsable [`Node::RawHtml`] in the tree with parsed nodes.
pub(crate) fn expand_fragments(nodes: &mut Vec<Node>) {
    rewrite(nodes, &mut |list| {
        if !list.iter().any(|node| matches!(node, Node::RawHtml(_))) {
            return;
        }
        let mut expanded = Vec::with_capacity(list.len());
        for node in list.drain(..) {
            match node {
                Node::RawHtml(html) => match parse_fragment(&html) {
                    Some(parsed) => expanded.extend(parsed),
                    None => {
                        debug!("Keeping unparsable HTML fragment opaque");
                        expanded.push(Node::RawHtml(html));
                    }
                },
                other => expanded.push(other),
            }
        }
        *list = expanded;
    });
}

/// Parse one fragment, or `None` if it is not balanced.
pub(crate) fn parse_fragment(html: &str) -> Option<Vec<Node>> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Vec<Node> = Vec::new();

    loop {
        let event = reader.read_event().ok()?;
        let node = match event {
            Event::Start(e) => {
                let element = decode_element(&reader, &e)?;
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    Node::Element(element)
                } else {
                    stack.push(element);
                    continue;
                }
            }
            Event::Empty(e) => Node::Element(decode_element(&reader, &e)?),
            Event::End(e) => {
                let name = decode(&reader, e.name().as_ref())?.to_ascii_lowercase();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                let element = stack.pop()?;
                if element.tag != name {
                    return None;
                }
                Node::Element(element)
            }
            Event::Text(e) => Node::Text(decode(&reader, &e)?.into_owned()),
            Event::GeneralRef(e) => {
                let entity = decode(&reader, &e)?;
                match decode_entity(&entity) {
                    Some(c) => Node::Text(c.to_string()),
                    // Named HTML entities outside the XML set pass through.
                    None => Node::RawHtml(format!("&{entity};")),
                }
            }
            Event::CData(e) => Node::Text(String::from_utf8_lossy(&e).into_owned()),
            Event::Comment(e) => Node::RawHtml(format!("<!--{}-->", decode(&reader, &e)?)),
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => return None,
            Event::Eof => break,
        };

        let children = match stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut root,
        };
        if let (Node::Text(text), Some(Node::Text(last))) = (&node, children.last_mut()) {
            last.push_str(text);
            continue;
        }
        children.push(node);
    }

    if !stack.is_empty() {
        return None;
    }

    Some(enrich(root, false))
}

fn decode<'b, R>(reader: &Reader<R>, bytes: &'b [u8]) -> Option<Cow<'b, str>> {
    reader.decoder().decode(bytes).ok()
}

fn decode_element<R>(reader: &Reader<R>, e: &BytesStart) -> Option<Element> {
    let tag = decode(reader, e.name().as_ref())?.to_ascii_lowercase();
    let mut element = Element::new(tag);
    for attr in e.html_attributes() {
        let attr = attr.ok()?;
        let key = decode(reader, attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value().ok()?.into_owned();
        element.attrs.push((key, value));
    }
    Some(element)
}

/// Decode an XML entity or numeric character reference.
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        s if s.starts_with("#x") || s.starts_with("#X") => {
            u32::from_str_radix(&s[2..], 16).ok().and_then(char::from_u32)
        }
        s if s.starts_with('#') => s[1..].parse::<u32>().ok().and_then(char::from_u32),
        _ => None,
    }
}

/// Turn text math into math nodes and `<pre><code>` into code blocks.
fn enrich(nodes: Vec<Node>, literal: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) if !literal => out.extend(split_math(&text)),
            Node::Element(element) => {
                if let Some(code) = code_block(&element) {
                    out.push(Node::Code(code));
                    continue;
                }
                let literal = literal || LITERAL_ELEMENTS.contains(&element.tag.as_str());
                let Element {
                    tag,
                    attrs,
                    children,
                } = element;
                out.push(Node::Element(Element {
                    tag,
                    attrs,
                    children: enrich(children, literal),
                }));
            }
            other => out.push(other),
        }
    }
    out
}

/// Recognize `<pre><code class="language-x">…</code></pre>` with plain text content.
fn code_block(pre: &Element) -> Option<CodeBlock> {
    if pre.tag != "pre" {
        return None;
    }
    let mut significant = pre.children.iter().filter(|child| !child.is_blank_text());
    let Some(Node::Element(code)) = significant.next() else {
        return None;
    };
    if code.tag != "code" || significant.next().is_some() {
        return None;
    }

    let mut source = String::new();
    for child in &code.children {
        match child {
            Node::Text(text) => source.push_str(text),
            _ => return None,
        }
    }

    let language = [code.attr("class"), pre.attr("class")]
        .into_iter()
        .flatten()
        .flat_map(str::split_whitespace)
        .find_map(|class| class.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
        .map(str::to_owned);

    Some(CodeBlock {
        language,
        title: None,
        source,
    })
}

/// Split text at `$$…$$` and `$…$` delimiters.
///
/// Inline math must not start or end with whitespace, so prices like
/// `$5 and $10` stay text. `\$` is a literal dollar sign.
fn split_math(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        if rest[..pos].ends_with('\\') {
            plain.push_str(&rest[..pos - 1]);
            plain.push('$');
            rest = &rest[pos + 1..];
            continue;
        }

        let after = &rest[pos..];
        let (delimiter, display) = if after.starts_with("$$") {
            ("$$", true)
        } else {
            ("$", false)
        };
        let body = &after[delimiter.len()..];

        let closing = body.find(delimiter).filter(|&end| {
            let source = &body[..end];
            !source.trim().is_empty()
                && (display
                    || !(source.starts_with(char::is_whitespace)
                        || source.ends_with(char::is_whitespace)))
        });

        match closing {
            Some(end) => {
                plain.push_str(&rest[..pos]);
                if !plain.is_empty() {
                    nodes.push(Node::Text(std::mem::take(&mut plain)));
                }
                nodes.push(Node::Math {
                    source: body[..end].trim().to_owned(),
                    display,
                });
                rest = &body[end + delimiter.len()..];
            }
            None => {
                plain.push_str(&rest[..pos + delimiter.len()]);
                rest = &rest[pos + delimiter.len()..];
            }
        }
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        nodes.push(Node::Text(plain));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::serialize;
    use pretty_assertions::assert_eq;

    fn roundtrip(html: &str) -> Option<String> {
        parse_fragment(html).map(|nodes| serialize(&nodes))
    }

    #[test]
    fn test_balanced_fragment_verbatim() {
        assert_eq!(
            roundtrip(r#"<div class="note">hi</div>"#).as_deref(),
            Some(r#"<div class="note">hi</div>"#)
        );
    }

    #[test]
    fn test_void_elements_without_close() {
        assert_eq!(
            roundtrip(r#"<p>a<br>b<img src="x.png" alt=""></p>"#).as_deref(),
            Some(r#"<p>a<br>b<img src="x.png" alt=""></p>"#)
        );
    }

    #[test]
    fn test_valueless_attribute() {
        assert_eq!(
            roundtrip("<details open><summary>More</summary></details>").as_deref(),
            Some(r#"<details open=""><summary>More</summary></details>"#)
        );
    }

    #[test]
    fn test_unbalanced_fragments_rejected() {
        assert_eq!(parse_fragment("<div>"), None);
        assert_eq!(parse_fragment("</div>"), None);
        assert_eq!(parse_fragment("<div><span></div></span>"), None);
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            roundtrip("<p>a &amp; b&nbsp;&#169;</p>").as_deref(),
            Some("<p>a &amp; b&nbsp;©</p>")
        );
    }

    #[test]
    fn test_math_in_fragment_text() {
        let nodes = parse_fragment("<p>Area $\\pi r^2$ here</p>").unwrap();
        let Node::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(
            p.children,
            vec![
                Node::Text("Area ".to_owned()),
                Node::Math {
                    source: "\\pi r^2".to_owned(),
                    display: false
                },
                Node::Text(" here".to_owned()),
            ]
        );
    }

    #[test]
    fn test_no_math_inside_code() {
        let nodes = parse_fragment("<p><code>$x$</code></p>").unwrap();
        assert_eq!(serialize(&nodes), "<p><code>$x$</code></p>");
    }

    #[test]
    fn test_pre_code_becomes_code_block() {
        let nodes =
            parse_fragment("<pre><code class=\"language-rust\">let a = 1 &lt; 2;\n</code></pre>")
                .unwrap();
        assert_eq!(
            nodes,
            vec![Node::Code(CodeBlock {
                language: Some("rust".to_owned()),
                title: None,
                source: "let a = 1 < 2;\n".to_owned(),
            })]
        );
    }

    #[test]
    fn test_split_math() {
        assert_eq!(
            split_math("costs $5 and $10"),
            vec![Node::Text("costs $5 and $10".to_owned())]
        );
        assert_eq!(
            split_math("\\$x$"),
            vec![Node::Text("$x$".to_owned())]
        );
        assert_eq!(
            split_math("$$ a + b $$"),
            vec![Node::Math {
                source: "a + b".to_owned(),
                display: true
            }]
        );
    }

    #[test]
    fn test_expand_keeps_opaque_fragments() {
        let mut nodes = vec![
            Node::RawHtml("<section>".to_owned()),
            Node::RawHtml("<b>ok</b>".to_owned()),
        ];
        expand_fragments(&mut nodes);
        assert_eq!(serialize(&nodes), "<section><b>ok</b>");
        assert_eq!(nodes[0], Node::RawHtml("<section>".to_owned()));
    }
}
